//! # ak-core
//!
//! Check orchestration for assess-kit.
//!
//! This crate provides:
//! - Configuration loading from the `.assess-kit/` directory
//! - The check registry and the up-front work-unit accounting
//! - Collaborator traits (evaluators, media preparation, result storage)
//! - The staged pipeline engine with keepalive progress streaming
//!
//! ## Modules
//!
//! - [`config`]: Settings, check definitions and request validation
//! - [`registry`]: Check enumeration grouped by category and group key
//! - [`evaluators`]: Collaborator traits and their adapters
//! - [`credentials`]: Scoped credential files
//! - [`state`]: Shared progress counters and the completion channel
//! - [`emitter`]: NDJSON event emission
//! - [`engine`]: Stages, the keepalive executor and the pipeline sequencer
//! - [`init`]: `.assess-kit/` scaffolding

pub mod config;
pub mod credentials;
pub mod emitter;
pub mod engine;
pub mod evaluators;
pub mod init;
pub mod registry;
pub mod state;
