//! # ak-protocol
//!
//! Wire and data models for assess-kit.
//!
//! This crate defines all shared data structures used for:
//! - Check definitions loaded from `.assess-kit/checks/`
//! - Assessment requests accepted by the HTTP and CLI front ends
//! - Evaluation results and the assembled assessment
//! - The newline-delimited JSON progress stream
//!
//! ## Modules
//!
//! - [`check_models`]: Check definitions and per-check evaluations
//! - [`request_models`]: The flat assessment request object
//! - [`assessment_models`]: The assembled assessment returned to clients
//! - [`stream_models`]: Progress, completion and error records of the stream
//!
//! ## Design Principles
//!
//! - Minimal dependencies: Only serde and ts-rs
//! - TypeScript generation: All wire types derive `TS` for client compatibility
//! - Independent compilation: No dependencies on other assess-kit crates

pub mod assessment_models;
pub mod check_models;
pub mod request_models;
pub mod stream_models;

// Re-export all public types for convenience
pub use assessment_models::*;
pub use check_models::*;
pub use request_models::*;
pub use stream_models::*;
