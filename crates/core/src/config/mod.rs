//! Configuration loading and management.
//!
//! This module provides functionality to load the service settings and check
//! definitions from the `.assess-kit/` directory structure, and to validate
//! incoming assessment requests into an immutable run configuration.

pub mod assessment;
pub mod error;
pub mod loader;
pub mod models;
pub mod settings;
