//! Shared helpers for the core integration tests.
//!
//! - Fixtures: check definitions, registries, requests and project dirs
//! - Assertions over the emitted NDJSON stream
//! - Recording collaborators

pub mod assertions;
pub mod fixtures;
pub mod mock_collaborators;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use mock_collaborators::*;
