//! `.assess-kit/` project initialization.
//!
//! Writes the default `config.toml` and the stock check definitions so that
//! a fresh project can be assessed straight away:
//!
//! ```no_run
//! use ak_core::init::{generate_assess_kit_structure, InitOptions};
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let written = generate_assess_kit_structure(InitOptions {
//!     target_dir: PathBuf::from("."),
//!     force: false,
//!     minimal: false,
//! })
//! .await?;
//! println!("wrote {} files", written.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod generator;
pub mod templates;

pub use error::{InitError, InitResult};
pub use generator::{generate_assess_kit_structure, InitOptions};
pub use templates::{get_template, list_templates};
