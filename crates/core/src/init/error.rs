//! Failures while scaffolding a `.assess-kit/` project.

use std::path::PathBuf;
use thiserror::Error;

pub type InitResult<T> = Result<T, InitError>;

#[derive(Debug, Error)]
pub enum InitError {
    /// Refusing to overwrite an existing project without `--force`.
    #[error("{} already exists; pass --force to overwrite it", .0.display())]
    DirectoryExists(PathBuf),

    /// An embedded asset listed for generation is missing from the binary.
    #[error("embedded template {0} is missing")]
    TemplateNotFound(String),

    #[error("cannot create {}: {source}", .path.display())]
    DirectoryCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", .path.display())]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },
}
