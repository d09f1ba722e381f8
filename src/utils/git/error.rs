//! Version-control error types.

use crate::utils::exec::CommandError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a version-control operation.
#[derive(Debug, Error)]
pub enum VcsError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("git repository error in `{path}`: {message}")]
    Repository { path: PathBuf, message: String },
}

impl VcsError {
    pub(super) fn repository(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::Repository {
            path: path.into(),
            message: err.to_string(),
        }
    }
}
