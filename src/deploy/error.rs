use crate::{
    config::ConfigError,
    utils::{fs::FsError, git::VcsError},
};
use thiserror::Error;

/// Why a deployment run stopped.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Remote branch `{branch}` does not exist, create it before deploying")]
    RemoteBranchMissing { branch: String },

    #[error(transparent)]
    Vcs(#[from] VcsError),

    #[error(transparent)]
    Filesystem(#[from] FsError),
}
