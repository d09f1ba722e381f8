//! Git operations for branch deployment.
//!
//! Every operation is scoped to an explicit directory through [`GitRepo`];
//! nothing here changes the process working directory.

mod error;
mod remote;
mod repo;

pub use error::VcsError;
pub use remote::Remote;
pub use repo::{GitRepo, remote_branch_exists};
