//! `[commit]` section configuration.

use super::{ConfigError, Identity, defaults};
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[commit]` section in deploy.toml - identities and message of the deploy commit.
///
/// # Example
/// ```toml
/// [commit]
/// author = "Jane Doe <jane@example.com>"
/// committer = "GitHub <noreply@github.com>"
/// message = "Deploy to GitHub pages"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct CommitConfig {
    /// Author written into the commit, as `Name <email>`.
    #[serde(default = "defaults::commit::author")]
    #[educe(Default = defaults::commit::author())]
    pub author: String,

    /// Committer configured as `user.name`/`user.email`, as `Name <email>`.
    #[serde(default = "defaults::commit::committer")]
    #[educe(Default = defaults::commit::committer())]
    pub committer: String,

    /// Commit message.
    #[serde(default = "defaults::commit::message")]
    #[educe(Default = defaults::commit::message())]
    pub message: String,
}

impl CommitConfig {
    pub fn author(&self) -> Result<Identity, ConfigError> {
        Ok(self.author.parse()?)
    }

    pub fn committer(&self) -> Result<Identity, ConfigError> {
        Ok(self.committer.parse()?)
    }
}
