//! `[deploy]` section configuration.
//!
//! Where deployments go and how the target branch history is treated.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[deploy]` section in deploy.toml - deployment target settings.
///
/// # Example
/// ```toml
/// [deploy]
/// repository = "owner/site"
/// server_url = "https://github.com"
/// keep_history = false
/// stat_count = 10
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct DeployConfig {
    /// Repository slug (`owner/name`). Usually supplied by `GITHUB_REPOSITORY`.
    #[serde(default = "defaults::deploy::repository")]
    #[educe(Default = defaults::deploy::repository())]
    pub repository: Option<String>,

    /// Server URL for GitHub Enterprise. Usually supplied by `GITHUB_SERVER_URL`.
    #[serde(default = "defaults::deploy::server_url")]
    #[educe(Default = defaults::deploy::server_url())]
    pub server_url: Option<String>,

    /// Commit on top of the existing branch history instead of replacing it
    /// with a single root commit.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = defaults::r#false())]
    pub keep_history: bool,

    /// Maximum number of files listed in the diff stat after committing.
    #[serde(default = "defaults::deploy::stat_count")]
    #[educe(Default = defaults::deploy::stat_count())]
    pub stat_count: usize,
}
