//! Deployment configuration for `deploy.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[deploy]`  | Target repository, server, history, diff stat    |
//! | `[commit]`  | Author, committer and message of deploy commits  |
//!
//! The file is optional. Values are layered: CLI flag, then environment
//! variable (resolved by clap), then `deploy.toml`, then defaults. The access
//! token is only ever taken from the CLI or environment.
//!
//! # Example
//!
//! ```toml
//! [deploy]
//! repository = "owner/site"
//! keep_history = false
//!
//! [commit]
//! author = "Jane Doe <jane@example.com>"
//! message = "Deploy to GitHub pages"
//! ```

mod commit;
pub mod defaults;
mod deploy;
mod error;
mod identity;

pub use error::ConfigError;
pub use identity::{Identity, IdentityError};

use commit::CommitConfig;
use deploy::DeployConfig;

use crate::cli::Cli;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing deploy.toml
#[derive(Clone, Educe, Serialize, Deserialize)]
#[educe(Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Invocation root; `build/` and `assets/` resolve against it
    #[serde(skip)]
    pub root: PathBuf,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Access token for the remote
    #[serde(skip)]
    #[educe(Debug(ignore))]
    pub token: Option<String>,

    /// Stop before pushing
    #[serde(skip)]
    pub dry_run: bool,

    /// Deployment target settings
    #[serde(default)]
    pub deploy: DeployConfig,

    /// Commit identities and message
    #[serde(default)]
    pub commit: CommitConfig,
}

impl Config {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Update configuration with CLI arguments (and the env vars clap folded in)
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        self.root = Self::normalize_path(root);
        self.config_path = Self::normalize_path(&self.root.join(&cli.config));

        Self::update_some(&mut self.deploy.repository, cli.repository.as_ref());
        Self::update_some(&mut self.deploy.server_url, cli.server_url.as_ref());
        Self::update_option(&mut self.deploy.keep_history, cli.keep_history.as_ref());
        Self::update_option(&mut self.commit.author, cli.author.as_ref());
        Self::update_option(&mut self.commit.committer, cli.committer.as_ref());
        Self::update_option(&mut self.commit.message, cli.message.as_ref());

        self.token.clone_from(&cli.token);
        self.dry_run = cli.dry_run;
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Update an optional config value if CLI value is provided
    fn update_some<T: Clone>(config_option: &mut Option<T>, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = Some(option.clone());
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Repository slug to deploy to
    pub fn repository(&self) -> Result<&str, ConfigError> {
        self.deploy
            .repository
            .as_deref()
            .filter(|slug| !slug.trim().is_empty())
            .ok_or_else(|| {
                ConfigError::Validation(
                    "repository is not set, pass --repository or GITHUB_REPOSITORY".into(),
                )
            })
    }

    /// Validate everything that can be checked without touching the network
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.commit.message.trim().is_empty() {
            return Err(ConfigError::Validation(
                "[commit.message] cannot be empty".into(),
            ));
        }

        if self.deploy.stat_count == 0 {
            return Err(ConfigError::Validation(
                "[deploy.stat_count] must be at least 1".into(),
            ));
        }

        self.commit.author()?;
        self.commit.committer()?;

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
