//! Command-line interface definitions.
//!
//! Defines all CLI arguments using clap. Arguments that GitHub Actions
//! provides through the environment fall back to those variables.

use crate::deploy::DeployType;
use clap::Parser;
use std::path::PathBuf;

/// Publish build output to a branch of a GitHub repository
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// What to deploy; selects the target branch and which directories are kept
    #[arg(short = 't', long, env = "INPUT_DEPLOY_TYPE", value_enum)]
    pub deploy_type: DeployType,

    /// Invocation root holding `build/` and `assets/` (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to root (optional)
    #[arg(short = 'C', long, default_value = "deploy.toml")]
    pub config: PathBuf,

    /// Repository to deploy to, as `owner/name`
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    /// Access token used to push
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Server URL, for GitHub Enterprise
    #[arg(long, env = "GITHUB_SERVER_URL")]
    pub server_url: Option<String>,

    /// Commit author, as `Name <email>`
    #[arg(long)]
    pub author: Option<String>,

    /// Commit committer, as `Name <email>`
    #[arg(long)]
    pub committer: Option<String>,

    /// Commit message
    #[arg(short, long)]
    pub message: Option<String>,

    /// Commit on top of the branch history instead of replacing it
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub keep_history: Option<bool>,

    /// Do everything except pushing
    #[arg(long)]
    pub dry_run: bool,
}
