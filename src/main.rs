//! branch-deploy - publish build output to branches of a GitHub repository.

mod cli;
mod config;
mod deploy;
mod logger;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use config::Config;
use deploy::{Deployer, Outcome};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(Outcome::Deployed { commit } | Outcome::DryRun { commit }) => {
            log!("git"; "commit {commit}");
            ExitCode::SUCCESS
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            let message = format!("{err:#}");
            log!("error"; "{message}");
            logger::annotate_error(&message);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<Outcome> {
    let config = load_config(cli)?;
    let outcome = Deployer::new(cli.deploy_type, &config)
        .run()
        .with_context(|| format!("{} deploy failed", cli.deploy_type))?;
    Ok(outcome)
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::default();
    config.update_with_cli(cli);

    // The config file is optional; CI runs usually rely on the environment alone
    if config.config_path.exists() {
        log!("deploy"; "using `{}`", config.config_path.display());
        config = Config::from_path(&config.config_path)?;
        config.update_with_cli(cli);
    }
    config.validate()?;

    Ok(config)
}
