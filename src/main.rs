//! Forge Config CLI
//!
//! Prints resolved forge configuration, single values, and the environment
//! variables that override them.

use anyhow::Result;
use clap::Parser;
use forge_config::cli::resolve::{run_get, run_resolve};
use forge_config::cli::{Cli, Command};
use forge_config::config::{ENV_PREFIX, env_var_for_path};
use std::fs::OpenOptions;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;
    debug!(command = ?cli.command, "starting");

    let output = match &cli.command {
        Command::Resolve(args) => run_resolve(args).await?,
        Command::Get(args) => run_get(args).await?,
        Command::EnvName(args) => env_var_for_path(ENV_PREFIX, &args.path),
    };
    println!("{output}");
    Ok(())
}
