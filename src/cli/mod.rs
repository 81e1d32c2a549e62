//! CLI command definitions for forge-config
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod resolve;

use clap::{Args, Parser, Subcommand};
use resolve::{GetArgs, ResolveArgs};

/// Resolve forge configuration the way build tooling sees it
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the fully resolved config of a project
    Resolve(ResolveArgs),

    /// Print a single resolved value by dotted path
    Get(GetArgs),

    /// Print the environment variable that overrides a dotted path
    EnvName(EnvNameArgs),
}

/// Arguments for the env-name subcommand
#[derive(Args, Debug)]
pub struct EnvNameArgs {
    /// Dotted config path, e.g. packagerConfig.osxSign.identity
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::OutputFormat;

    #[test]
    fn test_parse_resolve() {
        let cli = Cli::try_parse_from([
            "forge-config",
            "resolve",
            "app",
            "--build-identifier",
            "beta",
            "--format",
            "yaml",
        ])
        .unwrap();
        match cli.command {
            Command::Resolve(args) => {
                assert_eq!(args.dir, std::path::PathBuf::from("app"));
                assert_eq!(args.build_identifier.as_deref(), Some("beta"));
                assert_eq!(args.format, OutputFormat::Yaml);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_parse_get_defaults() {
        let cli = Cli::try_parse_from(["forge-config", "-v", "get", "packagerConfig.name"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.log, "2");
        match cli.command {
            Command::Get(args) => {
                assert_eq!(args.path, "packagerConfig.name");
                assert_eq!(args.dir, std::path::PathBuf::from("."));
                assert_eq!(args.format, OutputFormat::Json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
