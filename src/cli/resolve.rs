//! Resolve and get subcommands.

use crate::config::ConfigLoader;
use crate::format::OutputFormat;
use anyhow::{Result, bail};
use clap::Args;
use std::path::{Path, PathBuf};

/// Arguments for the resolve subcommand
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Project directory containing package.json
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Build identifier used for build-identifier maps (overrides the config)
    #[arg(short, long, value_name = "ID")]
    pub build_identifier: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

/// Arguments for the get subcommand
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Dotted config path, e.g. packagerConfig.name or makers.0.config
    pub path: String,

    /// Project directory containing package.json
    #[arg(default_value = ".")]
    pub dir: PathBuf,

    /// Build identifier used for build-identifier maps (overrides the config)
    #[arg(short, long, value_name = "ID")]
    pub build_identifier: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    pub format: OutputFormat,
}

fn loader(dir: &Path, build_identifier: Option<&str>) -> ConfigLoader {
    let loader = ConfigLoader::new(dir);
    match build_identifier {
        Some(identifier) => loader.with_build_identifier(identifier),
        None => loader,
    }
}

/// Run the resolve command, returning the rendered output.
pub async fn run_resolve(args: &ResolveArgs) -> Result<String> {
    let config = loader(&args.dir, args.build_identifier.as_deref())
        .load()
        .await?;
    args.format.render(&config.to_json())
}

/// Run the get command, returning the rendered output.
pub async fn run_get(args: &GetArgs) -> Result<String> {
    let config = loader(&args.dir, args.build_identifier.as_deref())
        .load()
        .await?;
    match config.get_path(&args.path) {
        Some(value) => args.format.render(&value.to_json()),
        None => bail!("`{}` is not set", args.path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_run_get_and_resolve() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join("package.json"),
            r#"{"name": "cli-app", "config": {"forge": {"packagerConfig": {"name": "<%= name %>"}}}}"#,
        )
        .unwrap();

        let out = run_get(&GetArgs {
            path: "packagerConfig.name".into(),
            dir: temp.path().to_path_buf(),
            build_identifier: None,
            format: OutputFormat::Json,
        })
        .await
        .unwrap();
        assert_eq!(out, "cli-app");

        let out = run_resolve(&ResolveArgs {
            dir: temp.path().to_path_buf(),
            build_identifier: None,
            format: OutputFormat::Json,
        })
        .await
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["packagerConfig"]["name"], "cli-app");
        assert_eq!(value["makers"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_run_get_missing_path() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("package.json"), r#"{"name": "cli-app"}"#).unwrap();

        let err = run_get(&GetArgs {
            path: "packagerConfig.definitelyNotSetAnywhere".into(),
            dir: temp.path().to_path_buf(),
            build_identifier: None,
            format: OutputFormat::Json,
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("is not set"));
    }
}
