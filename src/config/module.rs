//! Loading config modules from disk.
//!
//! A module reference names a data file relative to the project directory,
//! with or without its extension. `forge.config` finds `forge.config.json`,
//! `forge.config.yaml` or `forge.config.yml`, in that order, when no file
//! with the exact name exists.

use super::value::ConfigValue;
use anyhow::{Context, Result, anyhow};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Extensions tried, in order, when a reference has no exact match.
pub const MODULE_EXTENSIONS: &[&str] = &["json", "yaml", "yml"];

/// Candidate files for a module reference, exact name first.
pub fn module_candidates(path: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![path.to_path_buf()];
    candidates.extend(MODULE_EXTENSIONS.iter().map(|ext| {
        let mut name = OsString::from(path.as_os_str());
        name.push(".");
        name.push(ext);
        PathBuf::from(name)
    }));
    candidates
}

/// Resolves and loads config modules.
pub trait ModuleLoader: Send + Sync {
    /// The file a reference points at, if any.
    fn resolve(&self, path: &Path) -> Option<PathBuf>;

    /// Load the value exported by a module.
    fn load_module(&self, path: &Path) -> Result<ConfigValue>;
}

/// Loads JSON and YAML modules from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsModuleLoader;

impl FsModuleLoader {
    fn parse(path: &Path, content: &str) -> Result<ConfigValue> {
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            let value: serde_json::Value = serde_json::from_str(content)
                .with_context(|| format!("invalid JSON in {}", path.display()))?;
            Ok(value.into())
        } else {
            let value: serde_yaml::Value = serde_yaml::from_str(content)
                .with_context(|| format!("invalid YAML in {}", path.display()))?;
            ConfigValue::from_yaml(value).with_context(|| format!("in {}", path.display()))
        }
    }
}

impl ModuleLoader for FsModuleLoader {
    fn resolve(&self, path: &Path) -> Option<PathBuf> {
        module_candidates(path)
            .into_iter()
            .find(|candidate| candidate.is_file())
    }

    fn load_module(&self, path: &Path) -> Result<ConfigValue> {
        let resolved = self
            .resolve(path)
            .ok_or_else(|| anyhow!("cannot find module '{}'", path.display()))?;
        let content = std::fs::read_to_string(&resolved)
            .with_context(|| format!("failed to read {}", resolved.display()))?;
        Self::parse(&resolved, &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_candidates_order() {
        let candidates = module_candidates(Path::new("/p/forge.config"));
        assert_eq!(
            candidates,
            vec![
                PathBuf::from("/p/forge.config"),
                PathBuf::from("/p/forge.config.json"),
                PathBuf::from("/p/forge.config.yaml"),
                PathBuf::from("/p/forge.config.yml"),
            ]
        );
    }

    #[test]
    fn test_load_json_and_yaml() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.json"), r#"{"x": [1, 2]}"#).unwrap();
        std::fs::write(temp.path().join("b.yml"), "x:\n  - 1\n  - 2\n").unwrap();

        let loader = FsModuleLoader;
        let a = loader.load_module(&temp.path().join("a")).unwrap();
        let b = loader.load_module(&temp.path().join("b.yml")).unwrap();

        assert_eq!(a.to_json(), serde_json::json!({"x": [1, 2]}));
        assert_eq!(a, b);
    }

    #[test]
    fn test_extensionless_file_parsed_as_yaml() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("icon"), "assets/icon.png").unwrap();

        let value = FsModuleLoader.load_module(&temp.path().join("icon")).unwrap();
        assert_eq!(value.as_str(), Some("assets/icon.png"));
    }

    #[test]
    fn test_missing_module() {
        let temp = TempDir::new().unwrap();
        let err = FsModuleLoader
            .load_module(&temp.path().join("nope"))
            .unwrap_err();
        assert!(err.to_string().contains("cannot find module"));
    }

    #[test]
    fn test_directory_is_not_a_module() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("dir")).unwrap();
        assert_eq!(FsModuleLoader.resolve(&temp.path().join("dir")), None);
    }
}
