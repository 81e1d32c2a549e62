//! Package manifest access.

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde_json::Value;
use std::path::Path;

/// Manifest file read from the project directory.
pub const MANIFEST_FILE: &str = "package.json";

/// Reads the package manifest of a project.
#[async_trait]
pub trait ManifestReader: Send + Sync {
    async fn read_manifest(&self, dir: &Path) -> Result<Value>;
}

/// Reads `package.json` from the project directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageJsonReader;

#[async_trait]
impl ManifestReader for PackageJsonReader {
    async fn read_manifest(&self, dir: &Path) -> Result<Value> {
        let path = dir.join(MANIFEST_FILE);
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let manifest: Value = serde_json::from_str(&content)
            .with_context(|| format!("invalid JSON in {}", path.display()))?;
        if !manifest.is_object() {
            bail!("{} must contain a JSON object", path.display());
        }
        Ok(manifest)
    }
}

/// A manifest supplied in memory.
#[derive(Debug, Clone)]
pub struct StaticManifest(pub Value);

#[async_trait]
impl ManifestReader for StaticManifest {
    async fn read_manifest(&self, _dir: &Path) -> Result<Value> {
        Ok(self.0.clone())
    }
}

/// The manifest name with hyphens replaced by underscores.
pub fn sanitized_name(manifest: &Value) -> String {
    manifest
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .replace('-', "_")
}

/// The `config.forge` section when it holds a truthy value.
pub fn forge_section(manifest: &Value) -> Option<&Value> {
    manifest
        .get("config")
        .and_then(|config| config.get("forge"))
        .filter(|forge| is_truthy(forge))
}

/// Truthiness of a manifest value: null, false, zero, and "" are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
