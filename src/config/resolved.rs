//! The final, read-only forge config.

use super::plugin::{PLUGIN_INTERFACE_KEY, PluginHandle};
use super::resolver::{Resolved, ResolvedNode};
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::ops::Deref;
use std::sync::Arc;

pub const ELECTRON_REBUILD_CONFIG_KEY: &str = "electronRebuildConfig";
pub const PACKAGER_CONFIG_KEY: &str = "packagerConfig";
pub const MAKERS_KEY: &str = "makers";
pub const PUBLISHERS_KEY: &str = "publishers";
pub const PLUGINS_KEY: &str = "plugins";
pub const BUILD_IDENTIFIER_KEY: &str = "buildIdentifier";

/// A resolved forge config, cheap to clone and share across threads.
///
/// Dereferences to the root [`ResolvedNode`] for generic access; the
/// section accessors cover the well-known keys.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    root: Arc<ResolvedNode>,
}

impl ResolvedConfig {
    pub fn new(root: ResolvedNode) -> Self {
        Self {
            root: Arc::new(root),
        }
    }

    pub fn root(&self) -> &ResolvedNode {
        &self.root
    }

    fn section(&self, key: &str) -> Option<&ResolvedNode> {
        self.root.get(key).and_then(|value| value.as_node())
    }

    /// Options passed to the native module rebuild step.
    pub fn electron_rebuild_config(&self) -> Option<&ResolvedNode> {
        self.section(ELECTRON_REBUILD_CONFIG_KEY)
    }

    /// Options passed to the packaging step.
    pub fn packager_config(&self) -> Option<&ResolvedNode> {
        self.section(PACKAGER_CONFIG_KEY)
    }

    pub fn makers(&self) -> Vec<Resolved<'_>> {
        self.section(MAKERS_KEY).map(ResolvedNode::values).unwrap_or_default()
    }

    pub fn publishers(&self) -> Vec<Resolved<'_>> {
        self.section(PUBLISHERS_KEY).map(ResolvedNode::values).unwrap_or_default()
    }

    pub fn plugins(&self) -> Vec<Resolved<'_>> {
        self.section(PLUGINS_KEY).map(ResolvedNode::values).unwrap_or_default()
    }

    pub fn plugin_interface(&self) -> Option<&PluginHandle> {
        self.root.get(PLUGIN_INTERFACE_KEY)?.as_plugin()
    }

    /// The `buildIdentifier` field, which may itself come from the environment.
    pub fn build_identifier(&self) -> Option<String> {
        self.root
            .get(BUILD_IDENTIFIER_KEY)
            .and_then(|value| value.as_str().map(str::to_string))
    }

    pub fn to_json(&self) -> Value {
        self.root.to_json()
    }
}

impl Deref for ResolvedConfig {
    type Target = ResolvedNode;

    fn deref(&self) -> &ResolvedNode {
        &self.root
    }
}

/// Serializes the snapshot produced by [`ResolvedConfig::to_json`].
impl Serialize for ResolvedConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
