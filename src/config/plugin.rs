//! Plugin-interface handle.
//!
//! Plugin registration lives outside this crate. The loader only constructs
//! a handle through a [`PluginInterfaceFactory`] and stores it under the
//! `pluginInterface` key, where the resolver leaves it untouched.

use super::value::ConfigValue;
use anyhow::Result;
use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Key under which the handle is attached to the config tree.
pub const PLUGIN_INTERFACE_KEY: &str = "pluginInterface";

/// Opaque interface to the plugin subsystem.
pub trait PluginInterface: Send + Sync + fmt::Debug {
    /// Names of the plugins known to this interface.
    fn plugin_names(&self) -> Vec<String>;

    fn as_any(&self) -> &dyn Any;
}

/// Shared handle to a [`PluginInterface`].
///
/// Two handles are equal when they point at the same interface.
#[derive(Debug, Clone)]
pub struct PluginHandle(Arc<dyn PluginInterface>);

impl PluginHandle {
    pub fn new(interface: Arc<dyn PluginInterface>) -> Self {
        Self(interface)
    }

    pub fn interface(&self) -> &dyn PluginInterface {
        self.0.as_ref()
    }

    /// Downcast to a concrete interface type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }
}

impl PartialEq for PluginHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Builds the plugin interface once per load.
pub trait PluginInterfaceFactory: Send + Sync {
    fn create(&self, dir: &Path, config: &ConfigValue) -> Result<Arc<dyn PluginInterface>>;
}

impl<F> PluginInterfaceFactory for F
where
    F: Fn(&Path, &ConfigValue) -> Result<Arc<dyn PluginInterface>> + Send + Sync,
{
    fn create(&self, dir: &Path, config: &ConfigValue) -> Result<Arc<dyn PluginInterface>> {
        self(dir, config)
    }
}

/// Inert interface recording the plugins named in the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticPluginInterface {
    dir: PathBuf,
    plugins: Vec<String>,
}

impl StaticPluginInterface {
    /// Collect plugin names from the `plugins` section.
    ///
    /// Entries may be a bare name, a `[name, options]` pair, or a mapping
    /// with a `name` field. Anything else is skipped.
    pub fn from_config(dir: &Path, config: &ConfigValue) -> Self {
        let plugins = config
            .get("plugins")
            .and_then(ConfigValue::as_array)
            .unwrap_or_default()
            .iter()
            .filter_map(|entry| match entry {
                ConfigValue::String(name) => Some(name.clone()),
                ConfigValue::Array(pair) => pair.first().and_then(ConfigValue::as_str).map(str::to_string),
                ConfigValue::Object(map) => map.get("name").and_then(ConfigValue::as_str).map(str::to_string),
                _ => None,
            })
            .collect();

        Self {
            dir: dir.to_path_buf(),
            plugins,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl PluginInterface for StaticPluginInterface {
    fn plugin_names(&self) -> Vec<String> {
        self.plugins.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Default factory producing a [`StaticPluginInterface`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticPluginFactory;

impl PluginInterfaceFactory for StaticPluginFactory {
    fn create(&self, dir: &Path, config: &ConfigValue) -> Result<Arc<dyn PluginInterface>> {
        Ok(Arc::new(StaticPluginInterface::from_config(dir, config)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_static_interface_collects_names() {
        let config = ConfigValue::from(json!({
            "plugins": [
                "@forge/plugin-auto-unpack",
                ["@forge/plugin-webpack", {"mainConfig": "./webpack.main.js"}],
                {"name": "@forge/plugin-fuses", "config": {}},
                42
            ]
        }));
        let interface = StaticPluginInterface::from_config(Path::new("/project"), &config);

        assert_eq!(
            interface.plugin_names(),
            vec![
                "@forge/plugin-auto-unpack",
                "@forge/plugin-webpack",
                "@forge/plugin-fuses"
            ]
        );
        assert_eq!(interface.dir(), Path::new("/project"));
    }

    #[test]
    fn test_handle_equality_is_identity() {
        let interface: Arc<dyn PluginInterface> =
            Arc::new(StaticPluginInterface::from_config(Path::new("."), &ConfigValue::Null));
        let a = PluginHandle::new(Arc::clone(&interface));
        let b = PluginHandle::new(interface);
        let c = PluginHandle::new(Arc::new(StaticPluginInterface::from_config(
            Path::new("."),
            &ConfigValue::Null,
        )));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.downcast_ref::<StaticPluginInterface>().is_some());
    }
}
