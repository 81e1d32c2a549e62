//! Environment lookups used by the resolver.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

/// Source of environment variables.
pub trait EnvSource: Send + Sync + fmt::Debug {
    /// Raw value of a variable, if set.
    fn var(&self, key: &str) -> Option<String>;

    /// Value of a variable when it is set to a non-empty string.
    ///
    /// Only such values override configuration.
    fn override_value(&self, key: &str) -> Option<String> {
        self.var(key).filter(|value| !value.is_empty())
    }
}

/// The process environment. Values are read on every lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// An in-memory environment that can be changed after the resolver is built.
#[derive(Debug, Default)]
pub struct MapEnv {
    vars: RwLock<HashMap<String, String>>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`MapEnv::set`].
    pub fn with(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.vars
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) {
        self.vars
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key);
    }
}

impl EnvSource for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
    }
}

/// Parse an env-style boolean (1/true/yes/on are true). Empty input is `None`.
pub fn parse_bool(value: &str) -> Option<bool> {
    let trimmed = value.trim().to_ascii_lowercase();
    if trimmed.is_empty() {
        return None;
    }
    Some(matches!(trimmed.as_str(), "1" | "true" | "yes" | "on"))
}
