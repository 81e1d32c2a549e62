//! Build-identifier maps.
//!
//! A single config key can carry one value per build identifier (for example
//! one output directory per target platform). The resolver swaps the map for
//! the entry of the identifier that is active at the moment of access.

use super::value::{ConfigMap, ConfigValue};
use std::fmt;
use std::sync::Arc;

/// A value that varies by build identifier.
///
/// Immutable once constructed. Keys are opaque identifier strings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BuildIdentifierMap {
    entries: ConfigMap,
}

impl BuildIdentifierMap {
    pub fn new(entries: ConfigMap) -> Self {
        Self { entries }
    }

    /// Entry for an identifier, if present.
    pub fn get(&self, identifier: &str) -> Option<&ConfigValue> {
        self.entries.get(identifier)
    }

    pub fn entries(&self) -> &ConfigMap {
        &self.entries
    }

    pub fn into_entries(self) -> ConfigMap {
        self.entries
    }
}

/// Build a [`ConfigValue::IdentifierMap`] from identifier/value pairs.
///
/// ```
/// use forge_config::config::{ConfigValue, from_build_identifier};
///
/// let out_dir = from_build_identifier([("beta", "out/beta"), ("prod", "out/prod")]);
/// assert!(matches!(out_dir, ConfigValue::IdentifierMap(_)));
/// ```
pub fn from_build_identifier<I, K, V>(entries: I) -> ConfigValue
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<ConfigValue>,
{
    ConfigValue::IdentifierMap(BuildIdentifierMap::new(
        entries
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect(),
    ))
}

/// The identifier used to pick entries out of a [`BuildIdentifierMap`].
///
/// The dynamic form is evaluated on every access, so one resolved config can
/// serve several targets in a single process.
#[derive(Clone)]
pub enum BuildIdentifier {
    Fixed(String),
    Dynamic(Arc<dyn Fn() -> String + Send + Sync>),
}

impl BuildIdentifier {
    pub fn fixed(identifier: impl Into<String>) -> Self {
        BuildIdentifier::Fixed(identifier.into())
    }

    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        BuildIdentifier::Dynamic(Arc::new(f))
    }

    /// Evaluate the identifier now.
    pub fn current(&self) -> String {
        match self {
            BuildIdentifier::Fixed(identifier) => identifier.clone(),
            BuildIdentifier::Dynamic(f) => f(),
        }
    }
}

impl Default for BuildIdentifier {
    fn default() -> Self {
        BuildIdentifier::Fixed(String::new())
    }
}

impl fmt::Debug for BuildIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildIdentifier::Fixed(identifier) => f.debug_tuple("Fixed").field(identifier).finish(),
            BuildIdentifier::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<&str> for BuildIdentifier {
    fn from(value: &str) -> Self {
        BuildIdentifier::fixed(value)
    }
}

impl From<String> for BuildIdentifier {
    fn from(value: String) -> Self {
        BuildIdentifier::Fixed(value)
    }
}
