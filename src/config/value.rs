//! Configuration tree values.
//!
//! A [`ConfigValue`] is what every stage of the loader passes around: the
//! inline manifest section, loaded config modules, template output, and the
//! tree handed to mutating hooks. It mirrors JSON with three extra variants
//! that plain data cannot express:
//!
//! - [`ConfigValue::Pattern`] - a regular expression source, kept opaque
//! - [`ConfigValue::IdentifierMap`] - a value chosen by build identifier
//! - [`ConfigValue::Plugin`] - the plugin-interface handle
//!
//! YAML modules spell the first two with tags:
//!
//! ```yaml
//! packagerConfig:
//!   ignore: !regex '^/out'
//!   icon: !from_build_identifier
//!     beta: assets/beta.icns
//!     prod: assets/icon.icns
//! ```

use super::identifier::BuildIdentifierMap;
use super::plugin::PluginHandle;
use anyhow::{Result, anyhow, bail};
use serde::{Serialize, Serializer};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// YAML tag marking a build-identifier map.
pub const IDENTIFIER_MAP_TAG: &str = "from_build_identifier";

/// YAML tag marking a regular expression.
pub const PATTERN_TAG: &str = "regex";

/// Mapping node of a configuration tree.
pub type ConfigMap = BTreeMap<String, ConfigValue>;

/// A node of a configuration tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ConfigValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<ConfigValue>),
    Object(ConfigMap),
    /// Regular expression source. Never templated, wrapped, or overridden.
    Pattern(String),
    IdentifierMap(BuildIdentifierMap),
    Plugin(PluginHandle),
}

/// Serializes as [`ConfigValue::to_json`] does.
impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl ConfigValue {
    /// Create an empty mapping.
    pub fn object() -> Self {
        ConfigValue::Object(ConfigMap::new())
    }

    /// Create an empty sequence.
    pub fn array() -> Self {
        ConfigValue::Array(Vec::new())
    }

    /// Convert a YAML document, honouring the `!from_build_identifier` and
    /// `!regex` tags.
    pub fn from_yaml(value: serde_yaml::Value) -> Result<Self> {
        use serde_yaml::Value as Yaml;

        Ok(match value {
            Yaml::Null => ConfigValue::Null,
            Yaml::Bool(b) => ConfigValue::Bool(b),
            Yaml::Number(n) => ConfigValue::Number(yaml_number(&n)?),
            Yaml::String(s) => ConfigValue::String(s),
            Yaml::Sequence(items) => ConfigValue::Array(
                items
                    .into_iter()
                    .map(ConfigValue::from_yaml)
                    .collect::<Result<_>>()?,
            ),
            Yaml::Mapping(mapping) => ConfigValue::Object(yaml_mapping(mapping)?),
            Yaml::Tagged(tagged) => {
                let tagged = *tagged;
                if tagged.tag == IDENTIFIER_MAP_TAG {
                    match tagged.value {
                        Yaml::Mapping(mapping) => ConfigValue::IdentifierMap(
                            BuildIdentifierMap::new(yaml_mapping(mapping)?),
                        ),
                        _ => bail!("!{IDENTIFIER_MAP_TAG} must tag a mapping"),
                    }
                } else if tagged.tag == PATTERN_TAG {
                    match tagged.value {
                        Yaml::String(source) => ConfigValue::Pattern(source),
                        _ => bail!("!{PATTERN_TAG} must tag a string"),
                    }
                } else {
                    bail!("unsupported YAML tag {}", tagged.tag)
                }
            }
        })
    }

    /// Plain JSON rendering of the raw tree.
    ///
    /// Patterns become their source string, identifier maps become a mapping
    /// of their entries, and the plugin handle becomes `null`.
    pub fn to_json(&self) -> Value {
        match self {
            ConfigValue::Null | ConfigValue::Plugin(_) => Value::Null,
            ConfigValue::Bool(b) => Value::Bool(*b),
            ConfigValue::Number(n) => Value::Number(n.clone()),
            ConfigValue::String(s) | ConfigValue::Pattern(s) => Value::String(s.clone()),
            ConfigValue::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            ConfigValue::Object(map) => Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
            ConfigValue::IdentifierMap(map) => Value::Object(
                map.entries()
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&ConfigMap> {
        match self {
            ConfigValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_object_mut(&mut self) -> Option<&mut ConfigMap> {
        match self {
            ConfigValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    /// Look up a direct child by key (mapping) or index (sequence).
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        match self {
            ConfigValue::Object(map) => map.get(key),
            ConfigValue::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        }
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ConfigValue::Null => "null",
            ConfigValue::Bool(_) => "boolean",
            ConfigValue::Number(_) => "number",
            ConfigValue::String(_) => "string",
            ConfigValue::Array(_) => "sequence",
            ConfigValue::Object(_) => "mapping",
            ConfigValue::Pattern(_) => "pattern",
            ConfigValue::IdentifierMap(_) => "build identifier map",
            ConfigValue::Plugin(_) => "plugin interface",
        }
    }
}

fn yaml_number(n: &serde_yaml::Number) -> Result<Number> {
    if let Some(i) = n.as_i64() {
        Ok(Number::from(i))
    } else if let Some(u) = n.as_u64() {
        Ok(Number::from(u))
    } else {
        n.as_f64()
            .and_then(Number::from_f64)
            .ok_or_else(|| anyhow!("number {n} cannot be represented"))
    }
}

fn yaml_mapping(mapping: serde_yaml::Mapping) -> Result<ConfigMap> {
    use serde_yaml::Value as Yaml;

    mapping
        .into_iter()
        .map(|(key, value)| {
            let key = match key {
                Yaml::String(s) => s,
                Yaml::Number(n) => n.to_string(),
                Yaml::Bool(b) => b.to_string(),
                other => bail!("unsupported mapping key {other:?}"),
            };
            Ok((key, ConfigValue::from_yaml(value)?))
        })
        .collect()
}

impl From<Value> for ConfigValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ConfigValue::Null,
            Value::Bool(b) => ConfigValue::Bool(b),
            Value::Number(n) => ConfigValue::Number(n),
            Value::String(s) => ConfigValue::String(s),
            Value::Array(items) => ConfigValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => ConfigValue::Object(
                map.into_iter()
                    .map(|(key, value)| (key, value.into()))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Number(value.into())
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(value: ConfigMap) -> Self {
        ConfigValue::Object(value)
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(value: Vec<ConfigValue>) -> Self {
        ConfigValue::Array(value)
    }
}

impl From<BuildIdentifierMap> for ConfigValue {
    fn from(value: BuildIdentifierMap) -> Self {
        ConfigValue::IdentifierMap(value)
    }
}
