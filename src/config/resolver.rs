//! Read-through views over a config tree.
//!
//! [`ConfigResolver::wrap`] turns a tree into a [`ResolvedNode`]. Nested
//! mappings and sequences are wrapped up front, each with its own env
//! prefix, but nothing is looked up until a field is read. Every read of a
//! field:
//!
//! 1. returns the tree's own value when the field exists;
//! 2. otherwise returns `<PREFIX>_<FIELD>` from the environment when it is
//!    set to a non-empty string (always as a string);
//! 3. replaces a build-identifier map with the entry for the identifier
//!    current at the time of the read.
//!
//! Environment changes are visible to the next read. Nothing is cached.

use super::env::{EnvSource, ProcessEnv, parse_bool};
use super::identifier::BuildIdentifier;
use super::mangle::env_var_name;
use super::plugin::{PLUGIN_INTERFACE_KEY, PluginHandle};
use super::value::ConfigValue;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Shared by every node of one wrapped tree.
#[derive(Debug)]
struct ResolveContext {
    identifier: BuildIdentifier,
    env: Arc<dyn EnvSource>,
}

#[derive(Debug, Clone)]
enum Slot {
    /// Scalars, patterns, and the plugin handle.
    Leaf(ConfigValue),
    Node(ResolvedNode),
    /// A build-identifier map with its entries already wrapped.
    Choice(BTreeMap<String, Slot>),
}

#[derive(Debug, Clone)]
enum Children {
    Object(BTreeMap<String, Slot>),
    Array(Vec<Slot>),
}

/// Where a field's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSource {
    /// The field exists in the tree.
    Own,
    /// Only the environment variable for the field is set.
    Environment,
}

/// Wraps config trees into read-through views.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    identifier: BuildIdentifier,
    env: Arc<dyn EnvSource>,
}

impl ConfigResolver {
    /// Resolver reading the process environment.
    pub fn new(identifier: impl Into<BuildIdentifier>) -> Self {
        Self {
            identifier: identifier.into(),
            env: Arc::new(ProcessEnv),
        }
    }

    pub fn with_env(mut self, env: Arc<dyn EnvSource>) -> Self {
        self.env = env;
        self
    }

    /// Wrap a mapping or sequence. Any other value wraps as an empty mapping.
    pub fn wrap(&self, tree: ConfigValue, prefix: &str) -> ResolvedNode {
        let ctx = Arc::new(ResolveContext {
            identifier: self.identifier.clone(),
            env: Arc::clone(&self.env),
        });
        let tree = match tree {
            tree @ (ConfigValue::Object(_) | ConfigValue::Array(_)) => tree,
            other => {
                tracing::warn!(kind = other.kind(), "cannot wrap a non-container config value");
                ConfigValue::object()
            }
        };
        ResolvedNode::build(&ctx, tree, prefix.to_string())
    }
}

/// Wrap `tree` reading overrides from the process environment.
pub fn wrap(identifier: impl Into<BuildIdentifier>, tree: ConfigValue, prefix: &str) -> ResolvedNode {
    ConfigResolver::new(identifier).wrap(tree, prefix)
}

/// A wrapped mapping or sequence.
#[derive(Clone)]
pub struct ResolvedNode {
    prefix: String,
    children: Children,
    ctx: Arc<ResolveContext>,
}

impl fmt::Debug for ResolvedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedNode")
            .field("prefix", &self.prefix)
            .field("children", &self.children)
            .finish()
    }
}

impl ResolvedNode {
    fn build(ctx: &Arc<ResolveContext>, tree: ConfigValue, prefix: String) -> Self {
        let children = match tree {
            ConfigValue::Array(items) => Children::Array(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| {
                        Self::slot(ctx, item, env_var_name(&prefix, &index.to_string()))
                    })
                    .collect(),
            ),
            ConfigValue::Object(map) => Children::Object(
                map.into_iter()
                    .map(|(key, value)| {
                        let slot = if key == PLUGIN_INTERFACE_KEY {
                            Slot::Leaf(value)
                        } else {
                            Self::slot(ctx, value, env_var_name(&prefix, &key))
                        };
                        (key, slot)
                    })
                    .collect(),
            ),
            _ => Children::Object(BTreeMap::new()),
        };

        Self {
            prefix,
            children,
            ctx: Arc::clone(ctx),
        }
    }

    /// Entries of an identifier map resolve in place of the field holding
    /// the map, so they share its prefix.
    fn slot(ctx: &Arc<ResolveContext>, value: ConfigValue, prefix: String) -> Slot {
        match value {
            ConfigValue::Object(_) | ConfigValue::Array(_) => {
                Slot::Node(Self::build(ctx, value, prefix))
            }
            ConfigValue::IdentifierMap(map) => Slot::Choice(
                map.into_entries()
                    .into_iter()
                    .map(|(identifier, entry)| (identifier, Self::slot(ctx, entry, prefix.clone())))
                    .collect(),
            ),
            other => Slot::Leaf(other),
        }
    }

    fn own(&self, key: &str) -> Option<&Slot> {
        match &self.children {
            Children::Object(map) => map.get(key),
            Children::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        }
    }

    fn resolve_slot<'a>(&'a self, slot: &'a Slot) -> Option<Resolved<'a>> {
        match slot {
            Slot::Leaf(value) => Some(Resolved::Value(value)),
            Slot::Node(node) => Some(Resolved::Node(node)),
            Slot::Choice(entries) => {
                let identifier = self.ctx.identifier.current();
                entries
                    .get(&identifier)
                    .and_then(|entry| self.resolve_slot(entry))
            }
        }
    }

    /// Read a field (or sequence index given as a string).
    pub fn get(&self, key: &str) -> Option<Resolved<'_>> {
        match self.own(key) {
            Some(slot) => self.resolve_slot(slot),
            None => self.env_override(key).map(Resolved::Env),
        }
    }

    /// Read a sequence element.
    pub fn index(&self, index: usize) -> Option<Resolved<'_>> {
        self.get(&index.to_string())
    }

    /// Follow a dotted path such as `packagerConfig.osxSign.identity`.
    pub fn get_path(&self, path: &str) -> Option<Resolved<'_>> {
        let mut segments = path.split('.').filter(|segment| !segment.is_empty());
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            current = current.as_node()?.get(segment)?;
        }
        Some(current)
    }

    /// Whether the field exists in the tree or its env variable is set.
    pub fn has(&self, key: &str) -> bool {
        self.field_source(key).is_some()
    }

    pub fn field_source(&self, key: &str) -> Option<FieldSource> {
        if self.own(key).is_some() {
            Some(FieldSource::Own)
        } else if self.env_override(key).is_some() {
            Some(FieldSource::Environment)
        } else {
            None
        }
    }

    /// Name of the variable that overrides `key` on this node.
    pub fn env_var(&self, key: &str) -> String {
        env_var_name(&self.prefix, key)
    }

    fn env_override(&self, key: &str) -> Option<String> {
        self.ctx.env.override_value(&self.env_var(key))
    }

    /// Env prefix of this node.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The identifier maps resolve against right now.
    pub fn current_identifier(&self) -> String {
        self.ctx.identifier.current()
    }

    /// Own keys, in order. Sequence nodes list their indices.
    pub fn keys(&self) -> Vec<String> {
        match &self.children {
            Children::Object(map) => map.keys().cloned().collect(),
            Children::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
        }
    }

    /// Own keys paired with their resolved values. Keys whose identifier map
    /// has no entry for the current identifier are skipped.
    pub fn entries(&self) -> Vec<(String, Resolved<'_>)> {
        self.keys()
            .into_iter()
            .filter_map(|key| {
                let value = self.get(&key)?;
                Some((key, value))
            })
            .collect()
    }

    /// Elements of a sequence node, or the values of a mapping node.
    pub fn values(&self) -> Vec<Resolved<'_>> {
        self.entries().into_iter().map(|(_, value)| value).collect()
    }

    pub fn is_array(&self) -> bool {
        matches!(self.children, Children::Array(_))
    }

    pub fn len(&self) -> usize {
        match &self.children {
            Children::Object(map) => map.len(),
            Children::Array(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the view as plain JSON.
    ///
    /// Lists own keys only, since env-only fields cannot be enumerated.
    /// The plugin handle is omitted.
    pub fn to_json(&self) -> Value {
        match &self.children {
            Children::Array(_) => Value::Array(
                self.keys()
                    .iter()
                    .map(|key| self.get(key).map(|value| value.to_json()).unwrap_or(Value::Null))
                    .collect(),
            ),
            Children::Object(_) => {
                let mut out = Map::new();
                for (key, value) in self.entries() {
                    if matches!(value, Resolved::Value(ConfigValue::Plugin(_))) {
                        continue;
                    }
                    out.insert(key, value.to_json());
                }
                Value::Object(out)
            }
        }
    }
}

/// The outcome of reading one field.
#[derive(Debug, Clone)]
pub enum Resolved<'a> {
    /// A leaf from the tree.
    Value(&'a ConfigValue),
    /// A nested mapping or sequence.
    Node(&'a ResolvedNode),
    /// An environment override.
    Env(String),
}

impl<'a> Resolved<'a> {
    pub fn as_node(&self) -> Option<&'a ResolvedNode> {
        match self {
            Resolved::Node(node) => Some(*node),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&'a ConfigValue> {
        match self {
            Resolved::Value(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Resolved::Value(value) => value.as_str(),
            Resolved::Env(value) => Some(value),
            Resolved::Node(_) => None,
        }
    }

    /// Booleans from the tree, or env strings such as `true`, `1`, `off`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Resolved::Value(ConfigValue::Bool(b)) => Some(*b),
            Resolved::Env(value) => parse_bool(value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Resolved::Value(ConfigValue::Number(n)) => n.as_i64(),
            Resolved::Env(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Resolved::Value(ConfigValue::Number(n)) => n.as_f64(),
            Resolved::Env(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_plugin(&self) -> Option<&'a PluginHandle> {
        match self {
            Resolved::Value(ConfigValue::Plugin(handle)) => Some(handle),
            _ => None,
        }
    }

    pub fn is_env(&self) -> bool {
        matches!(self, Resolved::Env(_))
    }

    /// Read a field of a nested node.
    pub fn get(&self, key: &str) -> Option<Resolved<'a>> {
        self.as_node()?.get(key)
    }

    pub fn to_json(&self) -> Value {
        match self {
            Resolved::Value(value) => value.to_json(),
            Resolved::Node(node) => node.to_json(),
            Resolved::Env(value) => Value::String(value.clone()),
        }
    }
}
