//! Template rendering for string leaves of a config tree.
//!
//! Templates interpolate fields of the package manifest plus `year`:
//!
//! - `<%= author.name %>` and `${author.name}` insert the value as is
//! - `<%- description %>` inserts the value HTML-escaped
//!
//! Expressions are dotted field paths only (`keywords.0` indexes sequences).
//! Evaluate blocks (`<% ... %>`) and any other expression are rejected, so a
//! config file cannot run code through its templates.
//!
//! After rendering, a string starting with `require:` is replaced by the
//! value of the module it names, resolved against the project directory.

use super::identifier::BuildIdentifierMap;
use super::module::ModuleLoader;
use super::value::ConfigValue;
use crate::error::{ConfigError, Result};
use chrono::Datelike;
use regex_lite::{Captures, Regex};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

/// Prefix marking a rendered string as a module reference.
pub const REQUIRE_PREFIX: &str = "require:";

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<%([=-]?)(.*?)%>|\$\{([^}]*)\}").expect("static regex")
});

static FIELD_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*(\.[A-Za-z0-9_$]+)*$").expect("static regex")
});

/// Why a single template failed to render.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unterminated template tag")]
    Unterminated,

    #[error("evaluate blocks are not supported: <%{0}%>")]
    EvaluateBlock(String),

    #[error("invalid template expression `{0}`")]
    InvalidExpression(String),

    #[error("`{0}` is not defined")]
    UnknownIdentifier(String),
}

/// Values visible to template expressions.
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    fields: Map<String, Value>,
}

impl TemplateContext {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Manifest fields plus `year` set to the current calendar year.
    pub fn from_manifest(manifest: &Value) -> Self {
        Self::from_manifest_with_year(manifest, chrono::Local::now().year())
    }

    pub fn from_manifest_with_year(manifest: &Value, year: i32) -> Self {
        let mut fields = manifest.as_object().cloned().unwrap_or_default();
        fields.insert("year".to_string(), Value::from(year));
        Self { fields }
    }

    /// Resolve a dotted path. Unknown roots are errors, missing nested
    /// fields resolve to `None`.
    pub fn lookup(&self, path: &str) -> std::result::Result<Option<&Value>, TemplateError> {
        let mut segments = path.split('.');
        let root = segments.next().unwrap_or_default();
        let mut current = self
            .fields
            .get(root)
            .ok_or_else(|| TemplateError::UnknownIdentifier(root.to_string()))?;

        for segment in segments {
            let next = match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            match next {
                Some(value) => current = value,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Render one template string.
    pub fn render_str(&self, template: &str) -> std::result::Result<String, TemplateError> {
        let mut out = String::with_capacity(template.len());
        let mut last = 0;

        for caps in TAG.captures_iter(template) {
            let Some(whole) = caps.get(0) else { continue };
            push_literal(&mut out, &template[last..whole.start()])?;
            out.push_str(&self.evaluate(&caps)?);
            last = whole.end();
        }
        push_literal(&mut out, &template[last..])?;
        Ok(out)
    }

    fn evaluate(&self, caps: &Captures<'_>) -> std::result::Result<String, TemplateError> {
        let (expr, escape) = match (caps.get(1), caps.get(2), caps.get(3)) {
            (_, _, Some(es)) => (es.as_str(), false),
            (Some(kind), Some(expr), None) => match kind.as_str() {
                "=" => (expr.as_str(), false),
                "-" => (expr.as_str(), true),
                _ => return Err(TemplateError::EvaluateBlock(expr.as_str().to_string())),
            },
            _ => return Err(TemplateError::Unterminated),
        };

        let expr = expr.trim();
        if !FIELD_PATH.is_match(expr) {
            return Err(TemplateError::InvalidExpression(expr.to_string()));
        }

        let text = match self.lookup(expr)? {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        Ok(if escape { escape_html(&text) } else { text })
    }
}

fn push_literal(out: &mut String, literal: &str) -> std::result::Result<(), TemplateError> {
    if literal.contains("<%") {
        return Err(TemplateError::Unterminated);
    }
    out.push_str(literal);
    Ok(())
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Renders every string leaf of a config tree in place.
pub struct TemplateRenderer<'a> {
    dir: &'a Path,
    context: &'a TemplateContext,
    modules: &'a dyn ModuleLoader,
}

impl<'a> TemplateRenderer<'a> {
    pub fn new(dir: &'a Path, context: &'a TemplateContext, modules: &'a dyn ModuleLoader) -> Self {
        Self {
            dir,
            context,
            modules,
        }
    }

    /// Render the whole tree. The first failure aborts the pass.
    pub fn render(&self, root: &mut ConfigValue) -> Result<()> {
        let mut path = Vec::new();
        self.render_at(root, &mut path)
    }

    fn render_at(&self, value: &mut ConfigValue, path: &mut Vec<String>) -> Result<()> {
        match value {
            ConfigValue::Object(map) => {
                for (key, child) in map.iter_mut() {
                    path.push(key.clone());
                    self.render_at(child, path)?;
                    path.pop();
                }
            }
            ConfigValue::Array(items) => {
                for (index, child) in items.iter_mut().enumerate() {
                    path.push(index.to_string());
                    self.render_at(child, path)?;
                    path.pop();
                }
            }
            ConfigValue::IdentifierMap(map) => {
                let mut entries = std::mem::take(map).into_entries();
                for (identifier, child) in entries.iter_mut() {
                    path.push(identifier.clone());
                    self.render_at(child, path)?;
                    path.pop();
                }
                *map = BuildIdentifierMap::new(entries);
            }
            ConfigValue::String(template) => {
                let rendered =
                    self.context
                        .render_str(template)
                        .map_err(|source| ConfigError::Template {
                            field: path.join("."),
                            source,
                        })?;
                *value = match rendered.strip_prefix(REQUIRE_PREFIX) {
                    Some(reference) => {
                        let target = self.dir.join(reference);
                        self.modules.load_module(&target).map_err(|source| {
                            ConfigError::ModuleReference {
                                field: path.join("."),
                                path: target,
                                source,
                            }
                        })?
                    }
                    None => ConfigValue::String(rendered),
                };
            }
            ConfigValue::Null
            | ConfigValue::Bool(_)
            | ConfigValue::Number(_)
            | ConfigValue::Pattern(_)
            | ConfigValue::Plugin(_) => {}
        }
        Ok(())
    }
}

/// Render `root` against `context`, resolving module references from `dir`.
pub fn render(
    dir: &Path,
    context: &TemplateContext,
    modules: &dyn ModuleLoader,
    root: &mut ConfigValue,
) -> Result<()> {
    TemplateRenderer::new(dir, context, modules).render(root)
}
