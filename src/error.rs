//! Errors produced while loading a forge config.
//!
//! Loading is one-shot and fail-closed: every failure reaches the caller and
//! nothing falls back to defaults.

use crate::config::template::TemplateError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The package manifest could not be read or is not a mapping.
    #[error("failed to read manifest in {}: {source}", dir.display())]
    Manifest {
        dir: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// The config module named by the manifest failed to load.
    #[error("failed to load {}: {source}", path.display())]
    LoadFailure {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// The config is neither a mapping nor a loadable path.
    #[error("{0}")]
    InvalidConfigShape(String),

    /// A string leaf holds a malformed template.
    #[error("template error in `{field}`: {source}")]
    Template {
        field: String,
        #[source]
        source: TemplateError,
    },

    /// A `require:` value names a module that cannot be loaded.
    #[error("cannot resolve module reference in `{field}` ({}): {source}", path.display())]
    ModuleReference {
        field: String,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// The plugin interface could not be constructed.
    #[error("failed to create plugin interface: {0}")]
    PluginInterface(#[source] anyhow::Error),

    /// A mutating hook failed.
    #[error("hook `{hook}` failed: {source}")]
    Hook {
        hook: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ConfigError {
    pub fn invalid_shape(message: impl Into<String>) -> Self {
        ConfigError::InvalidConfigShape(message.into())
    }
}

/// Result type for config loading.
pub type Result<T> = std::result::Result<T, ConfigError>;
