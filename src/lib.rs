//! Forge Config Library
//!
//! Loads a project's forge configuration and resolves it into a read-only
//! view with environment overrides and build-identifier lookups.

pub mod cli;
pub mod config;
pub mod error;
pub mod format;

pub use config::{ConfigLoader, ResolvedConfig, load_forge_config};
pub use error::{ConfigError, Result};
