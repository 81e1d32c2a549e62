//! Forge configuration resolution.
//!
//! A project's config is assembled from three layers:
//! 1. **Source** - inline `config.forge` in `package.json`, a config module it
//!    names, or a default `forge.config.{yaml,yml,json}` file
//! 2. **Templates** - string leaves rendered against the manifest, with
//!    `require:` values replaced by the module they name
//! 3. **Environment** - any field missing from the tree can be supplied by a
//!    variable named after its path
//!
//! ## Environment Variables
//! Variable names start with `ELECTRON_FORGE` and add one upper-snake-case
//! segment per level, e.g. `packagerConfig.appBundleId` is read from
//! `ELECTRON_FORGE_PACKAGER_CONFIG_APP_BUNDLE_ID`. Values present in the
//! tree always win; empty variables are ignored.
//!
//! ## Build Identifiers
//! A value built with [`from_build_identifier`] (or tagged
//! `!from_build_identifier` in YAML) resolves to the entry for the active
//! build identifier each time it is read.

pub mod env;
pub mod hooks;
pub mod identifier;
pub mod loader;
pub mod mangle;
pub mod manifest;
pub mod module;
pub mod plugin;
pub mod resolved;
pub mod resolver;
pub mod template;
pub mod value;

pub use env::{EnvSource, MapEnv, ProcessEnv};
pub use hooks::{FnHook, HookChain, MutatingHooks, NoHooks, RESOLVE_FORGE_CONFIG};
pub use identifier::{BuildIdentifier, BuildIdentifierMap, from_build_identifier};
pub use loader::{
    ConfigLoader, ENV_PREFIX, is_valid_config_path, load_forge_config, set_initial_forge_config,
};
pub use mangle::{env_var_for_path, mangle};
pub use manifest::{ManifestReader, PackageJsonReader, StaticManifest};
pub use module::{FsModuleLoader, ModuleLoader};
pub use plugin::{
    PluginHandle, PluginInterface, PluginInterfaceFactory, StaticPluginFactory,
    StaticPluginInterface,
};
pub use resolved::ResolvedConfig;
pub use resolver::{ConfigResolver, FieldSource, Resolved, ResolvedNode, wrap};
pub use template::{TemplateContext, TemplateRenderer, render};
pub use value::{ConfigMap, ConfigValue};
