//! Forge config loader.
//!
//! Runs the full pipeline for one project directory:
//!
//! 1. read the manifest
//! 2. locate the config: inline `config.forge`, a module it names, a default
//!    `forge.config.*` file, or an empty mapping
//! 3. fill in missing top-level sections and maker names
//! 4. render templates against the manifest plus `year`
//! 5. attach the plugin interface
//! 6. run the `resolveForgeConfig` mutating hook
//! 7. wrap the tree for env overrides and build-identifier lookups

use super::env::{EnvSource, ProcessEnv};
use super::hooks::{MutatingHooks, NoHooks, RESOLVE_FORGE_CONFIG};
use super::identifier::BuildIdentifier;
use super::manifest::{ManifestReader, PackageJsonReader, forge_section, sanitized_name};
use super::module::{FsModuleLoader, ModuleLoader, module_candidates};
use super::plugin::{
    PLUGIN_INTERFACE_KEY, PluginHandle, PluginInterfaceFactory, StaticPluginFactory,
};
use super::resolved::{
    BUILD_IDENTIFIER_KEY, ELECTRON_REBUILD_CONFIG_KEY, MAKERS_KEY, PACKAGER_CONFIG_KEY,
    PLUGINS_KEY, PUBLISHERS_KEY, ResolvedConfig,
};
use super::resolver::ConfigResolver;
use super::template::{TemplateContext, TemplateRenderer};
use super::value::{ConfigMap, ConfigValue};
use crate::error::{ConfigError, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Root prefix of every override variable.
pub const ENV_PREFIX: &str = "ELECTRON_FORGE";

/// Config files looked for when the manifest names none.
pub const DEFAULT_CONFIG_FILES: &[&str] =
    &["forge.config.yaml", "forge.config.yml", "forge.config.json"];

const INVALID_SHAPE: &str =
    "Expected packageJSON.config.forge to be an object or point to a loadable config file";

/// Resolve a config value to the file it names, if it is a string naming
/// an existing file (exactly or with a known extension added).
pub async fn resolve_config_path(dir: &Path, forge_config: &Value) -> Option<PathBuf> {
    let name = forge_config.as_str()?;
    for candidate in module_candidates(&dir.join(name)) {
        if tokio::fs::metadata(&candidate)
            .await
            .is_ok_and(|meta| meta.is_file())
        {
            return Some(candidate);
        }
    }
    None
}

/// Whether a config value names a loadable file.
pub async fn is_valid_config_path(dir: &Path, forge_config: &Value) -> bool {
    resolve_config_path(dir, forge_config).await.is_some()
}

/// Seed `config.forge.makers[0].config.name` with the sanitized package
/// name, creating missing containers on the way.
pub fn set_initial_forge_config(manifest: &mut Value) -> Result<()> {
    let name = sanitized_name(manifest);

    let root = manifest
        .as_object_mut()
        .ok_or_else(|| ConfigError::invalid_shape("manifest must be an object"))?;
    let config = object_entry(root, "config")?;
    let forge = object_entry(config, "forge")?;
    let makers = forge
        .entry(MAKERS_KEY)
        .or_insert_with(|| Value::Array(Vec::new()));
    let makers = makers
        .as_array_mut()
        .ok_or_else(|| ConfigError::invalid_shape("config.forge.makers must be an array"))?;
    if makers.is_empty() {
        makers.push(Value::Object(serde_json::Map::new()));
    }
    let first = makers[0]
        .as_object_mut()
        .ok_or_else(|| ConfigError::invalid_shape("config.forge.makers[0] must be an object"))?;
    let maker_config = object_entry(first, "config")?;
    maker_config.insert("name".to_string(), Value::String(name));
    Ok(())
}

fn object_entry<'a>(
    map: &'a mut serde_json::Map<String, Value>,
    key: &str,
) -> Result<&'a mut serde_json::Map<String, Value>> {
    map.entry(key)
        .or_insert_with(|| Value::Object(serde_json::Map::new()))
        .as_object_mut()
        .ok_or_else(|| ConfigError::invalid_shape(format!("`{key}` must be an object")))
}

/// Fill in the top-level sections every consumer expects.
fn apply_defaults(config: &mut ConfigMap) {
    for (key, default) in [
        (ELECTRON_REBUILD_CONFIG_KEY, ConfigValue::object()),
        (PACKAGER_CONFIG_KEY, ConfigValue::object()),
        (MAKERS_KEY, ConfigValue::array()),
        (PUBLISHERS_KEY, ConfigValue::array()),
        (PLUGINS_KEY, ConfigValue::array()),
    ] {
        config.entry(key.to_string()).or_insert(default);
    }
}

/// Give every maker a `config.name` unless it already has one.
fn seed_maker_names(config: &mut ConfigMap, name: &str) {
    let Some(ConfigValue::Array(makers)) = config.get_mut(MAKERS_KEY) else {
        return;
    };
    for (index, maker) in makers.iter_mut().enumerate() {
        let Some(maker) = maker.as_object_mut() else {
            continue;
        };
        let maker_config = maker
            .entry("config".to_string())
            .or_insert_with(ConfigValue::object);
        match maker_config.as_object_mut() {
            Some(maker_config) => {
                maker_config
                    .entry("name".to_string())
                    .or_insert_with(|| ConfigValue::from(name));
            }
            None => warn!(index, "maker config is not a mapping, not seeding its name"),
        }
    }
}

/// Loads and resolves the forge config of one project.
#[derive(Clone)]
pub struct ConfigLoader {
    dir: PathBuf,
    manifest_reader: Arc<dyn ManifestReader>,
    modules: Arc<dyn ModuleLoader>,
    plugins: Arc<dyn PluginInterfaceFactory>,
    hooks: Arc<dyn MutatingHooks>,
    env: Arc<dyn EnvSource>,
    build_identifier: Option<BuildIdentifier>,
    year: Option<i32>,
}

impl ConfigLoader {
    /// Loader with the filesystem-backed collaborators.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            manifest_reader: Arc::new(PackageJsonReader),
            modules: Arc::new(FsModuleLoader),
            plugins: Arc::new(StaticPluginFactory),
            hooks: Arc::new(NoHooks),
            env: Arc::new(ProcessEnv),
            build_identifier: None,
            year: None,
        }
    }

    pub fn with_manifest_reader(mut self, reader: impl ManifestReader + 'static) -> Self {
        self.manifest_reader = Arc::new(reader);
        self
    }

    pub fn with_module_loader(mut self, modules: impl ModuleLoader + 'static) -> Self {
        self.modules = Arc::new(modules);
        self
    }

    pub fn with_plugin_factory(mut self, factory: impl PluginInterfaceFactory + 'static) -> Self {
        self.plugins = Arc::new(factory);
        self
    }

    pub fn with_hooks(mut self, hooks: impl MutatingHooks + 'static) -> Self {
        self.hooks = Arc::new(hooks);
        self
    }

    pub fn with_env(mut self, env: Arc<dyn EnvSource>) -> Self {
        self.env = env;
        self
    }

    /// Use this identifier instead of the config's `buildIdentifier` field.
    pub fn with_build_identifier(mut self, identifier: impl Into<BuildIdentifier>) -> Self {
        self.build_identifier = Some(identifier.into());
        self
    }

    /// Fix the `year` template field instead of using the current year.
    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run the whole pipeline.
    pub async fn load(&self) -> Result<ResolvedConfig> {
        let manifest = self
            .manifest_reader
            .read_manifest(&self.dir)
            .await
            .map_err(|source| ConfigError::Manifest {
                dir: self.dir.clone(),
                source,
            })?;
        if !manifest.is_object() {
            return Err(ConfigError::Manifest {
                dir: self.dir.clone(),
                source: anyhow::anyhow!("manifest is not an object"),
            });
        }

        let mut config = self.locate(&manifest).await?;
        apply_defaults(&mut config);
        seed_maker_names(&mut config, &sanitized_name(&manifest));
        let mut config = ConfigValue::Object(config);

        let context = match self.year {
            Some(year) => TemplateContext::from_manifest_with_year(&manifest, year),
            None => TemplateContext::from_manifest(&manifest),
        };
        TemplateRenderer::new(&self.dir, &context, self.modules.as_ref()).render(&mut config)?;
        debug!(dir = %self.dir.display(), "rendered config templates");

        let interface = self
            .plugins
            .create(&self.dir, &config)
            .map_err(ConfigError::PluginInterface)?;
        if let Some(map) = config.as_object_mut() {
            map.insert(
                PLUGIN_INTERFACE_KEY.to_string(),
                ConfigValue::Plugin(PluginHandle::new(interface)),
            );
        }

        let config = self
            .hooks
            .run_mutating_hook(RESOLVE_FORGE_CONFIG, config)
            .await
            .map_err(|source| ConfigError::Hook {
                hook: RESOLVE_FORGE_CONFIG.to_string(),
                source,
            })?;
        if !matches!(config, ConfigValue::Object(_)) {
            return Err(ConfigError::invalid_shape(format!(
                "{RESOLVE_FORGE_CONFIG} hook returned a {} instead of a mapping",
                config.kind()
            )));
        }

        let identifier = match &self.build_identifier {
            Some(identifier) => identifier.clone(),
            None => Self::declared_identifier(&config),
        };
        debug!(?identifier, "wrapping resolved config");

        let root = ConfigResolver::new(identifier)
            .with_env(Arc::clone(&self.env))
            .wrap(config, ENV_PREFIX);
        Ok(ResolvedConfig::new(root))
    }

    /// Find and load the raw config mapping.
    async fn locate(&self, manifest: &Value) -> Result<ConfigMap> {
        let forge_config = match forge_section(manifest) {
            Some(section) => section.clone(),
            None => self.default_config_file().await,
        };

        let config = if let Some(path) = resolve_config_path(&self.dir, &forge_config).await {
            debug!(path = %path.display(), "loading config module");
            self.modules.load_module(&path).map_err(|source| {
                error!(path = %path.display(), "Failed to load config module");
                ConfigError::LoadFailure { path, source }
            })?
        } else if forge_config.is_object() {
            ConfigValue::from(forge_config)
        } else {
            return Err(ConfigError::invalid_shape(INVALID_SHAPE));
        };

        match config {
            ConfigValue::Object(map) => Ok(map),
            other => Err(ConfigError::invalid_shape(format!(
                "config module must export a mapping, found a {}",
                other.kind()
            ))),
        }
    }

    /// The first default config file present, or an empty mapping.
    async fn default_config_file(&self) -> Value {
        for name in DEFAULT_CONFIG_FILES {
            if tokio::fs::metadata(self.dir.join(name))
                .await
                .is_ok_and(|meta| meta.is_file())
            {
                return Value::String((*name).to_string());
            }
        }
        Value::Object(serde_json::Map::new())
    }

    fn declared_identifier(config: &ConfigValue) -> BuildIdentifier {
        match config.get(BUILD_IDENTIFIER_KEY) {
            Some(ConfigValue::String(identifier)) => BuildIdentifier::fixed(identifier.clone()),
            None | Some(ConfigValue::Null) => BuildIdentifier::default(),
            Some(other) => {
                warn!(kind = other.kind(), "ignoring non-string buildIdentifier");
                BuildIdentifier::default()
            }
        }
    }
}

/// Load the forge config of `dir` with the default collaborators.
pub async fn load_forge_config(dir: impl Into<PathBuf>) -> Result<ResolvedConfig> {
    ConfigLoader::new(dir).load().await
}
