//! Integration tests for forge config loading.
//!
//! Each test builds a throwaway project directory and runs the full
//! pipeline: locate, default, render, hook, wrap.

use forge_config::config::{
    ConfigLoader, ConfigValue, EnvSource, FnHook, HookChain, MapEnv, PluginInterface,
    RESOLVE_FORGE_CONFIG, StaticManifest, StaticPluginInterface, from_build_identifier,
};
use forge_config::ConfigError;
use serde_json::json;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Helper to create a project directory with the given package.json.
fn project(manifest: serde_json::Value) -> TempDir {
    let temp = TempDir::new().expect("Failed to create temp dir");
    std::fs::write(
        temp.path().join("package.json"),
        serde_json::to_string_pretty(&manifest).unwrap(),
    )
    .unwrap();
    temp
}

/// Loader isolated from the process environment.
fn loader(dir: &Path, env: MapEnv) -> ConfigLoader {
    let env: Arc<dyn EnvSource> = Arc::new(env);
    ConfigLoader::new(dir).with_env(env).with_year(2026)
}

#[tokio::test]
async fn no_forge_section_yields_defaults() {
    let temp = project(json!({"name": "my-app"}));
    let config = loader(temp.path(), MapEnv::new()).load().await.unwrap();

    assert!(config.makers().is_empty());
    assert!(config.publishers().is_empty());
    assert!(config.plugins().is_empty());
    assert!(config.electron_rebuild_config().unwrap().is_empty());
    assert!(config.packager_config().unwrap().is_empty());
    assert!(config.plugin_interface().is_some());
    assert_eq!(config.build_identifier(), None);
}

#[tokio::test]
async fn maker_name_seeded_from_manifest() {
    let temp = project(json!({
        "name": "my-app",
        "config": {"forge": {"makers": [{"config": {}}]}}
    }));
    let config = loader(temp.path(), MapEnv::new()).load().await.unwrap();

    assert_eq!(
        config.get_path("makers.0.config.name").unwrap().as_str(),
        Some("my_app")
    );
}

#[tokio::test]
async fn missing_config_file_is_invalid_shape() {
    let temp = project(json!({
        "name": "my-app",
        "config": {"forge": "missing.config.js"}
    }));
    let rendered = Arc::new(Mutex::new(false));
    let seen = Arc::clone(&rendered);
    let hooks = FnHook::new(RESOLVE_FORGE_CONFIG, move |config| {
        *seen.lock().unwrap() = true;
        Ok(config)
    });

    let err = loader(temp.path(), MapEnv::new())
        .with_hooks(hooks)
        .load()
        .await
        .unwrap_err();

    assert!(matches!(err, ConfigError::InvalidConfigShape(_)), "got {err:?}");
    assert!(!*rendered.lock().unwrap());
}

#[tokio::test]
async fn non_object_config_is_invalid_shape() {
    let temp = project(json!({"name": "x", "config": {"forge": [1, 2]}}));
    let err = loader(temp.path(), MapEnv::new()).load().await.unwrap_err();
    assert!(matches!(err, ConfigError::InvalidConfigShape(_)));
}

#[tokio::test]
async fn named_config_module_is_loaded() {
    let temp = project(json!({"name": "my-app", "config": {"forge": "./forge.config"}}));
    std::fs::write(
        temp.path().join("forge.config.yaml"),
        r#"
packagerConfig:
  name: "<%= name %> (<%= year %>)"
  ignore: !regex '^/out'
makers:
  - name: zip
"#,
    )
    .unwrap();

    let config = loader(temp.path(), MapEnv::new()).load().await.unwrap();

    assert_eq!(
        config.get_path("packagerConfig.name").unwrap().as_str(),
        Some("my-app (2026)")
    );
    assert_eq!(
        config.get_path("packagerConfig.ignore").unwrap().as_value(),
        Some(&ConfigValue::Pattern("^/out".into()))
    );
    assert_eq!(
        config.get_path("makers.0.config.name").unwrap().as_str(),
        Some("my_app")
    );
}

#[tokio::test]
async fn default_config_file_is_discovered() {
    let temp = project(json!({"name": "my-app"}));
    std::fs::write(
        temp.path().join("forge.config.json"),
        r#"{"publishers": [{"name": "github"}]}"#,
    )
    .unwrap();

    let config = loader(temp.path(), MapEnv::new()).load().await.unwrap();
    assert_eq!(config.publishers().len(), 1);
}

#[tokio::test]
async fn broken_config_module_is_load_failure() {
    let temp = project(json!({"name": "my-app", "config": {"forge": "forge.config.yaml"}}));
    std::fs::write(temp.path().join("forge.config.yaml"), "makers: [unclosed").unwrap();

    let err = loader(temp.path(), MapEnv::new()).load().await.unwrap_err();
    match err {
        ConfigError::LoadFailure { path, .. } => {
            assert_eq!(path, temp.path().join("forge.config.yaml"));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn missing_manifest_is_manifest_error() {
    let temp = TempDir::new().unwrap();
    let err = loader(temp.path(), MapEnv::new()).load().await.unwrap_err();
    assert!(matches!(err, ConfigError::Manifest { .. }));
}

#[tokio::test]
async fn template_failure_aborts_load() {
    let temp = project(json!({
        "name": "my-app",
        "config": {"forge": {"packagerConfig": {"name": "<%= process.env.HOME %>"}}}
    }));
    let err = loader(temp.path(), MapEnv::new()).load().await.unwrap_err();
    match err {
        ConfigError::Template { field, .. } => assert_eq!(field, "packagerConfig.name"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn require_reference_loads_module() {
    let temp = project(json!({
        "name": "my-app",
        "config": {"forge": {"packagerConfig": {"osxSign": "require:./signing"}}}
    }));
    std::fs::write(
        temp.path().join("signing.json"),
        r#"{"identity": "Developer ID Application"}"#,
    )
    .unwrap();

    let config = loader(temp.path(), MapEnv::new()).load().await.unwrap();
    assert_eq!(
        config
            .get_path("packagerConfig.osxSign.identity")
            .unwrap()
            .as_str(),
        Some("Developer ID Application")
    );
}

#[tokio::test]
async fn missing_require_reference_aborts_load() {
    let temp = project(json!({
        "name": "my-app",
        "config": {"forge": {"packagerConfig": {"icon": "require:./nope"}}}
    }));
    let err = loader(temp.path(), MapEnv::new()).load().await.unwrap_err();
    assert!(matches!(err, ConfigError::ModuleReference { .. }));
}

#[tokio::test]
async fn env_overrides_missing_fields_only() {
    let temp = project(json!({
        "name": "my-app",
        "config": {"forge": {"packagerConfig": {"name": "Own Name"}}}
    }));
    let env = MapEnv::new()
        .with("ELECTRON_FORGE_PACKAGER_CONFIG_NAME", "Env Name")
        .with("ELECTRON_FORGE_PACKAGER_CONFIG_APP_BUNDLE_ID", "com.example.app");

    let config = loader(temp.path(), env).load().await.unwrap();
    let packager = config.packager_config().unwrap();

    assert_eq!(packager.get("name").unwrap().as_str(), Some("Own Name"));
    assert_eq!(
        packager.get("appBundleId").unwrap().as_str(),
        Some("com.example.app")
    );
    assert!(packager.has("appBundleId"));
}

#[tokio::test]
async fn build_identifier_from_config() {
    let temp = project(json!({
        "name": "my-app",
        "config": {"forge": "forge.config.yml"}
    }));
    std::fs::write(
        temp.path().join("forge.config.yml"),
        r#"
buildIdentifier: beta
packagerConfig:
  appBundleId: !from_build_identifier
    beta: com.example.beta
    prod: com.example.app
"#,
    )
    .unwrap();

    let config = loader(temp.path(), MapEnv::new()).load().await.unwrap();
    assert_eq!(config.build_identifier().as_deref(), Some("beta"));
    assert_eq!(
        config.get_path("packagerConfig.appBundleId").unwrap().as_str(),
        Some("com.example.beta")
    );

    let config = loader(temp.path(), MapEnv::new())
        .with_build_identifier("prod")
        .load()
        .await
        .unwrap();
    assert_eq!(
        config.get_path("packagerConfig.appBundleId").unwrap().as_str(),
        Some("com.example.app")
    );
}

#[tokio::test]
async fn hook_can_replace_config() {
    let temp = project(json!({"name": "my-app"}));
    let hooks = HookChain::new().with(FnHook::new(RESOLVE_FORGE_CONFIG, |config: ConfigValue| {
        let mut replacement = ConfigValue::object();
        let map = replacement.as_object_mut().unwrap();
        map.insert("outDir".into(), from_build_identifier([("", "out/default")]));
        if let Some(handle) = config.get("pluginInterface") {
            map.insert("pluginInterface".into(), handle.clone());
        }
        Ok(replacement)
    }));

    let config = loader(temp.path(), MapEnv::new())
        .with_hooks(hooks)
        .load()
        .await
        .unwrap();

    assert_eq!(config.get("outDir").unwrap().as_str(), Some("out/default"));
    assert!(config.packager_config().is_none());
    assert!(config.plugin_interface().is_some());
}

#[tokio::test]
async fn hook_failure_is_reported() {
    let temp = project(json!({"name": "my-app"}));
    let hooks = FnHook::new(RESOLVE_FORGE_CONFIG, |_| anyhow::bail!("hook exploded"));

    let err = loader(temp.path(), MapEnv::new())
        .with_hooks(hooks)
        .load()
        .await
        .unwrap_err();
    match err {
        ConfigError::Hook { hook, source } => {
            assert_eq!(hook, RESOLVE_FORGE_CONFIG);
            assert_eq!(source.to_string(), "hook exploded");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn plugin_factory_sees_rendered_config() {
    let temp = project(json!({
        "name": "my-app",
        "config": {"forge": {"plugins": [["<%= name %>-plugin", {}]]}}
    }));
    let factory = |dir: &Path, config: &ConfigValue| -> anyhow::Result<Arc<dyn PluginInterface>> {
        Ok(Arc::new(StaticPluginInterface::from_config(dir, config)))
    };

    let config = loader(temp.path(), MapEnv::new())
        .with_plugin_factory(factory)
        .load()
        .await
        .unwrap();
    let handle = config.plugin_interface().unwrap();
    assert_eq!(handle.interface().plugin_names(), vec!["my-app-plugin"]);
}

#[tokio::test]
async fn static_manifest_reader() {
    let temp = TempDir::new().unwrap();
    let config = loader(temp.path(), MapEnv::new())
        .with_manifest_reader(StaticManifest(json!({
            "name": "in-memory",
            "config": {"forge": {"makers": [{}]}}
        })))
        .load()
        .await
        .unwrap();

    assert_eq!(
        config.get_path("makers.0.config.name").unwrap().as_str(),
        Some("in_memory")
    );
}

#[tokio::test]
async fn resolved_config_snapshot_omits_plugin_handle() {
    let temp = project(json!({
        "name": "my-app",
        "config": {"forge": {"packagerConfig": {"asar": true}}}
    }));
    let config = loader(temp.path(), MapEnv::new()).load().await.unwrap();

    assert_eq!(
        config.to_json(),
        json!({
            "electronRebuildConfig": {},
            "packagerConfig": {"asar": true},
            "makers": [],
            "publishers": [],
            "plugins": []
        })
    );
}
