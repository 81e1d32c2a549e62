//! Mutating hooks.
//!
//! A hook receives the fully rendered config tree and returns the tree to
//! continue with, which may be an entirely new one. Hooks run after the
//! plugin interface is attached and before the tree is wrapped.

use super::value::ConfigValue;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Hook run once per load, just before resolution.
pub const RESOLVE_FORGE_CONFIG: &str = "resolveForgeConfig";

#[async_trait]
pub trait MutatingHooks: Send + Sync {
    /// Run every hook registered under `hook_name`, threading the config
    /// through them in order.
    async fn run_mutating_hook(&self, hook_name: &str, config: ConfigValue) -> Result<ConfigValue>;
}

/// No hooks: the config passes through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

#[async_trait]
impl MutatingHooks for NoHooks {
    async fn run_mutating_hook(&self, _hook_name: &str, config: ConfigValue) -> Result<ConfigValue> {
        Ok(config)
    }
}

/// Adapts a synchronous closure into a hook for one hook name.
pub struct FnHook<F> {
    name: String,
    f: F,
}

impl<F> FnHook<F>
where
    F: Fn(ConfigValue) -> Result<ConfigValue> + Send + Sync,
{
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

#[async_trait]
impl<F> MutatingHooks for FnHook<F>
where
    F: Fn(ConfigValue) -> Result<ConfigValue> + Send + Sync,
{
    async fn run_mutating_hook(&self, hook_name: &str, config: ConfigValue) -> Result<ConfigValue> {
        if hook_name == self.name {
            (self.f)(config)
        } else {
            Ok(config)
        }
    }
}

/// Runs hooks in registration order, each seeing the previous result.
#[derive(Clone, Default)]
pub struct HookChain {
    hooks: Vec<Arc<dyn MutatingHooks>>,
}

impl HookChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, hook: impl MutatingHooks + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    pub fn push(&mut self, hook: Arc<dyn MutatingHooks>) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

#[async_trait]
impl MutatingHooks for HookChain {
    async fn run_mutating_hook(&self, hook_name: &str, config: ConfigValue) -> Result<ConfigValue> {
        let mut config = config;
        for hook in &self.hooks {
            config = hook.run_mutating_hook(hook_name, config).await?;
        }
        Ok(config)
    }
}
