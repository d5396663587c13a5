//! Process environment access.
//!
//! Lookups go through [`EnvGetter`] so that resolution can run against a
//! fabricated environment. Names are matched case-insensitively, as on
//! Windows.

use std::collections::BTreeMap;
use std::sync::Arc;

/// Read access to environment variables.
pub trait EnvGetter: Send + Sync {
    fn get_env(&self, name: &str) -> Option<String>;
}

/// The environment of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdEnv;

impl EnvGetter for StdEnv {
    fn get_env(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// An in-memory environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapEnv {
    vars: BTreeMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut env = Self::new();
        for (k, v) in pairs {
            env.set(k, v);
        }
        env
    }

    pub fn set(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.vars.insert(name.as_ref().to_lowercase(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl EnvGetter for MapEnv {
    fn get_env(&self, name: &str) -> Option<String> {
        self.vars.get(&name.to_lowercase()).cloned()
    }
}

/// Overrides consulted before a base environment.
pub struct LayeredEnv {
    overrides: MapEnv,
    base: Arc<dyn EnvGetter>,
}

impl LayeredEnv {
    pub fn new(overrides: MapEnv, base: Arc<dyn EnvGetter>) -> Self {
        Self { overrides, base }
    }
}

impl EnvGetter for LayeredEnv {
    fn get_env(&self, name: &str) -> Option<String> {
        self.overrides
            .get_env(name)
            .or_else(|| self.base.get_env(name))
    }
}
