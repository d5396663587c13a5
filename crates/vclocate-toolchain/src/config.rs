//! `vclocate.toml` configuration.
//!
//! ```toml
//! [toolchain]
//! version = 9.0
//! arch = "x86_amd64"
//!
//! [env]
//! ProgramFiles = 'C:\Program Files'
//!
//! [registry.'Software\Microsoft\DevDiv\VCForPython\9.0']
//! installdir = 'C:\VCForPython'
//! ```
//!
//! `[env]` and `[registry]` entries are consulted before the process
//! environment and the system registry.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::env::{EnvGetter, LayeredEnv, MapEnv};
use crate::error::{Result, ToolchainError};
use crate::registry::{LayeredRegistry, MemoryRegistry, Registry};
use crate::version::CompilerVersion;

/// File name searched for by [`Config::find_and_load`].
pub const CONFIG_FILE: &str = "vclocate.toml";

/// Architecture used when neither the command line nor the config names one.
pub const DEFAULT_ARCH: &str = "x86";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub toolchain: ToolchainConfig,
    /// Environment overrides.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Registry overrides, `key path -> (value name -> value)`.
    #[serde(default)]
    pub registry: BTreeMap<String, BTreeMap<String, String>>,
}

/// Defaults for the toolchain to look up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolchainConfig {
    #[serde(default)]
    pub version: Option<CompilerVersion>,
    #[serde(default)]
    pub arch: Option<String>,
}

impl Config {
    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ToolchainError::Config {
            path: path.to_path_buf(),
            detail: format!("reading: {e}"),
        })?;
        content.parse()
    }

    /// Search upward from `start_dir` for `vclocate.toml`, returning the
    /// config and the directory it was found in.
    pub fn find_and_load(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE);
            if candidate.is_file() {
                log::debug!("loading {}", candidate.display());
                let config = Self::load(&candidate)?;
                return Ok(Some((config, dir)));
            }
            if !dir.pop() {
                break;
            }
        }
        Ok(None)
    }

    pub fn version(&self) -> CompilerVersion {
        self.toolchain.version.unwrap_or(CompilerVersion::VC9)
    }

    pub fn arch(&self) -> &str {
        self.toolchain.arch.as_deref().unwrap_or(DEFAULT_ARCH)
    }

    /// `base` with the `[registry]` overrides on top.
    pub fn registry_over(&self, base: Arc<dyn Registry>) -> Arc<dyn Registry> {
        if self.registry.is_empty() {
            return base;
        }
        Arc::new(LayeredRegistry::new(
            MemoryRegistry::from_tables(&self.registry),
            base,
        ))
    }

    /// `base` with the `[env]` overrides on top.
    pub fn env_over(&self, base: Arc<dyn EnvGetter>) -> Arc<dyn EnvGetter> {
        if self.env.is_empty() {
            return base;
        }
        Arc::new(LayeredEnv::new(MapEnv::from_pairs(&self.env), base))
    }
}

impl std::str::FromStr for Config {
    type Err = ToolchainError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::NullRegistry;

    #[test]
    fn parse_full_config() {
        let config: Config = r#"
[toolchain]
version = 10.0
arch = "x86_amd64"

[env]
ProgramFiles = 'D:\Programs'

[registry.'Software\Microsoft\DevDiv\VCForPython\9.0']
installdir = 'D:\VCForPython'
"#
        .parse()
        .unwrap();
        assert_eq!(config.version(), CompilerVersion::VC10);
        assert_eq!(config.arch(), "x86_amd64");
        assert_eq!(config.env["ProgramFiles"], r"D:\Programs");

        let registry = config.registry_over(Arc::new(NullRegistry));
        assert_eq!(
            registry
                .get_value(r"Software\Microsoft\DevDiv\VCForPython\9.0", "installdir")
                .unwrap(),
            r"D:\VCForPython"
        );
        let env = config.env_over(Arc::new(MapEnv::new()));
        assert_eq!(env.get_env("programfiles").as_deref(), Some(r"D:\Programs"));
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = "".parse().unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.version(), CompilerVersion::VC9);
        assert_eq!(config.arch(), DEFAULT_ARCH);
    }

    #[test]
    fn integer_version_is_accepted() {
        let config: Config = "[toolchain]\nversion = 9\n".parse().unwrap();
        assert_eq!(config.version(), CompilerVersion::VC9);
    }

    #[test]
    fn reject_invalid_toml() {
        let err = "this is not valid toml [[[".parse::<Config>().unwrap_err();
        assert!(matches!(err, ToolchainError::Toml(_)));
    }

    #[test]
    fn find_and_load_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[toolchain]\narch = \"amd64\"\n",
        )
        .unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let (config, found) = Config::find_and_load(&nested).unwrap().unwrap();
        assert_eq!(config.arch(), "amd64");
        assert_eq!(found, dir.path());
    }

    #[test]
    fn load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join(CONFIG_FILE);
        let err = Config::load(&missing).unwrap_err();
        assert!(matches!(err, ToolchainError::Config { ref path, .. } if *path == missing));
    }
}
