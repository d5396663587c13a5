//! Configuration and lookup capabilities shared by all commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use vclocate_toolchain::config::CONFIG_FILE;
use vclocate_toolchain::registry::system_registry;
use vclocate_toolchain::{
    CompilerVersion, Config, EnvGetter, PlatformInfo, Registry, StdEnv, ToolchainLocator,
    VcvarsallHooks,
};

pub struct Session {
    pub config: Config,
    /// Where `config` was read from.
    pub source: Option<PathBuf>,
    registry: Arc<dyn Registry>,
    env: Arc<dyn EnvGetter>,
}

impl Session {
    /// Load `explicit`, or the nearest `vclocate.toml` above `cwd`, over the
    /// system registry and process environment.
    pub fn load(explicit: Option<&Path>, cwd: &Path) -> Result<Self> {
        let (config, source) = match explicit {
            Some(path) => {
                let config = Config::load(path)
                    .with_context(|| format!("loading {}", path.display()))?;
                (config, Some(path.to_path_buf()))
            }
            None => match Config::find_and_load(cwd)? {
                Some((config, dir)) => (config, Some(dir.join(CONFIG_FILE))),
                None => {
                    log::debug!("no {CONFIG_FILE} above {}, using defaults", cwd.display());
                    (Config::default(), None)
                }
            },
        };
        if let Some(path) = &source {
            log::info!("using configuration from {}", path.display());
        }
        Ok(Self::new(config, source, system_registry(), Arc::new(StdEnv)))
    }

    pub fn new(
        config: Config,
        source: Option<PathBuf>,
        registry: Arc<dyn Registry>,
        env: Arc<dyn EnvGetter>,
    ) -> Self {
        let registry = config.registry_over(registry);
        let env = config.env_over(env);
        Self {
            config,
            source,
            registry,
            env,
        }
    }

    pub fn registry(&self) -> &dyn Registry {
        self.registry.as_ref()
    }

    pub fn env(&self) -> &dyn EnvGetter {
        self.env.as_ref()
    }

    /// The command-line version, else the configured one.
    pub fn version(&self, arg: Option<CompilerVersion>) -> CompilerVersion {
        arg.unwrap_or_else(|| self.config.version())
    }

    /// The command-line architecture, else the configured one.
    pub fn arch<'a>(&'a self, arg: Option<&'a str>) -> &'a str {
        arg.unwrap_or_else(|| self.config.arch())
    }

    pub fn host_cpu(&self) -> Result<String> {
        Ok(PlatformInfo::host_cpu(self.env())?)
    }

    /// A locator wrapping the stock batch-script lookup.
    pub fn locator(&self) -> Result<ToolchainLocator> {
        let original = VcvarsallHooks::batch_script(self.registry.clone(), self.env.clone());
        ToolchainLocator::new(self.registry.clone(), self.env.clone(), original)
            .context("cannot determine the host CPU")
    }
}
