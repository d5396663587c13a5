//! The toolchain locator.
//!
//! [`ToolchainLocator`] wraps an original script lookup (see
//! [`VcvarsallHooks`]). It finds `vcvarsall.bat` in a Visual C++ for Python
//! install before asking the original, and when the original cannot produce
//! an environment it rebuilds one with the [`DirectResolver`].

use std::path::PathBuf;
use std::sync::Arc;

use crate::batch::{FindVcvarsall, QueryVcvarsall, VCVARSALL};
use crate::direct::DirectResolver;
use crate::env::EnvGetter;
use crate::error::{Result, ToolchainError};
use crate::hooks::VcvarsallHooks;
use crate::platform::PlatformInfo;
use crate::registry::Registry;
use crate::resolved::ResolvedEnvironment;
use crate::version::CompilerVersion;

/// Locates a legacy Visual C++ toolchain and produces its environment.
pub struct ToolchainLocator {
    registry: Arc<dyn Registry>,
    host_cpu: String,
    direct: DirectResolver,
    original: VcvarsallHooks,
}

impl ToolchainLocator {
    /// Create a locator over `original`, reading the host CPU from `env`.
    pub fn new(
        registry: Arc<dyn Registry>,
        env: Arc<dyn EnvGetter>,
        original: VcvarsallHooks,
    ) -> Result<Self> {
        let host_cpu = PlatformInfo::host_cpu(env.as_ref())?;
        Ok(Self::with_host_cpu(registry, env, host_cpu, original))
    }

    pub fn with_host_cpu(
        registry: Arc<dyn Registry>,
        env: Arc<dyn EnvGetter>,
        host_cpu: impl Into<String>,
        original: VcvarsallHooks,
    ) -> Self {
        let host_cpu = host_cpu.into().to_lowercase();
        Self {
            direct: DirectResolver::new(registry.clone(), env, host_cpu.clone()),
            registry,
            host_cpu,
            original,
        }
    }

    pub fn host_cpu(&self) -> &str {
        &self.host_cpu
    }

    pub fn platform(&self, arch: &str) -> PlatformInfo {
        PlatformInfo::new(arch, &self.host_cpu)
    }

    pub fn direct(&self) -> &DirectResolver {
        &self.direct
    }

    /// The lookup this locator falls back to.
    pub fn original(&self) -> &VcvarsallHooks {
        &self.original
    }

    /// Resolve the environment, finding scripts through this locator.
    pub fn query(&self, version: CompilerVersion, arch: &str) -> Result<ResolvedEnvironment> {
        self.query_vcvarsall(version, arch, self)
    }

    /// `installdir` of a Visual C++ for Python install: the per-user key,
    /// then the all-users key of a 64-bit system. Empty values are skipped.
    pub fn vc_for_python_dir(&self, version: CompilerVersion) -> Option<PathBuf> {
        let keys = [
            format!(r"Software\Microsoft\DevDiv\VCForPython\{version}"),
            format!(r"Software\Wow6432Node\Microsoft\DevDiv\VCForPython\{version}"),
        ];
        keys.iter().find_map(|key| match self.registry.get_value(key, "installdir") {
            Ok(dir) if dir.is_empty() => {
                log::debug!("empty installdir under {key}");
                None
            }
            Ok(dir) => Some(PathBuf::from(dir)),
            Err(e) => {
                log::debug!("{e}");
                None
            }
        })
    }
}

impl FindVcvarsall for ToolchainLocator {
    fn find_vcvarsall(&self, version: CompilerVersion) -> Result<Option<PathBuf>> {
        if let Some(product_dir) = self.vc_for_python_dir(version) {
            let script = product_dir.join(VCVARSALL);
            if script.is_file() {
                log::info!("using {}", script.display());
                return Ok(Some(script));
            }
            log::debug!("no {VCVARSALL} in {}", product_dir.display());
        }
        self.original.find.find_vcvarsall(version)
    }
}

impl QueryVcvarsall for ToolchainLocator {
    fn query_vcvarsall(
        &self,
        version: CompilerVersion,
        arch: &str,
        finder: &dyn FindVcvarsall,
    ) -> Result<ResolvedEnvironment> {
        let message = match self.original.query.query_vcvarsall(version, arch, finder) {
            Ok(env) => return Ok(env),
            Err(ToolchainError::Platform(msg) | ToolchainError::ValueParse(msg)) => msg,
            Err(e) => return Err(e),
        };
        log::debug!("{VCVARSALL} lookup failed ({message}), resolving directly");

        let message = match self.direct.resolve(version, arch) {
            Ok(env) => return Ok(env),
            Err(ToolchainError::Platform(msg)) => msg,
            Err(e) => return Err(e),
        };

        Err(ToolchainError::Platform(remediation_message(version, message)))
    }
}

/// Add install instructions to failures caused by a missing `vcvarsall.bat`.
///
/// Other messages are returned unchanged.
pub fn remediation_message(version: CompilerVersion, message: String) -> String {
    if message.is_empty() || !message.contains(VCVARSALL) {
        return message;
    }
    let mut message = format!("Microsoft Visual C++ {version} is required ({message}).");
    match version.major() {
        9 => message.push_str(" Get it from http://aka.ms/vcpython27"),
        10 => message.push_str(
            " Get it with \"Microsoft Windows SDK for Windows 7\": \
             www.microsoft.com/download/details.aspx?id=8279",
        ),
        _ => {}
    }
    message
}
