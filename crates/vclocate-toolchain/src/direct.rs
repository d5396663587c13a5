//! Direct resolution: rebuild the compiler environment without running
//! `vcvarsall.bat`.
//!
//! Resolution happens in two passes. [`DirectResolver::layout`] finds the
//! install roots (Visual Studio, Visual C++, Windows SDK, .NET Framework),
//! each from the registry, then the Visual C++ for Python install, then a
//! default location. [`ToolchainLayout::candidates`] expands the roots into
//! the ordered directory list of every variable, and
//! [`DirectResolver::resolve`] keeps the directories that exist.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::env::EnvGetter;
use crate::error::{Result, ToolchainError};
use crate::paths;
use crate::platform::PlatformInfo;
use crate::registry::Registry;
use crate::resolved::{EnvVar, ResolvedEnvironment};
use crate::version::CompilerVersion;

/// Registry key paths for one version, under the node selected by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryKeys {
    pub vs: String,
    pub vc: String,
    pub vc_for_python: String,
    pub windows_sdk: String,
}

impl RegistryKeys {
    pub fn new(version: CompilerVersion, pi: &PlatformInfo) -> Self {
        // Selected on the inverted host check: the 32-bit view is used when
        // the host *is* x86.
        let node = if !pi.current_is_x86() { r"\Wow6432Node" } else { "" };
        Self {
            vs: format!(r"Software{node}\Microsoft\VisualStudio\SxS\VS7"),
            vc: format!(r"Software{node}\Microsoft\VisualStudio\SxS\VC7"),
            vc_for_python: format!(r"Software{node}\Microsoft\DevDiv\VCForPython\{version}"),
            windows_sdk: format!(r"Software{node}\Microsoft\Microsoft SDKs\Windows"),
        }
    }
}

/// Install roots of a toolchain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolchainLayout {
    pub version: CompilerVersion,
    pub vs_install_dir: PathBuf,
    pub vc_install_dir: PathBuf,
    pub windows_sdk_dir: PathBuf,
    pub framework_dir32: PathBuf,
    pub framework_dir64: PathBuf,
    pub framework_versions: Vec<String>,
}

impl ToolchainLayout {
    /// Candidate directories of every variable, in precedence order.
    ///
    /// Candidates may not exist and may repeat.
    pub fn candidates(&self, pi: &PlatformInfo) -> BTreeMap<EnvVar, Vec<PathBuf>> {
        let vs = &self.vs_install_dir;
        let vc = &self.vc_install_dir;
        let sdk = &self.windows_sdk_dir;
        let tools_extra = pi.tools_extra();

        let vs_tools = vec![paths::join(vs, r"Common7\IDE"), paths::join(vs, r"Common7\Tools")];

        let vc_includes = vec![paths::join(vc, "Include")];

        let vc_libraries = vec![
            paths::join(vc, &format!("Lib{}", pi.lib_extra())),
            paths::join(vc, &format!(r"ATLMFC\LIB{}", pi.lib_extra())),
        ];

        let mut vc_tools = vec![
            paths::join(vc, "VCPackages"),
            paths::join(vc, &format!("Bin{tools_extra}")),
        ];
        if !tools_extra.is_empty() {
            vc_tools.push(paths::join(vc, "Bin"));
        }

        let os_libraries = vec![paths::join(sdk, &format!("Lib{}", pi.sdk_extra()))];

        let os_includes = vec![paths::join(sdk, "Include"), paths::join(sdk, r"Include\gl")];

        let mut sdk_tools = vec![paths::join(sdk, "Bin")];
        if !pi.target_is_x86() {
            sdk_tools.push(paths::join(sdk, &format!("Bin{}", pi.sdk_extra())));
        }
        if self.version == CompilerVersion::VC10 {
            sdk_tools.push(paths::join(
                sdk,
                &format!(r"Bin\NETFX 4.0 Tools{}", pi.sdk_extra()),
            ));
        }

        let sdk_setup = vec![paths::join(sdk, "Setup")];

        let mut fx_tools: Vec<PathBuf> = self
            .framework_versions
            .iter()
            .map(|ver| self.framework_dir32.join(ver))
            .collect();
        if !pi.target_is_x86() && !pi.current_is_x86() {
            fx_tools.extend(
                self.framework_versions
                    .iter()
                    .map(|ver| self.framework_dir64.join(ver)),
            );
        }

        let vs_tdb = vec![paths::join(vs, r"VSTSDB\Deploy")];

        let groups = |parts: &[&Vec<PathBuf>]| -> Vec<PathBuf> {
            parts.iter().flat_map(|group| group.iter().cloned()).collect()
        };

        BTreeMap::from([
            (EnvVar::Include, groups(&[&vc_includes, &os_includes])),
            (EnvVar::Lib, groups(&[&vc_libraries, &os_libraries, &fx_tools])),
            (EnvVar::Libpath, groups(&[&vc_libraries, &fx_tools])),
            (
                EnvVar::Path,
                groups(&[&vc_tools, &vs_tools, &vs_tdb, &sdk_tools, &sdk_setup, &fx_tools]),
            ),
        ])
    }
}

/// Resolver that reads the registry, the environment and the filesystem.
pub struct DirectResolver {
    registry: Arc<dyn Registry>,
    env: Arc<dyn EnvGetter>,
    host_cpu: String,
}

impl DirectResolver {
    pub fn new(
        registry: Arc<dyn Registry>,
        env: Arc<dyn EnvGetter>,
        host_cpu: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            env,
            host_cpu: host_cpu.into(),
        }
    }

    pub fn platform(&self, arch: &str) -> PlatformInfo {
        PlatformInfo::new(arch, &self.host_cpu)
    }

    /// Resolve the environment for `version` targeting `arch`.
    pub fn resolve(&self, version: CompilerVersion, arch: &str) -> Result<ResolvedEnvironment> {
        let pi = self.platform(arch);
        let layout = self.layout(version, &pi)?;
        let mut resolved = ResolvedEnvironment::new();
        for (var, candidates) in layout.candidates(&pi) {
            let value = self.assemble(var, candidates)?;
            resolved.insert(var, value);
        }
        Ok(resolved)
    }

    /// Keep existing, not yet seen directories, then append those of the
    /// current process value.
    fn assemble(&self, var: EnvVar, candidates: Vec<PathBuf>) -> Result<String> {
        let mut kept: Vec<PathBuf> = Vec::new();
        let mut check = |path: PathBuf| {
            if path.is_dir() && !kept.contains(&path) {
                kept.push(path);
            } else {
                log::trace!("{var}: skipping {}", path.display());
            }
        };

        for path in candidates {
            check(path);
        }
        if let Some(current) = self.env.get_env(var.name()) {
            for entry in current.split(paths::LIST_SEPARATOR).filter(|e| !e.is_empty()) {
                check(PathBuf::from(entry));
            }
        }

        if kept.is_empty() {
            return Err(ToolchainError::platform(format!(
                "{} environment variable is empty",
                var.name().to_uppercase()
            )));
        }
        let joined: Vec<String> = kept.iter().map(|p| p.display().to_string()).collect();
        Ok(joined.join(";"))
    }

    fn require_env(&self, name: &str) -> Result<PathBuf> {
        self.env
            .get_env(name)
            .map(PathBuf::from)
            .ok_or_else(|| ToolchainError::MissingEnv { name: name.into() })
    }

    /// A registry value, `None` when missing or empty.
    fn reg_value(&self, key: &str, name: &str) -> Option<String> {
        match self.registry.get_value(key, name) {
            Ok(value) if value.is_empty() => {
                log::debug!("empty registry value: {key}\\{name}");
                None
            }
            Ok(value) => Some(value),
            Err(e) => {
                log::debug!("{e}");
                None
            }
        }
    }

    /// Find the install roots of `version`.
    pub fn layout(&self, version: CompilerVersion, pi: &PlatformInfo) -> Result<ToolchainLayout> {
        let win_dir = self.require_env("WinDir")?;
        let program_files = self.require_env("ProgramFiles")?;
        let program_files_x86 = self
            .env
            .get_env("ProgramFiles(x86)")
            .map(PathBuf::from)
            .unwrap_or_else(|| program_files.clone());

        let keys = RegistryKeys::new(version, pi);
        let version_name = version.to_string();

        let vs_install_dir = match self.reg_value(&keys.vs, &version_name) {
            Some(dir) => PathBuf::from(dir),
            None => {
                let dir = program_files_x86.join(format!("Microsoft Visual Studio {version}"));
                log::debug!("using default Visual Studio directory {}", dir.display());
                dir
            }
        };

        let vc_install_dir = self.vc_install_dir(&keys, &version_name, version, &program_files_x86);
        if !vc_install_dir.is_dir() {
            return Err(ToolchainError::platform(
                "vcvarsall.bat and Visual C++ directory not found",
            ));
        }

        let windows_sdk_dir = self.windows_sdk_dir(&keys, version, &program_files, &vc_install_dir);

        let framework_dir32 = self
            .reg_value(&keys.vc, "frameworkdir32")
            .map(PathBuf::from)
            .unwrap_or_else(|| paths::join(&win_dir, r"Microsoft.NET\Framework"));
        let framework_dir64 = self
            .reg_value(&keys.vc, "frameworkdir64")
            .map(PathBuf::from)
            .unwrap_or_else(|| paths::join(&win_dir, r"Microsoft.NET\Framework64"));

        let v4_override = if version == CompilerVersion::VC10 {
            self.reg_value(&keys.vc, "frameworkver32")
        } else {
            None
        };
        let framework_versions = version.framework_versions(v4_override.as_deref());

        Ok(ToolchainLayout {
            version,
            vs_install_dir,
            vc_install_dir,
            windows_sdk_dir,
            framework_dir32,
            framework_dir64,
            framework_versions,
        })
    }

    fn vc_install_dir(
        &self,
        keys: &RegistryKeys,
        version_name: &str,
        version: CompilerVersion,
        program_files_x86: &Path,
    ) -> PathBuf {
        if let Some(dir) = self.reg_value(&keys.vc, version_name) {
            return PathBuf::from(dir);
        }
        if let Some(base) = self.reg_value(&keys.vc_for_python, "installdir") {
            return Path::new(&base).join("VC");
        }
        let dir = paths::join(
            program_files_x86,
            &format!(r"Microsoft Visual Studio {version}\VC"),
        );
        log::debug!("using default Visual C++ directory {}", dir.display());
        dir
    }

    fn windows_sdk_dir(
        &self,
        keys: &RegistryKeys,
        version: CompilerVersion,
        program_files: &Path,
        vc_install_dir: &Path,
    ) -> PathBuf {
        let sdk_versions = version.sdk_versions();

        let mut sdk_dir = sdk_versions.iter().find_map(|ver| {
            self.reg_value(&format!(r"{}\v{ver}", keys.windows_sdk), "installationfolder")
                .map(PathBuf::from)
        });

        if !sdk_dir.as_deref().is_some_and(Path::is_dir) {
            if let Some(base) = self.reg_value(&keys.vc_for_python, "installdir") {
                sdk_dir = Some(Path::new(&base).join("WinSDK"));
            }
        }

        if !sdk_dir.as_deref().is_some_and(Path::is_dir) {
            // The last existing default location wins.
            for ver in sdk_versions {
                let dir = paths::join(program_files, &format!(r"Microsoft SDKs\Windows\v{ver}"));
                if dir.is_dir() {
                    sdk_dir = Some(dir);
                }
            }
        }

        match sdk_dir {
            Some(dir) => dir,
            None => {
                log::debug!("no Windows SDK found, using PlatformSDK under Visual C++");
                vc_install_dir.join("PlatformSDK")
            }
        }
    }
}
