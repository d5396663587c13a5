//! Target/host CPU classification.
//!
//! Maps an architecture token (`"x86"`, `"amd64"`, `"x86_amd64"`, ...) and the
//! host CPU onto the directory suffixes used by the legacy Visual C++ and
//! Windows SDK layouts.

use serde::Serialize;

use crate::env::EnvGetter;
use crate::error::{Result, ToolchainError};

/// Environment variable naming the host CPU.
pub const HOST_CPU_VAR: &str = "processor_architecture";

/// Architecture information for one toolchain lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformInfo {
    /// Requested architecture token, `"target"` or `"host_target"`.
    pub arch: String,
    /// Lowercased host CPU name.
    pub current_cpu: String,
}

impl PlatformInfo {
    pub fn new(arch: impl Into<String>, current_cpu: impl AsRef<str>) -> Self {
        Self {
            arch: arch.into(),
            current_cpu: current_cpu.as_ref().to_lowercase(),
        }
    }

    /// Read the host CPU from `processor_architecture`.
    pub fn host_cpu(env: &dyn EnvGetter) -> Result<String> {
        env.get_env(HOST_CPU_VAR)
            .map(|cpu| cpu.to_lowercase())
            .ok_or_else(|| ToolchainError::MissingEnv {
                name: HOST_CPU_VAR.into(),
            })
    }

    /// CPU the toolchain generates code for.
    pub fn target_cpu(&self) -> &str {
        match self.arch.rsplit_once('_') {
            Some((_, target)) => target,
            None => &self.arch,
        }
    }

    pub fn target_is_x86(&self) -> bool {
        self.target_cpu() == "x86"
    }

    /// Note the polarity: this is `true` when the host is *not* x86.
    ///
    /// Registry node selection and the 64-bit framework tools depend on this
    /// exact behavior, so it is kept as is.
    pub fn current_is_x86(&self) -> bool {
        self.current_cpu != "x86"
    }

    /// Suffix of the Visual C++ library directories.
    pub fn lib_extra(&self) -> &'static str {
        match self.target_cpu() {
            "amd64" => r"\amd64",
            "ia64" => r"\ia64",
            _ => "",
        }
    }

    /// Suffix of the Windows SDK library and tool directories.
    pub fn sdk_extra(&self) -> &'static str {
        match self.target_cpu() {
            "amd64" => r"\x64",
            "ia64" => r"\ia64",
            _ => "",
        }
    }

    /// Suffix of the compiler `Bin` directory; cross compilers live under
    /// `x86_<target>`.
    pub fn tools_extra(&self) -> String {
        let path = self.lib_extra();
        if self.target_cpu() != self.current_cpu {
            path.replace('\\', r"\x86_")
        } else {
            path.to_string()
        }
    }
}
