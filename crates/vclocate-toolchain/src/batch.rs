//! The batch-script mechanism.
//!
//! A Visual C++ install ships `vcvarsall.bat`, which exports the compiler
//! environment when run. [`BatchScriptLookup`] finds that script through the
//! Visual Studio registry key or the `VS<NN>COMNTOOLS` variable, runs it
//! with the requested architecture and reads back the exported variables.
//! This is the lookup that [`ToolchainLocator`](crate::ToolchainLocator)
//! wraps and falls back from.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use crate::env::EnvGetter;
use crate::error::{Result, ToolchainError};
use crate::paths;
use crate::registry::Registry;
use crate::resolved::{EnvVar, ResolvedEnvironment};
use crate::version::CompilerVersion;

/// File name of the compiler environment script.
pub const VCVARSALL: &str = "vcvarsall.bat";

/// Locates the compiler environment script for a version.
pub trait FindVcvarsall: Send + Sync {
    /// `Ok(None)` when no script is installed.
    fn find_vcvarsall(&self, version: CompilerVersion) -> Result<Option<PathBuf>>;
}

/// Produces the compiler environment for a version and architecture.
pub trait QueryVcvarsall: Send + Sync {
    /// `finder` is the script locator currently in effect; implementations
    /// that run a script must locate it through `finder`.
    fn query_vcvarsall(
        &self,
        version: CompilerVersion,
        arch: &str,
        finder: &dyn FindVcvarsall,
    ) -> Result<ResolvedEnvironment>;
}

/// Captured result of running the script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Runs `vcvarsall.bat <arch>` followed by `set`.
pub trait BatchRunner: Send + Sync {
    fn run(&self, script: &Path, arch: &str) -> Result<BatchOutput>;
}

/// Runs the script through `cmd.exe`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CmdRunner;

impl BatchRunner for CmdRunner {
    fn run(&self, script: &Path, arch: &str) -> Result<BatchOutput> {
        let line = format!("\"{}\" {} & set", script.display(), arch);
        let mut cmd = Command::new("cmd");

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            cmd.raw_arg(format!("/c \"{line}\""));
        }
        #[cfg(not(windows))]
        {
            cmd.arg("/c").arg(&line);
        }

        let output = cmd.output()?;
        Ok(BatchOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// The stock script-based lookup.
pub struct BatchScriptLookup {
    registry: Arc<dyn Registry>,
    env: Arc<dyn EnvGetter>,
    runner: Arc<dyn BatchRunner>,
}

impl BatchScriptLookup {
    pub fn new(registry: Arc<dyn Registry>, env: Arc<dyn EnvGetter>) -> Self {
        Self::with_runner(registry, env, Arc::new(CmdRunner))
    }

    pub fn with_runner(
        registry: Arc<dyn Registry>,
        env: Arc<dyn EnvGetter>,
        runner: Arc<dyn BatchRunner>,
    ) -> Self {
        Self {
            registry,
            env,
            runner,
        }
    }

    /// Visual C++ product directory: the Visual Studio setup key first, then
    /// `VS<NN>COMNTOOLS\..\..\VC`.
    fn product_dir(&self, version: CompilerVersion) -> Option<PathBuf> {
        let key = format!(r"Software\Microsoft\VisualStudio\{version}\Setup\VC");
        let from_registry = match self.registry.get_value(&key, "productdir") {
            Ok(dir) => Some(PathBuf::from(dir)),
            Err(_) => {
                log::debug!("unable to find productdir in registry");
                None
            }
        };
        if let Some(dir) = from_registry.filter(|dir| dir.is_dir()) {
            return Some(dir);
        }

        let tools_key = format!("VS{:.0}0COMNTOOLS", version.value());
        match self.env.get_env(&tools_key) {
            Some(tools) if Path::new(&tools).is_dir() => {
                let dir = Path::new(&tools)
                    .parent()
                    .and_then(Path::parent)
                    .map(|base| base.join("VC"));
                match dir {
                    Some(dir) if dir.is_dir() => Some(dir),
                    other => {
                        log::debug!("{other:?} is not a valid directory");
                        None
                    }
                }
            }
            _ => {
                log::debug!("env var {tools_key} is not set or invalid");
                None
            }
        }
    }
}

impl FindVcvarsall for BatchScriptLookup {
    fn find_vcvarsall(&self, version: CompilerVersion) -> Result<Option<PathBuf>> {
        let Some(product_dir) = self.product_dir(version) else {
            log::debug!("no productdir found");
            return Ok(None);
        };
        let script = product_dir.join(VCVARSALL);
        if script.is_file() {
            Ok(Some(script))
        } else {
            log::debug!("unable to find {VCVARSALL} in {}", product_dir.display());
            Ok(None)
        }
    }
}

impl QueryVcvarsall for BatchScriptLookup {
    fn query_vcvarsall(
        &self,
        version: CompilerVersion,
        arch: &str,
        finder: &dyn FindVcvarsall,
    ) -> Result<ResolvedEnvironment> {
        let script = finder
            .find_vcvarsall(version)?
            .ok_or_else(|| ToolchainError::platform(format!("Unable to find {VCVARSALL}")))?;

        log::debug!("calling '{VCVARSALL} {arch}' (version={version})");
        let output = self.runner.run(&script, arch)?;
        if !output.success {
            return Err(ToolchainError::Platform(output.stderr));
        }
        parse_vcvarsall_output(&output.stdout)
    }
}

/// Extract `include`, `lib`, `libpath` and `path` from `set` output.
///
/// Fails with [`ToolchainError::ValueParse`] naming the variables that were
/// found when any of the four is missing.
pub fn parse_vcvarsall_output(stdout: &str) -> Result<ResolvedEnvironment> {
    let mut result = ResolvedEnvironment::new();
    for line in stdout.lines() {
        let line = line.trim();
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let Some(var) = EnvVar::from_name(key) else {
            continue;
        };
        let value = value.strip_suffix(paths::LIST_SEPARATOR).unwrap_or(value);
        result.insert(var, paths::dedup_list(value));
    }

    if !result.is_complete() {
        let found: Vec<&str> = result.iter().map(|(var, _)| var.name()).collect();
        return Err(ToolchainError::ValueParse(format!("{found:?}")));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::env::MapEnv;
    use crate::registry::{MemoryRegistry, NullRegistry};

    const SET_OUTPUT: &str = "\
COMSPEC=C:\\Windows\\system32\\cmd.exe\r
INCLUDE=C:\\VC\\INCLUDE;C:\\SDK\\include;C:\\VC\\INCLUDE;\r
LIB=C:\\VC\\LIB\\amd64;C:\\SDK\\lib\\x64;\r
LIBPATH=C:\\Windows\\Microsoft.NET\\Framework64\\v3.5;\r
Path=C:\\VC\\BIN\\amd64;C:\\Windows\\system32\r
";

    /// Records invocations and answers with canned output.
    #[derive(Default)]
    struct FakeRunner {
        output: BatchOutput,
        calls: Mutex<Vec<(PathBuf, String)>>,
    }

    impl BatchRunner for FakeRunner {
        fn run(&self, script: &Path, arch: &str) -> Result<BatchOutput> {
            self.calls
                .lock()
                .unwrap()
                .push((script.to_path_buf(), arch.to_string()));
            Ok(self.output.clone())
        }
    }

    struct FixedFinder(Option<PathBuf>);

    impl FindVcvarsall for FixedFinder {
        fn find_vcvarsall(&self, _: CompilerVersion) -> Result<Option<PathBuf>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn parse_full_output() {
        let env = parse_vcvarsall_output(SET_OUTPUT).unwrap();
        assert_eq!(env.get(EnvVar::Include), Some(r"C:\VC\INCLUDE;C:\SDK\include"));
        assert_eq!(env.get(EnvVar::Lib), Some(r"C:\VC\LIB\amd64;C:\SDK\lib\x64"));
        assert_eq!(
            env.get(EnvVar::Libpath),
            Some(r"C:\Windows\Microsoft.NET\Framework64\v3.5")
        );
        assert_eq!(env.get(EnvVar::Path), Some(r"C:\VC\BIN\amd64;C:\Windows\system32"));
    }

    #[test]
    fn parse_reports_missing_variables() {
        let err = parse_vcvarsall_output("INCLUDE=C:\\VC\\INCLUDE\nPATH=C:\\VC\\BIN\n")
            .unwrap_err();
        match err {
            ToolchainError::ValueParse(msg) => assert_eq!(msg, r#"["include", "path"]"#),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn find_via_registry_product_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(VCVARSALL), "@echo off\n").unwrap();
        let registry = MemoryRegistry::new().with(
            r"Software\Microsoft\VisualStudio\9.0\Setup\VC",
            "productdir",
            dir.path().to_string_lossy(),
        );
        let lookup = BatchScriptLookup::new(Arc::new(registry), Arc::new(MapEnv::new()));
        assert_eq!(
            lookup.find_vcvarsall(CompilerVersion::VC9).unwrap(),
            Some(dir.path().join(VCVARSALL))
        );
        assert_eq!(lookup.find_vcvarsall(CompilerVersion::VC10).unwrap(), None);
    }

    #[test]
    fn find_via_comntools() {
        let dir = tempfile::tempdir().unwrap();
        let tools = dir.path().join("Common7").join("Tools");
        let vc = dir.path().join("VC");
        std::fs::create_dir_all(&tools).unwrap();
        std::fs::create_dir_all(&vc).unwrap();
        std::fs::write(vc.join(VCVARSALL), "").unwrap();

        let env = MapEnv::from_pairs([("VS100COMNTOOLS", tools.to_string_lossy())]);
        let lookup = BatchScriptLookup::new(Arc::new(NullRegistry), Arc::new(env));
        assert_eq!(
            lookup.find_vcvarsall(CompilerVersion::VC10).unwrap(),
            Some(vc.join(VCVARSALL))
        );
        assert_eq!(lookup.find_vcvarsall(CompilerVersion::VC9).unwrap(), None);
    }

    #[test]
    fn query_without_script_is_platform_error() {
        let lookup = BatchScriptLookup::new(Arc::new(NullRegistry), Arc::new(MapEnv::new()));
        let err = lookup
            .query_vcvarsall(CompilerVersion::VC9, "x86", &lookup)
            .unwrap_err();
        assert!(matches!(err, ToolchainError::Platform(ref m) if m == "Unable to find vcvarsall.bat"));
    }

    #[test]
    fn query_runs_script_from_finder() {
        let runner = Arc::new(FakeRunner {
            output: BatchOutput {
                success: true,
                stdout: SET_OUTPUT.into(),
                stderr: String::new(),
            },
            ..Default::default()
        });
        let lookup = BatchScriptLookup::with_runner(
            Arc::new(NullRegistry),
            Arc::new(MapEnv::new()),
            runner.clone(),
        );
        let script = PathBuf::from(r"C:\VCForPython\vcvarsall.bat");
        let finder = FixedFinder(Some(script.clone()));

        let env = lookup
            .query_vcvarsall(CompilerVersion::VC9, "x86_amd64", &finder)
            .unwrap();
        assert!(env.is_complete());
        assert_eq!(
            runner.calls.lock().unwrap().as_slice(),
            &[(script, "x86_amd64".to_string())]
        );
    }

    #[test]
    fn query_failed_script_reports_stderr() {
        let runner = Arc::new(FakeRunner {
            output: BatchOutput {
                success: false,
                stdout: String::new(),
                stderr: "The input line is too long.".into(),
            },
            ..Default::default()
        });
        let lookup =
            BatchScriptLookup::with_runner(Arc::new(NullRegistry), Arc::new(MapEnv::new()), runner);
        let finder = FixedFinder(Some(PathBuf::from("vcvarsall.bat")));
        let err = lookup
            .query_vcvarsall(CompilerVersion::VC9, "x86", &finder)
            .unwrap_err();
        assert_eq!(err.to_string(), "The input line is too long.");
    }
}
