//! The lookup table a build tool resolves the compiler through, and the
//! one-time patch that routes it through a [`ToolchainLocator`].

use std::path::PathBuf;
use std::sync::Arc;

use crate::batch::{BatchScriptLookup, FindVcvarsall, QueryVcvarsall};
use crate::env::EnvGetter;
use crate::error::Result;
use crate::locator::ToolchainLocator;
use crate::registry::Registry;
use crate::resolved::ResolvedEnvironment;
use crate::version::CompilerVersion;

/// The pair of lookup functions a build tool calls.
#[derive(Clone)]
pub struct VcvarsallHooks {
    pub find: Arc<dyn FindVcvarsall>,
    pub query: Arc<dyn QueryVcvarsall>,
}

impl VcvarsallHooks {
    pub fn new(find: Arc<dyn FindVcvarsall>, query: Arc<dyn QueryVcvarsall>) -> Self {
        Self { find, query }
    }

    /// Install one object as both lookups.
    pub fn from_lookup<L>(lookup: Arc<L>) -> Self
    where
        L: FindVcvarsall + QueryVcvarsall + 'static,
    {
        Self {
            find: lookup.clone(),
            query: lookup,
        }
    }

    /// The stock batch-script lookup.
    pub fn batch_script(registry: Arc<dyn Registry>, env: Arc<dyn EnvGetter>) -> Self {
        Self::from_lookup(Arc::new(BatchScriptLookup::new(registry, env)))
    }

    pub fn find_vcvarsall(&self, version: CompilerVersion) -> Result<Option<PathBuf>> {
        self.find.find_vcvarsall(version)
    }

    /// Query through the table: the installed `query` locates scripts with
    /// the installed `find`.
    pub fn query_vcvarsall(
        &self,
        version: CompilerVersion,
        arch: &str,
    ) -> Result<ResolvedEnvironment> {
        self.query.query_vcvarsall(version, arch, self.find.as_ref())
    }

    /// Whether both entries are the very same objects as in `other`.
    pub fn same_as(&self, other: &VcvarsallHooks) -> bool {
        Arc::ptr_eq(&self.find, &other.find) && Arc::ptr_eq(&self.query, &other.query)
    }
}

impl std::fmt::Debug for VcvarsallHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VcvarsallHooks")
            .field("find", &Arc::as_ptr(&self.find))
            .field("query", &Arc::as_ptr(&self.query))
            .finish()
    }
}

/// Applies the locator to a hook table at most once.
pub struct Patcher {
    registry: Arc<dyn Registry>,
    env: Arc<dyn EnvGetter>,
    unpatched: Option<VcvarsallHooks>,
}

impl Patcher {
    pub fn new(registry: Arc<dyn Registry>, env: Arc<dyn EnvGetter>) -> Self {
        Self {
            registry,
            env,
            unpatched: None,
        }
    }

    /// Route `hooks` through a [`ToolchainLocator`] that falls back to the
    /// lookups currently installed.
    ///
    /// Returns `Ok(false)` without touching anything when there is no hook
    /// table (the build tool has no Visual C++ support on this platform) or
    /// when the originals were already saved by an earlier call.
    pub fn patch_for_specialized_compiler(
        &mut self,
        hooks: Option<&mut VcvarsallHooks>,
    ) -> Result<bool> {
        let Some(hooks) = hooks else {
            log::debug!("no compiler hooks to patch");
            return Ok(false);
        };
        if self.unpatched.is_some() {
            return Ok(false);
        }

        let original = hooks.clone();
        let locator = Arc::new(ToolchainLocator::new(
            self.registry.clone(),
            self.env.clone(),
            original.clone(),
        )?);
        *hooks = VcvarsallHooks::from_lookup(locator);
        self.unpatched = Some(original);
        log::debug!("compiler hooks patched");
        Ok(true)
    }

    /// The lookups that were installed before patching.
    pub fn unpatched(&self) -> Option<&VcvarsallHooks> {
        self.unpatched.as_ref()
    }

    pub fn is_patched(&self) -> bool {
        self.unpatched.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use crate::error::ToolchainError;
    use crate::registry::{MemoryRegistry, NullRegistry};

    fn patcher(registry: impl Registry + 'static) -> Patcher {
        Patcher::new(
            Arc::new(registry),
            Arc::new(MapEnv::from_pairs([("processor_architecture", "amd64")])),
        )
    }

    fn stock_hooks() -> VcvarsallHooks {
        VcvarsallHooks::batch_script(Arc::new(NullRegistry), Arc::new(MapEnv::new()))
    }

    #[test]
    fn missing_host_table_is_a_no_op() {
        let mut patcher = patcher(NullRegistry);
        assert!(!patcher.patch_for_specialized_compiler(None).unwrap());
        assert!(!patcher.is_patched());
        assert!(patcher.unpatched().is_none());
    }

    #[test]
    fn patch_saves_originals_and_replaces_both_hooks() {
        let mut patcher = patcher(NullRegistry);
        let mut hooks = stock_hooks();
        let before = hooks.clone();

        assert!(patcher.patch_for_specialized_compiler(Some(&mut hooks)).unwrap());
        assert!(patcher.unpatched().unwrap().same_as(&before));
        assert!(!Arc::ptr_eq(&hooks.find, &before.find));
        assert!(!Arc::ptr_eq(&hooks.query, &before.query));
    }

    #[test]
    fn second_patch_is_a_no_op() {
        let mut patcher = patcher(NullRegistry);
        let mut hooks = stock_hooks();

        assert!(patcher.patch_for_specialized_compiler(Some(&mut hooks)).unwrap());
        let saved = patcher.unpatched().unwrap().clone();
        let patched = hooks.clone();

        assert!(!patcher.patch_for_specialized_compiler(Some(&mut hooks)).unwrap());
        assert!(patcher.unpatched().unwrap().same_as(&saved));
        assert!(hooks.same_as(&patched));
    }

    #[test]
    fn patched_find_sees_vc_for_python() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("vcvarsall.bat"), "").unwrap();
        let registry = MemoryRegistry::new().with(
            r"Software\Microsoft\DevDiv\VCForPython\9.0",
            "installdir",
            dir.path().display().to_string(),
        );
        let mut patcher = patcher(registry);
        let mut hooks = stock_hooks();
        assert_eq!(hooks.find_vcvarsall(CompilerVersion::VC9).unwrap(), None);

        patcher.patch_for_specialized_compiler(Some(&mut hooks)).unwrap();
        assert_eq!(
            hooks.find_vcvarsall(CompilerVersion::VC9).unwrap(),
            Some(dir.path().join("vcvarsall.bat"))
        );
    }

    #[test]
    fn patched_query_reports_remediation() {
        let mut patcher = Patcher::new(
            Arc::new(NullRegistry),
            Arc::new(MapEnv::from_pairs([
                ("processor_architecture", "x86"),
                ("WinDir", "/nonexistent/windows"),
                ("ProgramFiles", "/nonexistent/pf"),
            ])),
        );
        let mut hooks = stock_hooks();
        patcher.patch_for_specialized_compiler(Some(&mut hooks)).unwrap();

        let err = hooks.query_vcvarsall(CompilerVersion::VC10, "x86").unwrap_err();
        match err {
            ToolchainError::Platform(msg) => {
                assert!(msg.starts_with("Microsoft Visual C++ 10.0 is required"), "{msg}");
                assert!(msg.contains("id=8279"), "{msg}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn patch_fails_without_host_cpu() {
        let mut patcher = Patcher::new(Arc::new(NullRegistry), Arc::new(MapEnv::new()));
        let mut hooks = stock_hooks();
        assert!(patcher.patch_for_specialized_compiler(Some(&mut hooks)).is_err());
        assert!(!patcher.is_patched());
    }
}
