//! Registry access.
//!
//! Every lookup is a `(key path, value name)` pair answered with a string or
//! [`RegistryError::NotFound`]. On Windows the system registry is read
//! through `winreg`; elsewhere [`NullRegistry`] answers NotFound for every
//! query, and [`MemoryRegistry`] serves as a fabricated registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::RegistryError;

/// Result type for registry lookups.
pub type RegResult<T> = std::result::Result<T, RegistryError>;

/// Read access to a hierarchical key/value registry.
pub trait Registry: Send + Sync {
    /// Read the string value `name` under `key`.
    fn get_value(&self, key: &str, name: &str) -> RegResult<String>;
}

fn not_found(key: &str, name: &str) -> RegistryError {
    RegistryError::NotFound {
        key: key.to_string(),
        name: name.to_string(),
    }
}

/// A registry with no keys.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRegistry;

impl Registry for NullRegistry {
    fn get_value(&self, key: &str, name: &str) -> RegResult<String> {
        Err(not_found(key, name))
    }
}

/// The Windows registry, searched across the predefined root keys in the
/// order `HKEY_USERS`, `HKEY_CURRENT_USER`, `HKEY_LOCAL_MACHINE`,
/// `HKEY_CLASSES_ROOT`.
#[cfg(windows)]
#[derive(Debug, Clone, Copy, Default)]
pub struct WindowsRegistry;

#[cfg(windows)]
impl Registry for WindowsRegistry {
    fn get_value(&self, key: &str, name: &str) -> RegResult<String> {
        use winreg::enums::{HKEY_CLASSES_ROOT, HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, HKEY_USERS};
        use winreg::RegKey;

        let roots = [
            HKEY_USERS,
            HKEY_CURRENT_USER,
            HKEY_LOCAL_MACHINE,
            HKEY_CLASSES_ROOT,
        ];
        for root in roots {
            let handle = match RegKey::predef(root).open_subkey(key) {
                Ok(handle) => handle,
                Err(_) => continue,
            };
            match handle.get_value::<String, _>(name) {
                Ok(value) => return Ok(value),
                Err(e) => log::debug!("registry {key}\\{name} unreadable under {root:?}: {e}"),
            }
        }
        Err(not_found(key, name))
    }
}

/// The registry of the running system.
#[cfg(windows)]
pub fn system_registry() -> Arc<dyn Registry> {
    Arc::new(WindowsRegistry)
}

/// The registry of the running system.
#[cfg(not(windows))]
pub fn system_registry() -> Arc<dyn Registry> {
    Arc::new(NullRegistry)
}

/// An in-memory registry. Key paths and value names are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryRegistry {
    values: BTreeMap<(String, String), String>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `key -> (name -> value)` tables, the shape used in
    /// configuration files.
    pub fn from_tables(tables: &BTreeMap<String, BTreeMap<String, String>>) -> Self {
        let mut registry = Self::new();
        for (key, values) in tables {
            for (name, value) in values {
                registry.insert(key, name, value.clone());
            }
        }
        registry
    }

    pub fn insert(&mut self, key: &str, name: &str, value: impl Into<String>) {
        self.values
            .insert((normalize_key(key), name.to_lowercase()), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, key: &str, name: &str, value: impl Into<String>) -> Self {
        self.insert(key, name, value);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn normalize_key(key: &str) -> String {
    key.trim_matches('\\').to_lowercase()
}

impl Registry for MemoryRegistry {
    fn get_value(&self, key: &str, name: &str) -> RegResult<String> {
        self.values
            .get(&(normalize_key(key), name.to_lowercase()))
            .cloned()
            .ok_or_else(|| not_found(key, name))
    }
}

/// Overrides consulted before a base registry.
pub struct LayeredRegistry {
    overrides: MemoryRegistry,
    base: Arc<dyn Registry>,
}

impl LayeredRegistry {
    pub fn new(overrides: MemoryRegistry, base: Arc<dyn Registry>) -> Self {
        Self { overrides, base }
    }
}

impl Registry for LayeredRegistry {
    fn get_value(&self, key: &str, name: &str) -> RegResult<String> {
        self.overrides
            .get_value(key, name)
            .or_else(|_| self.base.get_value(key, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VC_FOR_PYTHON: &str = r"Software\Microsoft\DevDiv\VCForPython\9.0";

    #[test]
    fn null_registry_never_finds() {
        let err = NullRegistry.get_value(VC_FOR_PYTHON, "installdir").unwrap_err();
        assert_eq!(
            err,
            RegistryError::NotFound {
                key: VC_FOR_PYTHON.into(),
                name: "installdir".into(),
            }
        );
    }

    #[test]
    fn memory_registry_lookup_ignores_case() {
        let reg = MemoryRegistry::new().with(VC_FOR_PYTHON, "InstallDir", r"C:\VC");
        assert_eq!(
            reg.get_value(&VC_FOR_PYTHON.to_uppercase(), "installdir").unwrap(),
            r"C:\VC"
        );
        assert!(reg.get_value(VC_FOR_PYTHON, "productdir").is_err());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn memory_registry_from_tables() {
        let mut tables = BTreeMap::new();
        tables.insert(
            VC_FOR_PYTHON.to_string(),
            BTreeMap::from([("installdir".to_string(), r"D:\VCForPython".to_string())]),
        );
        let reg = MemoryRegistry::from_tables(&tables);
        assert_eq!(
            reg.get_value(VC_FOR_PYTHON, "installdir").unwrap(),
            r"D:\VCForPython"
        );
    }

    #[test]
    fn layered_registry_falls_through() {
        let base = MemoryRegistry::new()
            .with(VC_FOR_PYTHON, "installdir", "base")
            .with(VC_FOR_PYTHON, "other", "base-other");
        let overrides = MemoryRegistry::new().with(VC_FOR_PYTHON, "installdir", "override");
        let reg = LayeredRegistry::new(overrides, Arc::new(base));
        assert_eq!(reg.get_value(VC_FOR_PYTHON, "installdir").unwrap(), "override");
        assert_eq!(reg.get_value(VC_FOR_PYTHON, "other").unwrap(), "base-other");
        assert!(reg.get_value(VC_FOR_PYTHON, "missing").is_err());
    }
}
