//! The environment produced by a successful lookup.

use std::collections::BTreeMap;
use std::fmt;
use std::process::Command;

use serde::Serialize;

use crate::error::Result;

/// The variables a toolchain environment is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvVar {
    Include,
    Lib,
    Libpath,
    Path,
}

impl EnvVar {
    pub const ALL: [EnvVar; 4] = [EnvVar::Include, EnvVar::Lib, EnvVar::Libpath, EnvVar::Path];

    /// Lowercase variable name, as exported by the batch script.
    pub fn name(self) -> &'static str {
        match self {
            EnvVar::Include => "include",
            EnvVar::Lib => "lib",
            EnvVar::Libpath => "libpath",
            EnvVar::Path => "path",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|var| var.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for EnvVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Search-path variables for the compiler, each a `;`-joined list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedEnvironment {
    vars: BTreeMap<EnvVar, String>,
}

impl ResolvedEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, var: EnvVar, value: impl Into<String>) {
        self.vars.insert(var, value.into());
    }

    pub fn get(&self, var: EnvVar) -> Option<&str> {
        self.vars.get(&var).map(String::as_str)
    }

    /// Entries of one variable, in order.
    pub fn entries(&self, var: EnvVar) -> Vec<&str> {
        self.get(var)
            .map(|value| value.split(';').filter(|e| !e.is_empty()).collect())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EnvVar, &str)> {
        self.vars.iter().map(|(var, value)| (*var, value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Whether all four variables are present.
    pub fn is_complete(&self) -> bool {
        EnvVar::ALL.iter().all(|var| self.vars.contains_key(var))
    }

    /// Set the variables on a command about to invoke the compiler.
    pub fn apply(&self, cmd: &mut Command) {
        for (var, value) in self.iter() {
            cmd.env(var.name().to_uppercase(), value);
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// `set NAME=value` lines for a `cmd.exe` session.
    pub fn to_cmd_script(&self) -> String {
        self.iter()
            .map(|(var, value)| format!("set {}={}\n", var.name().to_uppercase(), value))
            .collect()
    }
}
