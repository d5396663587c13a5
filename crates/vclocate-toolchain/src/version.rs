//! Compiler version numbers and the per-version tables keyed on them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A Visual C++ compiler version such as `9.0` or `10.0`.
///
/// Versions are compared exactly; registry keys and default install paths
/// always use the one-decimal rendering produced by [`fmt::Display`].
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompilerVersion(f64);

impl CompilerVersion {
    /// Visual C++ 2005.
    pub const VC8: CompilerVersion = CompilerVersion(8.0);
    /// Visual C++ 2008, the compiler for Python 2.7.
    pub const VC9: CompilerVersion = CompilerVersion(9.0);
    /// Visual C++ 2010, the compiler for Python 3.3 and 3.4.
    pub const VC10: CompilerVersion = CompilerVersion(10.0);

    pub fn new(version: f64) -> Self {
        CompilerVersion(version)
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Integral part of the version, truncated toward zero.
    pub fn major(self) -> i64 {
        self.0.trunc() as i64
    }

    /// Windows SDK versions to probe, in priority order.
    ///
    /// Unrecognized compiler versions have no candidates.
    pub fn sdk_versions(self) -> &'static [&'static str] {
        if self == Self::VC9 {
            &["7.0", "6.1", "6.0a"]
        } else if self == Self::VC10 {
            &["7.1", "7.0a"]
        } else {
            &[]
        }
    }

    /// .NET Framework versions shipped alongside the compiler.
    ///
    /// `v4_override` is the `frameworkver32` registry value for 10.0; it is
    /// only honored when it names a v4 framework.
    pub fn framework_versions(self, v4_override: Option<&str>) -> Vec<String> {
        if self == Self::VC10 {
            let v4 = match v4_override {
                Some(v) if v.to_lowercase().starts_with("v4") => v.to_string(),
                Some(v) => {
                    log::debug!("ignoring framework version {v:?}: not a v4 framework");
                    DEFAULT_FRAMEWORK_V4.to_string()
                }
                None => DEFAULT_FRAMEWORK_V4.to_string(),
            };
            vec![v4, "v3.5".into()]
        } else if self == Self::VC9 {
            vec!["v3.5".into(), "v2.0.50727".into()]
        } else if self == Self::VC8 {
            vec!["v3.0".into(), "v2.0.50727".into()]
        } else {
            Vec::new()
        }
    }
}

/// Last v4 framework release, used when the registry does not name one.
pub const DEFAULT_FRAMEWORK_V4: &str = "v4.0.30319";

impl fmt::Display for CompilerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

impl From<f64> for CompilerVersion {
    fn from(version: f64) -> Self {
        CompilerVersion(version)
    }
}

impl FromStr for CompilerVersion {
    type Err = std::num::ParseFloatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<f64>().map(CompilerVersion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_one_decimal() {
        assert_eq!(CompilerVersion::new(9.0).to_string(), "9.0");
        assert_eq!(CompilerVersion::new(10.0).to_string(), "10.0");
        assert_eq!(CompilerVersion::new(14.0).to_string(), "14.0");
    }

    #[test]
    fn parse_and_major() {
        let v: CompilerVersion = "10".parse().unwrap();
        assert_eq!(v, CompilerVersion::VC10);
        assert_eq!(v.major(), 10);
        assert_eq!(CompilerVersion::new(9.5).major(), 9);
        assert!("ten".parse::<CompilerVersion>().is_err());
    }

    #[test]
    fn sdk_candidates_per_version() {
        assert_eq!(CompilerVersion::VC9.sdk_versions(), &["7.0", "6.1", "6.0a"]);
        assert_eq!(CompilerVersion::VC10.sdk_versions(), &["7.1", "7.0a"]);
        assert!(CompilerVersion::new(11.0).sdk_versions().is_empty());
    }

    #[test]
    fn framework_versions_per_compiler() {
        assert_eq!(
            CompilerVersion::VC9.framework_versions(None),
            vec!["v3.5", "v2.0.50727"]
        );
        assert_eq!(
            CompilerVersion::VC8.framework_versions(None),
            vec!["v3.0", "v2.0.50727"]
        );
        assert!(CompilerVersion::new(11.0).framework_versions(None).is_empty());
    }

    #[test]
    fn v4_override_must_name_v4() {
        assert_eq!(
            CompilerVersion::VC10.framework_versions(Some("V4.0.99999")),
            vec!["V4.0.99999", "v3.5"]
        );
        assert_eq!(
            CompilerVersion::VC10.framework_versions(Some("v3.5")),
            vec![DEFAULT_FRAMEWORK_V4, "v3.5"]
        );
        // The override only applies to 10.0.
        assert_eq!(
            CompilerVersion::VC9.framework_versions(Some("v4.5")),
            vec!["v3.5", "v2.0.50727"]
        );
    }
}
