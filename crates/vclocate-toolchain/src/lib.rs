//! Legacy Visual C++ toolchain discovery.
//!
//! Locates Visual C++ 9.0/10.0 together with the matching Windows SDK and
//! .NET Framework, and produces the `include`, `lib`, `libpath` and `path`
//! variables needed to run the compiler:
//!
//! - **Batch script:** find `vcvarsall.bat` (a Visual C++ for Python install
//!   first, then the regular Visual Studio locations) and run it.
//! - **Direct resolution:** when the script is missing or unusable, rebuild
//!   the variables from registry entries and default install paths.
//!
//! The registry and the process environment are reached through the
//! [`Registry`] and [`EnvGetter`] traits, so resolution can run against
//! fabricated state on any host.

pub mod batch;
pub mod config;
pub mod direct;
pub mod env;
pub mod error;
pub mod hooks;
pub mod locator;
pub mod paths;
pub mod platform;
pub mod registry;
pub mod resolved;
pub mod version;

pub use batch::{BatchScriptLookup, FindVcvarsall, QueryVcvarsall};
pub use config::Config;
pub use direct::{DirectResolver, ToolchainLayout};
pub use env::{EnvGetter, MapEnv, StdEnv};
pub use error::{RegistryError, Result, ToolchainError};
pub use hooks::{Patcher, VcvarsallHooks};
pub use locator::ToolchainLocator;
pub use platform::PlatformInfo;
pub use registry::{MemoryRegistry, NullRegistry, Registry};
pub use resolved::{EnvVar, ResolvedEnvironment};
pub use version::CompilerVersion;
