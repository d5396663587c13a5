//! `vclocate query` and `vclocate direct`: resolve and print the compiler environment.

use std::fmt::Write;

use anyhow::{Context, Result};
use vclocate_toolchain::paths::LIST_SEPARATOR;
use vclocate_toolchain::{CompilerVersion, ResolvedEnvironment, ToolchainLocator};

use super::Format;

/// Resolve through the batch script, falling back to direct resolution.
pub fn run(
    locator: &ToolchainLocator,
    version: CompilerVersion,
    arch: &str,
    format: Format,
) -> Result<()> {
    let env = locator
        .query(version, arch)
        .with_context(|| format!("resolving Visual C++ {version} for {arch}"))?;
    print!("{}", render(&env, format)?);
    Ok(())
}

/// Resolve from the registry and the filesystem only.
pub fn run_direct(
    locator: &ToolchainLocator,
    version: CompilerVersion,
    arch: &str,
    format: Format,
) -> Result<()> {
    let env = locator
        .direct()
        .resolve(version, arch)
        .with_context(|| format!("resolving Visual C++ {version} for {arch}"))?;
    print!("{}", render(&env, format)?);
    Ok(())
}

pub fn render(env: &ResolvedEnvironment, format: Format) -> Result<String> {
    let out = match format {
        Format::Human => {
            let mut out = String::new();
            for (var, value) in env.iter() {
                writeln!(out, "{}:", var.name().to_uppercase())?;
                for entry in value.split(LIST_SEPARATOR) {
                    writeln!(out, "  {entry}")?;
                }
            }
            out
        }
        Format::Json => env.to_json()? + "\n",
        Format::Cmd => env.to_cmd_script(),
    };
    Ok(out)
}
