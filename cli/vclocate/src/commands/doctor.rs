//! `vclocate doctor`: host and toolchain diagnostics.

use std::fmt::Write;

use anyhow::Result;
use vclocate_toolchain::batch::VCVARSALL;
use vclocate_toolchain::platform::HOST_CPU_VAR;
use vclocate_toolchain::{CompilerVersion, FindVcvarsall, ToolchainLocator};

use crate::session::Session;

const ENV_VARS: &[&str] = &["WinDir", "ProgramFiles", "ProgramFiles(x86)"];

/// Print diagnostic information.
pub fn run(session: &Session) -> Result<()> {
    print!("{}", report(session)?);
    Ok(())
}

pub fn report(session: &Session) -> Result<String> {
    let mut out = String::new();
    writeln!(out, "=== vclocate doctor ===")?;
    writeln!(out)?;
    writeln!(out, "vclocate version: {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out)?;

    writeln!(out, "--- Configuration ---")?;
    match &session.source {
        Some(path) => writeln!(out, "  Config file:  {}", path.display())?,
        None => writeln!(out, "  Config file:  not found")?,
    }
    writeln!(out, "  Version:      {}", session.version(None))?;
    writeln!(out, "  Architecture: {}", session.arch(None))?;
    writeln!(out)?;

    writeln!(out, "--- Environment ---")?;
    for name in std::iter::once(HOST_CPU_VAR).chain(ENV_VARS.iter().copied()) {
        let value = session.env().get_env(name);
        writeln!(out, "  {name}: {}", value.as_deref().unwrap_or("not set"))?;
    }

    let locator = match session.locator() {
        Ok(locator) => locator,
        Err(e) => {
            writeln!(out)?;
            writeln!(out, "Toolchain checks skipped: {e:#}")?;
            return Ok(out);
        }
    };

    for version in [CompilerVersion::VC9, CompilerVersion::VC10] {
        writeln!(out)?;
        toolchain_section(&mut out, session, &locator, version)?;
    }
    Ok(out)
}

fn toolchain_section(
    out: &mut String,
    session: &Session,
    locator: &ToolchainLocator,
    version: CompilerVersion,
) -> Result<()> {
    writeln!(out, "--- Visual C++ {version} ---")?;

    match locator.vc_for_python_dir(version) {
        Some(dir) => writeln!(out, "  VC for Python:  {}", dir.display())?,
        None => writeln!(out, "  VC for Python:  not registered")?,
    }

    match locator.find_vcvarsall(version) {
        Ok(Some(script)) => writeln!(out, "  {VCVARSALL}:  {}", script.display())?,
        Ok(None) => writeln!(out, "  {VCVARSALL}:  not found")?,
        Err(e) => writeln!(out, "  {VCVARSALL}:  error: {e}")?,
    }

    let pi = locator.platform(session.arch(None));
    match locator.direct().layout(version, &pi) {
        Ok(layout) => {
            writeln!(out, "  Visual Studio:  {}", layout.vs_install_dir.display())?;
            writeln!(out, "  Visual C++:     {}", layout.vc_install_dir.display())?;
            writeln!(out, "  Windows SDK:    {}", layout.windows_sdk_dir.display())?;
            writeln!(out, "  .NET Framework: {}", layout.framework_versions.join(", "))?;
        }
        Err(e) => writeln!(out, "  Direct layout:  {e}")?,
    }
    Ok(())
}
