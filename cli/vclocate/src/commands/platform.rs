//! `vclocate platform`: architecture classification.

use std::fmt::Write;

use anyhow::Result;
use vclocate_toolchain::PlatformInfo;

pub fn run(arch: &str, host_cpu: &str) -> Result<()> {
    print!("{}", describe(&PlatformInfo::new(arch, host_cpu))?);
    Ok(())
}

pub fn describe(pi: &PlatformInfo) -> Result<String> {
    let suffix = |s: &str| if s.is_empty() { "(none)".to_string() } else { s.to_string() };

    let mut out = String::new();
    writeln!(out, "Architecture: {}", pi.arch)?;
    writeln!(out, "Target CPU:   {}", pi.target_cpu())?;
    writeln!(out, "Host CPU:     {}", pi.current_cpu)?;
    writeln!(out, "Target x86:   {}", pi.target_is_x86())?;
    writeln!(out)?;
    writeln!(out, "--- Directory suffixes ---")?;
    writeln!(out, "  Visual C++ libraries: {}", suffix(pi.lib_extra()))?;
    writeln!(out, "  Windows SDK:          {}", suffix(pi.sdk_extra()))?;
    writeln!(out, "  Visual C++ tools:     {}", suffix(&pi.tools_extra()))?;
    Ok(out)
}
