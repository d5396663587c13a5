//! `vclocate find`: locate vcvarsall.bat.

use std::path::PathBuf;

use anyhow::{bail, Result};
use vclocate_toolchain::batch::VCVARSALL;
use vclocate_toolchain::{CompilerVersion, FindVcvarsall};

pub fn run(finder: &dyn FindVcvarsall, version: CompilerVersion) -> Result<()> {
    println!("{}", locate(finder, version)?.display());
    Ok(())
}

pub fn locate(finder: &dyn FindVcvarsall, version: CompilerVersion) -> Result<PathBuf> {
    match finder.find_vcvarsall(version)? {
        Some(script) => Ok(script),
        None => bail!("{VCVARSALL} for Visual C++ {version} not found"),
    }
}
