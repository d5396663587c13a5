//! CLI command implementations.

pub mod doctor;
pub mod find;
pub mod platform;
pub mod query;

/// How a resolved environment is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// One variable per block, one directory per line
    Human,
    /// A JSON object keyed by lowercase variable name
    Json,
    /// `set NAME=value` lines for cmd.exe
    Cmd,
}
