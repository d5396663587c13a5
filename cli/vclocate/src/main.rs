//! vclocate: locate a legacy Visual C++ toolchain and print its build environment.

mod commands;
mod session;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use vclocate_toolchain::CompilerVersion;

use commands::Format;
use session::Session;

#[derive(Parser)]
#[command(name = "vclocate", version, about = "Legacy Visual C++ toolchain locator")]
struct Cli {
    /// Configuration file (default: vclocate.toml, searched upward)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Log every lookup decision
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the vcvarsall.bat that would be used
    Find {
        /// Compiler version (e.g., 9.0, 10.0)
        version: Option<CompilerVersion>,
    },
    /// Resolve the compiler environment, running vcvarsall.bat when available
    Query {
        /// Compiler version (e.g., 9.0, 10.0)
        version: Option<CompilerVersion>,
        /// Architecture token (e.g., x86, amd64, x86_amd64)
        #[arg(long)]
        arch: Option<String>,
        #[arg(long, value_enum, default_value_t = Format::Human)]
        format: Format,
    },
    /// Resolve the compiler environment from the registry and disk only
    Direct {
        /// Compiler version (e.g., 9.0, 10.0)
        version: Option<CompilerVersion>,
        /// Architecture token (e.g., x86, amd64, x86_amd64)
        #[arg(long)]
        arch: Option<String>,
        #[arg(long, value_enum, default_value_t = Format::Human)]
        format: Format,
    },
    /// Show how an architecture token maps onto directory suffixes
    Platform {
        /// Architecture token (e.g., x86, amd64, x86_amd64)
        arch: Option<String>,
        /// Host CPU (default: %PROCESSOR_ARCHITECTURE%)
        #[arg(long)]
        host: Option<String>,
    },
    /// Check the host environment and installed toolchains
    Doctor,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let session = Session::load(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Commands::Find { version } => {
            let locator = session.locator()?;
            commands::find::run(&locator, session.version(version))
        }

        Commands::Query {
            version,
            arch,
            format,
        } => {
            let locator = session.locator()?;
            commands::query::run(
                &locator,
                session.version(version),
                session.arch(arch.as_deref()),
                format,
            )
        }

        Commands::Direct {
            version,
            arch,
            format,
        } => {
            let locator = session.locator()?;
            commands::query::run_direct(
                &locator,
                session.version(version),
                session.arch(arch.as_deref()),
                format,
            )
        }

        Commands::Platform { arch, host } => {
            let host = match host {
                Some(host) => host,
                None => session.host_cpu()?,
            };
            commands::platform::run(session.arch(arch.as_deref()), &host)
        }

        Commands::Doctor => commands::doctor::run(&session),
    }
}
