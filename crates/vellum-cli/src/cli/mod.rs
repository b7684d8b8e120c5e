use clap::Parser;
use vellum_config::OutputConfig;

pub mod global;
pub mod root_commands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::Commands;

/// Top-level CLI parser for the `vlm` binary.
#[derive(Debug, Parser)]
#[command(
    name = "vlm",
    version,
    about = "Vellum - validate, evolve and publish content schemas"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw (defaults to `output.pretty` from config)
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Quiet mode (errors only in the log)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Extract ergonomic global flags struct for command handlers.
    #[must_use]
    pub fn global_flags(&self, output: &OutputConfig) -> GlobalFlags {
        let fallback = if output.pretty {
            OutputFormat::Json
        } else {
            OutputFormat::Raw
        };
        GlobalFlags {
            format: self.format.unwrap_or(fallback),
            quiet: self.quiet,
            verbose: self.verbose,
        }
    }
}
