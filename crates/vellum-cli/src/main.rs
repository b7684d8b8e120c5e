use anyhow::Context;
use clap::Parser;
use vellum_config::VellumConfig;

mod cli;
mod commands;
mod output;

fn main() {
    if let Err(error) = run() {
        eprintln!("vlm error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = VellumConfig::load_with_dotenv().context("failed to load vellum configuration")?;
    let flags = cli.global_flags(&config.output);
    init_tracing(&flags, &config.log.level)?;

    commands::dispatch::dispatch(&cli.command, &flags)
}

fn init_tracing(flags: &cli::GlobalFlags, configured: &str) -> anyhow::Result<()> {
    let level = if flags.quiet {
        "error"
    } else if flags.verbose {
        "debug"
    } else {
        configured
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("VELLUM_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
