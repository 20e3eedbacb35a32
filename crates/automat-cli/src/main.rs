//! Automat CLI - Command-line interface for the automat dataflow runtime.

mod commands;
mod scenarios;

use anyhow::Context;
use automat_config::RuntimeConfig;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "automat")]
#[command(author, version, about = "Automat dataflow runtime CLI", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Raise the log level (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one of the demo machines on a scheduler thread
    Demo(commands::demo::DemoArgs),

    /// List the objects that can be placed in a machine
    Prototypes(commands::prototypes::PrototypesArgs),

    /// Show or create the configuration file
    Config(commands::config::ConfigArgs),
}

fn init_logging(verbose: u8, config: Option<&RuntimeConfig>) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(config.map_or("info", |c| c.logging.filter.as_str()))
        }),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let loaded = RuntimeConfig::load_or_default(cli.config.as_deref());
    init_logging(cli.verbose, loaded.as_ref().ok());

    match cli.command {
        Commands::Demo(args) => {
            let config = loaded.context("failed to load configuration")?;
            commands::demo::run(args, &config)
        }
        Commands::Prototypes(args) => commands::prototypes::run(args),
        Commands::Config(args) => commands::config::run(args, cli.config.as_deref()),
    }
}
