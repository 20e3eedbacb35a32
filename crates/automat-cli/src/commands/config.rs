//! Configuration file commands.

use anyhow::Context;
use automat_config::{RuntimeConfig, config_file_path};
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Print the path of the configuration file
    Path,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

pub fn run(args: ConfigArgs, path: Option<&Path>) -> anyhow::Result<()> {
    match args.command {
        ConfigCommand::Show => show(path),
        ConfigCommand::Path => {
            println!("{}", resolve(path).display());
            Ok(())
        }
        ConfigCommand::Init { force } => init(path, force),
    }
}

fn resolve(path: Option<&Path>) -> PathBuf {
    path.map_or_else(config_file_path, Path::to_path_buf)
}

fn show(path: Option<&Path>) -> anyhow::Result<()> {
    let config = RuntimeConfig::load_or_default(path)
        .with_context(|| format!("failed to load {}", resolve(path).display()))?;
    print!("{}", config.to_toml()?);
    Ok(())
}

fn init(path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let path = resolve(path);
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        );
    }
    RuntimeConfig::default()
        .save(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
