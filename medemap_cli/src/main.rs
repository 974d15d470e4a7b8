mod cli;
mod display;
mod error;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, RunCommand};
use log::debug;
use medemap::{config::Config, storage::FileStorage, Medemap};

const DEFAULT_LOGGING_LEVEL: &str = "warn";

const WELCOME_MESSAGE: &str = "\
Welcome to medemap!

Explore media and democracy indicators across European countries:
  medemap tables                     list tables and their indicators
  medemap select <TABLE> <COLUMN>..  select up to three indicators
  medemap view <VIEW>                derive a view of the selection
";

#[tokio::main]
async fn main() -> Result<()> {
    // Set RUST_LOG to `DEFAULT_LOGGING_LEVEL` if not set
    let _ =
        std::env::var("RUST_LOG").map_err(|_| std::env::set_var("RUST_LOG", DEFAULT_LOGGING_LEVEL));
    pretty_env_logger::init_timed();
    let args = Cli::parse();
    debug!("args: {args:?}");
    let config: Config = read_config_from_toml()?;
    debug!("config: {config:?}");

    let storage = FileStorage::new(storage_path()?);
    let mut medemap = Medemap::new_with_config(config, storage)?;
    if medemap.store_mut().take_first_run()? && !args.quiet {
        println!("{WELCOME_MESSAGE}");
    }

    if let Some(command) = args.command {
        command.run(&mut medemap).await?;
    }
    Ok(())
}

fn read_config_from_toml() -> Result<Config> {
    // macOS: ~/Library/Application Support/medemap/config.toml
    let file_path = dirs::config_dir()
        .context("No configuration directory on this platform")?
        .join("medemap")
        .join("config.toml");
    match std::fs::read_to_string(&file_path) {
        Ok(contents) => toml::from_str(&contents)
            .with_context(|| format!("Invalid TOML in config file {}", file_path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e).context("Error reading config file"),
    }
}

fn storage_path() -> Result<PathBuf> {
    // Linux: ~/.local/share/medemap/storage.json
    Ok(dirs::data_dir()
        .context("No data directory on this platform")?
        .join("medemap")
        .join("storage.json"))
}
