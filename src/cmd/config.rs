//! Configuration view and validation commands — `ledgerboard config`.

use anyhow::{Context, Result};
use console::style;
use ledgerboard::config::AppConfig;

use super::super::ConfigCommands;

pub fn cmd_config(config: &AppConfig, command: Option<ConfigCommands>) -> Result<()> {
    let config_path = config.config_file();

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("{}", style("Ledgerboard Configuration").bold());
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!(
                    "No config.toml found at {} (using defaults)",
                    config_path.display()
                );
            }
            println!();

            let rendered =
                toml::to_string_pretty(&config.toml).context("Failed to render configuration")?;
            for line in rendered.lines() {
                println!("  {}", line);
            }
            println!();

            println!("Effective values (with env/CLI overrides):");
            println!("  user = \"{}\"", config.user());
            match config.remote() {
                Some(url) => println!("  remote = \"{}\"", url),
                None => println!("  database = \"{}\"", config.db_file().display()),
            }
            println!();
        }
        Some(ConfigCommands::Validate) => {
            if !config_path.exists() {
                println!("No config.toml found. Using defaults (valid).");
                return Ok(());
            }

            let warnings = config.toml.validate();
            if warnings.is_empty() {
                println!("{} Configuration is valid.", style("✓").green());
            } else {
                println!("{}", style("Configuration warnings:").yellow());
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
        }
    }

    Ok(())
}
