//! `ledgerboard init` — write a default config.toml and create the board.

use anyhow::{Context, Result, bail};
use console::style;
use ledgerboard::config::{AppConfig, LedgerToml};

use super::Workspace;

pub async fn cmd_init(mut config: AppConfig, force: bool) -> Result<()> {
    let config_path = config.config_file();
    if config_path.exists() && !force {
        bail!(
            "{} already exists. Use --force to overwrite it.",
            config_path.display()
        );
    }

    std::fs::create_dir_all(&config.data_dir).with_context(|| {
        format!(
            "Failed to create data directory: {}",
            config.data_dir.display()
        )
    })?;

    config.toml = LedgerToml::default();
    config.toml.save(&config_path)?;
    println!(
        "{} Wrote {}",
        style("✓").green(),
        style(config_path.display()).dim()
    );

    let workspace = Workspace::open(config)?;
    let state = workspace.board_state().await?;
    let board = state.board()?;
    println!(
        "{} Board '{}' ready for {} with {} columns:",
        style("✓").green(),
        style(&board.title).bold(),
        workspace.session.user_id,
        board.columns.len()
    );
    for column in &board.columns {
        println!("    {} {}", style(format!("[{}]", column.id)).dim(), column.title);
    }

    Ok(())
}
