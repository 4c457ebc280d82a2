//! `ledgerboard generate` — create this month's obligation tasks.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use console::style;
use ledgerboard::board::obligations::{competence, generate_monthly};
use ledgerboard::config::AppConfig;

use super::Workspace;

pub async fn cmd_generate(
    config: AppConfig,
    client: Option<i64>,
    today: Option<NaiveDate>,
) -> Result<()> {
    let rules = config.toml.obligations.to_rules();
    let workspace = Workspace::open(config)?;
    let mut state = workspace.board_state().await?;
    let clients = workspace.clients().list().await?;
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    let summary = generate_monthly(&mut state, &clients, client, today, &rules).await?;

    println!(
        "{} Competence {}: {} task(s) created, {} already on the board",
        style("✓").green(),
        style(competence(today)).bold(),
        summary.created,
        summary.skipped
    );
    if summary.created > 0 {
        println!("  Added to '{}'", rules.intake_column);
    }

    Ok(())
}
