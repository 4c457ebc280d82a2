//! Column commands — `ledgerboard column add|rename|remove`.

use anyhow::Result;
use console::style;
use ledgerboard::config::AppConfig;

use super::super::ColumnCommands;
use super::{Workspace, resolve_column};

pub async fn cmd_column(config: AppConfig, command: ColumnCommands) -> Result<()> {
    let workspace = Workspace::open(config)?;
    let mut state = workspace.board_state().await?;

    match command {
        ColumnCommands::Add { title } => {
            let column = state.add_column(&title).await?;
            println!(
                "{} Added column {} {}",
                style("✓").green(),
                style(&column.title).bold(),
                style(format!("[{}]", column.id)).dim()
            );
        }
        ColumnCommands::Rename { column, title } => {
            let (id, old) = {
                let found = resolve_column(&state, &column)?;
                (found.id, found.title.clone())
            };
            state.rename_column(id, &title).await?;
            println!(
                "{} Renamed '{}' to {}",
                style("✓").green(),
                old,
                style(title.trim()).bold()
            );
        }
        ColumnCommands::Remove { column } => {
            let (id, title, tasks) = {
                let found = resolve_column(&state, &column)?;
                (found.id, found.title.clone(), found.task_ids.len())
            };
            state.remove_column(id).await?;
            println!(
                "{} Removed column '{}' and {} task(s)",
                style("✓").green(),
                title,
                tasks
            );
        }
    }

    Ok(())
}
