//! Task commands — `ledgerboard task add|remove|move|import`.

use anyhow::Result;
use console::style;
use ledgerboard::board::drag::{DragController, DropOutcome};
use ledgerboard::board::models::NewTask;
use ledgerboard::config::AppConfig;
use ledgerboard::errors::BoardError;

use super::super::TaskCommands;
use super::{Workspace, read_json_rows, resolve_column};

pub async fn cmd_task(config: AppConfig, command: TaskCommands) -> Result<()> {
    let workspace = Workspace::open(config)?;
    let mut state = workspace.board_state().await?;

    match command {
        TaskCommands::Add {
            column,
            title,
            client,
            obligation,
            due,
            competence,
            priority,
            description,
            observations,
        } => {
            let column_id = resolve_column(&state, &column)?.id;
            let mut task = NewTask {
                title,
                description,
                obligation_type: obligation,
                due_date: due,
                competence,
                priority,
                observations,
                ..NewTask::default()
            };
            if let Some(client_id) = client {
                let clients = workspace.clients().list().await?;
                let found = clients
                    .iter()
                    .find(|c| c.id == client_id)
                    .ok_or(BoardError::client_not_found(client_id))?;
                task = task.with_client(found);
            }

            let created = state.add_task(column_id, task).await?;
            println!(
                "{} Added task #{} {}",
                style("✓").green(),
                created.id,
                style(&created.title).bold()
            );
        }
        TaskCommands::Remove { id } => {
            state.remove_task(id).await?;
            println!("{} Removed task #{}", style("✓").green(), id);
        }
        TaskCommands::Move { id, to } => {
            let source = state
                .board()?
                .task(id)
                .map(|t| t.column_id)
                .ok_or(BoardError::task_not_found(id))?;
            let target = resolve_column(&state, &to)?.id;

            let mut drag = DragController::new();
            drag.drag_start(id, source);
            match drag.drop_on(&mut state, target).await? {
                DropOutcome::Moved { to_column_id, .. } => {
                    let title = state
                        .board()?
                        .column(to_column_id)
                        .map(|c| c.title.clone())
                        .unwrap_or_default();
                    println!(
                        "{} Moved task #{} to {}",
                        style("✓").green(),
                        id,
                        style(title).bold()
                    );
                }
                DropOutcome::Ignored => {
                    println!("{} Task #{} was not moved", style("!").yellow(), id);
                }
            }
        }
        TaskCommands::Import { column, file } => {
            let column_id = resolve_column(&state, &column)?.id;
            let rows: Vec<NewTask> = read_json_rows(&file)?;
            let count = state.add_tasks(column_id, rows).await?;
            println!("{} Imported {} task(s)", style("✓").green(), count);
        }
    }

    Ok(())
}
