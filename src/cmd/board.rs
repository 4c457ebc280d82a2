//! `ledgerboard board` — render the filtered board and the KPI strip.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use console::style;
use ledgerboard::board::models::Task;
use ledgerboard::board::view::{self, DueBucket, FilterCriteria};
use ledgerboard::config::AppConfig;

use super::Workspace;

pub async fn cmd_board(
    config: AppConfig,
    criteria: FilterCriteria,
    today: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let workspace = Workspace::open(config)?;
    let state = workspace.board_state().await?;
    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let view = view::compute(state.board()?, &criteria, today);

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!();
    println!(
        "{}  {}",
        style(&view.title).bold(),
        style(format!("({})", today)).dim()
    );
    println!(
        "Overdue: {}   Due in 3 days: {}   Due in 7 days: {}",
        style(view.kpis.overdue).red().bold(),
        style(view.kpis.due_within_3_days).yellow().bold(),
        style(view.kpis.due_within_7_days).cyan()
    );

    for column in &view.columns {
        println!();
        let count = if column.tasks.len() == column.total {
            format!("{}", column.total)
        } else {
            format!("{}/{}", column.tasks.len(), column.total)
        };
        println!(
            "{} {} {}",
            style(format!("[{}]", column.column_id)).dim(),
            style(&column.title).bold().underlined(),
            style(format!("({})", count)).dim()
        );
        for task in &column.tasks {
            println!("  {}", task_line(task, today));
        }
    }
    println!();

    Ok(())
}

fn task_line(task: &Task, today: NaiveDate) -> String {
    let mut line = format!("#{} {}", task.id, task.title);
    if let Some(client) = &task.client_name {
        line.push_str(&format!(" · {}", client));
    }
    if let Some(competence) = &task.competence {
        line.push_str(&format!(" · {}", competence));
    }
    if let Some(priority) = task.priority {
        line.push_str(&format!(" · {}", priority));
    }
    match task.due_date {
        Some(due) => {
            let label = format!("due {}", due);
            let styled = match DueBucket::of(Some(due), today) {
                DueBucket::Overdue => style(label).red().to_string(),
                DueBucket::Urgent => style(label).yellow().to_string(),
                DueBucket::OnTrack => style(label).green().to_string(),
            };
            format!("{}  {}", line, styled)
        }
        None => line,
    }
}
