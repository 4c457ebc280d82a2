//! Notification commands — `ledgerboard notify ...`.

use anyhow::Result;
use console::style;
use ledgerboard::board::models::{Notification, NotificationKind};
use ledgerboard::config::AppConfig;

use super::super::NotifyCommands;
use super::Workspace;

pub async fn cmd_notify(config: AppConfig, command: NotifyCommands) -> Result<()> {
    let retention_days = config.toml.notifications.retention_days;
    let poll_interval = config.toml.notifications.poll_interval();
    let marks_path = config.watermarks_file();
    let workspace = Workspace::open(config)?;
    let center = workspace.notifications()?;

    match command {
        NotifyCommands::List { unread, json } => {
            let notifications: Vec<Notification> = center
                .list()
                .await?
                .into_iter()
                .filter(|n| !unread || !n.read)
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&notifications)?);
                return Ok(());
            }
            if notifications.is_empty() {
                println!("No notifications.");
                return Ok(());
            }
            println!(
                "{} unread",
                style(center.unread_count().await?).cyan().bold()
            );
            for notification in &notifications {
                print_notification(notification);
            }
        }
        NotifyCommands::Read { id } => {
            center.mark_as_read(id).await?;
            println!("{} Marked notification #{} as read", style("✓").green(), id);
        }
        NotifyCommands::ReadAll => {
            center.mark_all_as_read().await?;
            println!("{} All notifications marked as read", style("✓").green());
        }
        NotifyCommands::Purge { days } => {
            let days = days.unwrap_or(retention_days);
            let deleted = center.purge(days).await?;
            println!(
                "{} Deleted {} notification(s) older than {} days",
                style("✓").green(),
                deleted,
                days
            );
        }
        NotifyCommands::Check => {
            let raised = center.check_now(&marks_path).await?;
            if raised.is_empty() {
                println!("Nothing to report.");
            }
            for notification in &raised {
                print_notification(notification);
            }
        }
        NotifyCommands::Watch => {
            println!(
                "Checking every {}s. Press ctrl-c to stop.",
                poll_interval.as_secs()
            );
            center.watch(&marks_path, poll_interval).await?;
        }
    }

    Ok(())
}

fn print_notification(notification: &Notification) {
    let marker = if notification.read {
        style("  ").dim()
    } else {
        style("● ").cyan()
    };
    let title = match notification.kind {
        NotificationKind::Overdue => style(notification.title.as_str()).red().bold(),
        NotificationKind::Urgent => style(notification.title.as_str()).yellow().bold(),
        NotificationKind::Alert | NotificationKind::Completed => {
            style(notification.title.as_str()).bold()
        }
    };
    println!(
        "{}{} {} {}",
        marker,
        style(format!("#{}", notification.id)).dim(),
        title,
        style(notification.created_at.format("%Y-%m-%d %H:%M")).dim()
    );
    if let Some(message) = &notification.message {
        println!("    {}", message);
    }
}
