//! Scheduled due-date checks and the notification inbox.
//!
//! Three checkpoints are evaluated on every check:
//!
//! | Checkpoint | Fires | Kind |
//! |---|---|---|
//! | Morning summary | once a day at/after `morning`, if anything is due today or tomorrow | `alert` |
//! | Daily summary | once a day at/after `evening` | `alert` |
//! | Task overdue | once per task whose due date has passed | `overdue` |
//!
//! What already fired is tracked in [`Watermarks`], persisted as JSON next
//! to the database.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::{Context, Result};
use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::gateway::Gateway;
use super::models::{NewNotification, Notification, NotificationKind, Task};
use super::state::Session;
use crate::errors::BoardResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub morning: NaiveTime,
    pub evening: NaiveTime,
}

impl Default for Schedule {
    fn default() -> Self {
        Self {
            morning: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
            evening: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default(),
        }
    }
}

/// Last-fired markers for each checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Watermarks {
    #[serde(default)]
    pub morning: Option<NaiveDate>,
    #[serde(default)]
    pub evening: Option<NaiveDate>,
    #[serde(default)]
    pub overdue_task_ids: BTreeSet<i64>,
}

impl Watermarks {
    /// Returns defaults when the file does not exist yet.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read watermarks: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse watermarks: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to encode watermarks")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write watermarks: {}", path.display()))
    }
}

fn pluralize(count: usize, one: &str, many: &str) -> String {
    format!("{} {}", count, if count == 1 { one } else { many })
}

/// Watermark advanced once the notification it belongs to is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Morning(NaiveDate),
    Evening(NaiveDate),
    Overdue(i64),
}

impl Watermarks {
    pub fn apply(&mut self, mark: Mark) {
        match mark {
            Mark::Morning(day) => self.morning = Some(day),
            Mark::Evening(day) => self.evening = Some(day),
            Mark::Overdue(task_id) => {
                self.overdue_task_ids.insert(task_id);
            }
        }
    }
}

/// Result of evaluating the checkpoints: the marks that hold whatever gets
/// stored, plus each pending notification with the mark it advances.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckPlan {
    pub base: Watermarks,
    pub pending: Vec<(NewNotification, Mark)>,
}

/// Evaluate the checkpoints at `now` without touching `marks`.
///
/// `base` drops overdue ids of tasks no longer on the board and records a
/// morning checkpoint that passed with nothing to report.
pub fn plan_notifications(
    now: NaiveDateTime,
    tasks: &[Task],
    marks: &Watermarks,
    schedule: &Schedule,
) -> CheckPlan {
    let mut base = marks.clone();
    let mut pending = Vec::new();
    if tasks.is_empty() {
        return CheckPlan { base, pending };
    }
    let today = now.date();
    let tomorrow = today + Duration::days(1);

    if now.time() >= schedule.morning && marks.morning != Some(today) {
        let due_today: Vec<i64> = tasks
            .iter()
            .filter(|t| t.due_date == Some(today))
            .map(|t| t.id)
            .collect();
        let due_tomorrow: Vec<i64> = tasks
            .iter()
            .filter(|t| t.due_date == Some(tomorrow))
            .map(|t| t.id)
            .collect();
        if due_today.is_empty() && due_tomorrow.is_empty() {
            base.apply(Mark::Morning(today));
        } else {
            pending.push((
                NewNotification {
                    kind: NotificationKind::Alert,
                    title: "Morning summary".to_string(),
                    message: Some(format!(
                        "{} due today and {} due tomorrow.",
                        pluralize(due_today.len(), "task", "tasks"),
                        due_tomorrow.len()
                    )),
                    task_ids: due_today.into_iter().chain(due_tomorrow).collect(),
                },
                Mark::Morning(today),
            ));
        }
    }

    if now.time() >= schedule.evening && marks.evening != Some(today) {
        let overdue = tasks
            .iter()
            .filter(|t| t.due_date.is_some_and(|d| d < today))
            .count();
        pending.push((
            NewNotification {
                kind: NotificationKind::Alert,
                title: "Daily summary".to_string(),
                message: Some(format!(
                    "You have {} on the board, {} overdue.",
                    pluralize(tasks.len(), "task", "tasks"),
                    overdue
                )),
                task_ids: Vec::new(),
            },
            Mark::Evening(today),
        ));
    }

    base.overdue_task_ids
        .retain(|id| tasks.iter().any(|t| t.id == *id));
    for task in tasks {
        let Some(due) = task.due_date else { continue };
        if due >= today || base.overdue_task_ids.contains(&task.id) {
            continue;
        }
        pending.push((
            NewNotification {
                kind: NotificationKind::Overdue,
                title: "Task overdue".to_string(),
                message: Some(format!(
                    "Task \"{}\" for client {} was due {}.",
                    task.title,
                    task.client_name.as_deref().unwrap_or("N/A"),
                    due.format("%Y-%m-%d")
                )),
                task_ids: vec![task.id],
            },
            Mark::Overdue(task.id),
        ));
    }

    CheckPlan { base, pending }
}

/// Notifications due at `now` for the given board tasks, advancing `marks`
/// as if all of them were stored. An empty board yields nothing and leaves
/// the marks untouched.
pub fn due_notifications(
    now: NaiveDateTime,
    tasks: &[Task],
    marks: &mut Watermarks,
    schedule: &Schedule,
) -> Vec<NewNotification> {
    let plan = plan_notifications(now, tasks, marks, schedule);
    *marks = plan.base;
    plan.pending
        .into_iter()
        .map(|(notification, mark)| {
            marks.apply(mark);
            notification
        })
        .collect()
}

/// Inbox operations plus the scheduled checks for one session.
pub struct NotificationCenter {
    gateway: Arc<dyn Gateway>,
    session: Session,
    schedule: Schedule,
}

impl NotificationCenter {
    pub fn new(gateway: Arc<dyn Gateway>, session: Session, schedule: Schedule) -> Self {
        Self {
            gateway,
            session,
            schedule,
        }
    }

    /// Newest first.
    pub async fn list(&self) -> BoardResult<Vec<Notification>> {
        self.gateway.get_notifications(&self.session.user_id).await
    }

    pub async fn unread_count(&self) -> BoardResult<usize> {
        Ok(self.list().await?.iter().filter(|n| !n.read).count())
    }

    pub async fn mark_as_read(&self, notification_id: i64) -> BoardResult<()> {
        self.gateway.mark_as_read(notification_id).await
    }

    pub async fn mark_all_as_read(&self) -> BoardResult<()> {
        self.gateway.mark_all_as_read(&self.session.user_id).await
    }

    pub async fn purge(&self, older_than_days: u32) -> BoardResult<usize> {
        let deleted = self
            .gateway
            .delete_older_than(&self.session.user_id, older_than_days)
            .await?;
        tracing::info!(deleted, older_than_days, "Old notifications purged");
        Ok(deleted)
    }

    /// Run one scheduled check against the current board and store any
    /// notifications that fire. Each mark advances right after its
    /// notification is stored, so a failed write leaves the earlier ones
    /// recorded and only the rest pending.
    pub async fn check(
        &self,
        now: NaiveDateTime,
        marks: &mut Watermarks,
    ) -> BoardResult<Vec<Notification>> {
        let board = self.gateway.get_board(&self.session.user_id).await?;
        let plan = plan_notifications(now, &board.tasks, marks, &self.schedule);
        *marks = plan.base;

        let mut stored = Vec::with_capacity(plan.pending.len());
        for (notification, mark) in plan.pending {
            let saved = self
                .gateway
                .add_notification(&self.session.user_id, notification)
                .await
                .inspect_err(|e| {
                    tracing::warn!(stored = stored.len(), error = %e, "Failed to store notification")
                })?;
            marks.apply(mark);
            stored.push(saved);
        }
        if !stored.is_empty() {
            tracing::info!(count = stored.len(), "Notifications raised");
        }
        Ok(stored)
    }

    /// Load marks from `marks_path`, check once at local time, save marks.
    /// Marks are saved even when the check fails partway.
    pub async fn check_now(&self, marks_path: &Path) -> Result<Vec<Notification>> {
        let mut marks = Watermarks::load(marks_path)?;
        let result = self.check(Local::now().naive_local(), &mut marks).await;
        marks.save(marks_path)?;
        Ok(result?)
    }

    /// Check every `interval` until ctrl-c. Failed checks are logged and
    /// retried on the next tick.
    pub async fn watch(&self, marks_path: &Path, interval: StdDuration) -> Result<()> {
        let mut ticker = tokio::time::interval(interval);
        tracing::info!(interval_secs = interval.as_secs(), "Watching for due tasks");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.check_now(marks_path).await {
                        Ok(stored) => {
                            for n in &stored {
                                tracing::info!(kind = n.kind.as_str(), title = %n.title, "Notification");
                            }
                        }
                        Err(e) => tracing::warn!(error = %format!("{:#}", e), "Scheduled check failed"),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Stopping notification watcher");
                    return Ok(());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::models::NewTask;
    use crate::board::testing::{RecordingGateway, column_id, loaded_state};

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(id: i64, due: Option<NaiveDate>) -> Task {
        Task {
            id,
            column_id: 1,
            title: format!("task-{}", id),
            description: None,
            position: 0,
            client_id: None,
            client_name: Some("Acme".into()),
            client_cnpj: None,
            obligation_type: None,
            due_date: due,
            competence: None,
            priority: None,
            observations: None,
        }
    }

    #[test]
    fn test_empty_board_fires_nothing() {
        let mut marks = Watermarks::default();
        let out = due_notifications(at(2024, 6, 10, 18, 0), &[], &mut marks, &Schedule::default());
        assert!(out.is_empty());
        assert_eq!(marks, Watermarks::default());
    }

    #[test]
    fn test_nothing_before_morning_checkpoint() {
        let tasks = vec![task(1, Some(day(2024, 6, 10)))];
        let mut marks = Watermarks::default();
        let out = due_notifications(at(2024, 6, 10, 7, 59), &tasks, &mut marks, &Schedule::default());
        assert!(out.is_empty());
        assert!(marks.morning.is_none());
    }

    #[test]
    fn test_morning_summary_fires_once_per_day() {
        let tasks = vec![
            task(1, Some(day(2024, 6, 10))),
            task(2, Some(day(2024, 6, 11))),
            task(3, Some(day(2024, 6, 20))),
        ];
        let schedule = Schedule::default();
        let mut marks = Watermarks::default();

        let out = due_notifications(at(2024, 6, 10, 9, 30), &tasks, &mut marks, &schedule);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Morning summary");
        assert_eq!(out[0].kind, NotificationKind::Alert);
        assert_eq!(out[0].task_ids, vec![1, 2]);
        assert_eq!(
            out[0].message.as_deref(),
            Some("1 task due today and 1 due tomorrow.")
        );
        assert_eq!(marks.morning, Some(day(2024, 6, 10)));

        let again = due_notifications(at(2024, 6, 10, 10, 0), &tasks, &mut marks, &schedule);
        assert!(again.is_empty());
    }

    #[test]
    fn test_morning_summary_skipped_when_nothing_is_close() {
        let tasks = vec![task(1, Some(day(2024, 6, 20))), task(2, None)];
        let mut marks = Watermarks::default();
        let out = due_notifications(at(2024, 6, 10, 8, 0), &tasks, &mut marks, &Schedule::default());
        assert!(out.is_empty());
        assert_eq!(marks.morning, Some(day(2024, 6, 10)));
    }

    #[test]
    fn test_evening_summary_counts_overdue() {
        let tasks = vec![
            task(1, Some(day(2024, 6, 9))),
            task(2, Some(day(2024, 6, 30))),
            task(3, None),
        ];
        let mut marks = Watermarks {
            morning: Some(day(2024, 6, 10)),
            evening: None,
            overdue_task_ids: BTreeSet::from([1]),
        };
        let out = due_notifications(at(2024, 6, 10, 17, 5), &tasks, &mut marks, &Schedule::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].title, "Daily summary");
        assert_eq!(
            out[0].message.as_deref(),
            Some("You have 3 tasks on the board, 1 overdue.")
        );
    }

    #[test]
    fn test_overdue_notice_once_per_task() {
        let tasks = vec![task(1, Some(day(2024, 6, 9))), task(2, Some(day(2024, 6, 10)))];
        let schedule = Schedule::default();
        let mut marks = Watermarks::default();

        let out = due_notifications(at(2024, 6, 10, 6, 0), &tasks, &mut marks, &schedule);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, NotificationKind::Overdue);
        assert_eq!(out[0].task_ids, vec![1]);
        assert!(out[0].message.as_deref().unwrap().contains("client Acme"));

        let again = due_notifications(at(2024, 6, 10, 6, 1), &tasks, &mut marks, &schedule);
        assert!(again.is_empty());

        // Next day task 2 becomes overdue
        let next = due_notifications(at(2024, 6, 11, 6, 0), &tasks, &mut marks, &schedule);
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].task_ids, vec![2]);
    }

    #[test]
    fn test_overdue_marks_forget_deleted_tasks() {
        let mut marks = Watermarks {
            overdue_task_ids: BTreeSet::from([1, 99]),
            ..Watermarks::default()
        };
        let tasks = vec![task(1, Some(day(2024, 6, 1)))];
        due_notifications(at(2024, 6, 10, 6, 0), &tasks, &mut marks, &Schedule::default());
        assert_eq!(marks.overdue_task_ids, BTreeSet::from([1]));
    }

    #[test]
    fn test_watermarks_persist_to_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watermarks.json");
        assert_eq!(Watermarks::load(&path).unwrap(), Watermarks::default());

        let marks = Watermarks {
            morning: Some(day(2024, 6, 10)),
            evening: None,
            overdue_task_ids: BTreeSet::from([3, 4]),
        };
        marks.save(&path).unwrap();
        assert_eq!(Watermarks::load(&path).unwrap(), marks);
    }

    #[tokio::test]
    async fn test_check_stores_notifications_and_advances_marks() {
        let (mut state, gateway) = loaded_state().await;
        let todo = column_id(&state, "To Do");
        state
            .add_task(
                todo,
                NewTask {
                    due_date: Some(day(2024, 6, 1)),
                    ..NewTask::titled("PGDAS - Acme")
                },
            )
            .await
            .unwrap();

        let center = NotificationCenter::new(
            gateway.clone(),
            state.session().clone(),
            Schedule::default(),
        );
        let mut marks = Watermarks::default();
        let stored = center.check(at(2024, 6, 10, 18, 0), &mut marks).await.unwrap();
        let titles: Vec<&str> = stored.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Daily summary", "Task overdue"]);
        assert_eq!(center.unread_count().await.unwrap(), 2);

        let again = center.check(at(2024, 6, 10, 18, 1), &mut marks).await.unwrap();
        assert!(again.is_empty());

        center.mark_as_read(stored[0].id).await.unwrap();
        assert_eq!(center.unread_count().await.unwrap(), 1);
        center.mark_all_as_read().await.unwrap();
        assert_eq!(center.unread_count().await.unwrap(), 0);
        assert_eq!(center.purge(90).await.unwrap(), 0);
        assert_eq!(center.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_store_keeps_marks() {
        let gateway = RecordingGateway::new();
        let mut state = crate::board::state::BoardState::new(gateway.clone(), Session::new("u"));
        state.load().await.unwrap();
        let todo = column_id(&state, "To Do");
        state
            .add_task(
                todo,
                NewTask {
                    due_date: Some(day(2024, 6, 1)),
                    ..NewTask::titled("late")
                },
            )
            .await
            .unwrap();

        gateway.fail_writes(true);
        let center = NotificationCenter::new(gateway.clone(), Session::new("u"), Schedule::default());
        let mut marks = Watermarks::default();
        assert!(center.check(at(2024, 6, 10, 18, 0), &mut marks).await.is_err());
        assert_eq!(marks.evening, None);
        assert!(marks.overdue_task_ids.is_empty());
    }

    #[tokio::test]
    async fn test_partial_store_advances_only_stored_marks() {
        let gateway = RecordingGateway::new();
        let mut state = crate::board::state::BoardState::new(gateway.clone(), Session::new("u"));
        state.load().await.unwrap();
        let todo = column_id(&state, "To Do");
        let late = state
            .add_task(
                todo,
                NewTask {
                    due_date: Some(day(2024, 6, 1)),
                    ..NewTask::titled("late")
                },
            )
            .await
            .unwrap();

        // Daily summary is stored, the overdue notice is not.
        gateway.fail_after(1);
        let center = NotificationCenter::new(gateway.clone(), Session::new("u"), Schedule::default());
        let mut marks = Watermarks::default();
        assert!(center.check(at(2024, 6, 10, 18, 0), &mut marks).await.is_err());
        assert_eq!(marks.evening, Some(day(2024, 6, 10)));
        assert!(marks.overdue_task_ids.is_empty());

        gateway.clear_fail_after();
        let retried = center.check(at(2024, 6, 10, 18, 1), &mut marks).await.unwrap();
        let titles: Vec<&str> = retried.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Task overdue"]);
        assert!(marks.overdue_task_ids.contains(&late.id));

        let daily = center
            .list()
            .await
            .unwrap()
            .into_iter()
            .filter(|n| n.title == "Daily summary")
            .count();
        assert_eq!(daily, 1);
    }

    #[tokio::test]
    async fn test_check_now_saves_marks_after_partial_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watermarks.json");
        let gateway = RecordingGateway::new();
        let mut state = crate::board::state::BoardState::new(gateway.clone(), Session::new("u"));
        state.load().await.unwrap();
        let todo = column_id(&state, "To Do");
        for title in ["a", "b"] {
            state
                .add_task(
                    todo,
                    NewTask {
                        due_date: Some(day(2020, 1, 1)),
                        ..NewTask::titled(title)
                    },
                )
                .await
                .unwrap();
        }

        // Schedule far in the future so only the overdue notices fire.
        let schedule = Schedule {
            morning: NaiveTime::from_hms_opt(23, 59, 59).unwrap(),
            evening: NaiveTime::from_hms_opt(23, 59, 59).unwrap(),
        };
        let center = NotificationCenter::new(gateway.clone(), Session::new("u"), schedule);
        gateway.fail_after(1);
        assert!(center.check_now(&path).await.is_err());
        assert_eq!(Watermarks::load(&path).unwrap().overdue_task_ids.len(), 1);
        gateway.clear_fail_after();
        center.check_now(&path).await.unwrap();
        assert_eq!(center.list().await.unwrap().len(), 2);
    }
}
