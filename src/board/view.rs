//! Derived, read-only views over a board snapshot: due-date buckets,
//! filtering and the KPI strip.

use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use super::models::{Board, Task};

/// Where a task's due date falls relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DueBucket {
    Overdue,
    /// Due today or within the next two days.
    Urgent,
    /// Due three or more days out, or undated.
    OnTrack,
}

impl DueBucket {
    pub fn of(due: Option<NaiveDate>, today: NaiveDate) -> Self {
        match due {
            Some(d) if d < today => Self::Overdue,
            Some(d) if d < today + Duration::days(3) => Self::Urgent,
            _ => Self::OnTrack,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overdue => "overdue",
            Self::Urgent => "urgent",
            Self::OnTrack => "on_track",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(DueBucket),
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "all" => Ok(Self::All),
            "overdue" => Ok(Self::Only(DueBucket::Overdue)),
            "urgent" => Ok(Self::Only(DueBucket::Urgent)),
            "on_track" | "ontrack" => Ok(Self::Only(DueBucket::OnTrack)),
            _ => Err(format!(
                "Invalid status: {} (expected all, overdue, urgent or on-track)",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    pub client_id: Option<i64>,
    pub obligation_type: Option<String>,
    pub status: StatusFilter,
    /// Case-insensitive substring of the task's client name.
    pub search: Option<String>,
}

impl FilterCriteria {
    pub fn matches(&self, task: &Task, today: NaiveDate) -> bool {
        let client_ok = self.client_id.is_none_or(|id| task.client_id == Some(id));
        let obligation_ok = self
            .obligation_type
            .as_deref()
            .is_none_or(|o| task.obligation_type.as_deref() == Some(o));
        let status_ok = match self.status {
            StatusFilter::All => true,
            StatusFilter::Only(bucket) => DueBucket::of(task.due_date, today) == bucket,
        };
        let search_ok = match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => task
                .client_name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(&term.to_lowercase())),
            _ => true,
        };
        client_ok && obligation_ok && status_ok && search_ok
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Kpis {
    pub overdue: usize,
    pub due_within_3_days: usize,
    pub due_within_7_days: usize,
}

impl Kpis {
    /// Counted over every dated task on the board, ignoring filters.
    pub fn compute(board: &Board, today: NaiveDate) -> Self {
        let within = |due: NaiveDate, days: i64| due >= today && due < today + Duration::days(days);
        board
            .tasks
            .iter()
            .filter_map(|t| t.due_date)
            .fold(Self::default(), |mut k, due| {
                if due < today {
                    k.overdue += 1;
                }
                if within(due, 3) {
                    k.due_within_3_days += 1;
                }
                if within(due, 7) {
                    k.due_within_7_days += 1;
                }
                k
            })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnView {
    pub column_id: i64,
    pub title: String,
    /// Unfiltered task count of the column.
    pub total: usize,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardView {
    pub board_id: i64,
    pub title: String,
    pub today: NaiveDate,
    pub kpis: Kpis,
    pub columns: Vec<ColumnView>,
    /// Every matching task, in column then task order.
    pub tasks: Vec<Task>,
}

pub fn compute(board: &Board, criteria: &FilterCriteria, today: NaiveDate) -> BoardView {
    let columns: Vec<ColumnView> = board
        .columns
        .iter()
        .map(|column| {
            let in_column = board.tasks_in(column.id);
            ColumnView {
                column_id: column.id,
                title: column.title.clone(),
                total: in_column.len(),
                tasks: in_column
                    .into_iter()
                    .filter(|t| criteria.matches(t, today))
                    .cloned()
                    .collect(),
            }
        })
        .collect();
    let tasks = columns.iter().flat_map(|c| c.tasks.iter().cloned()).collect();

    BoardView {
        board_id: board.id,
        title: board.title.clone(),
        today,
        kpis: Kpis::compute(board, today),
        columns,
        tasks,
    }
}
