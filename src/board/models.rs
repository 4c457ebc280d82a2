use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

/// The four Brazilian tax regimes a client can be registered under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaxRegime {
    #[serde(rename = "Simples Nacional")]
    SimplesNacional,
    #[serde(rename = "Lucro Presumido")]
    LucroPresumido,
    #[serde(rename = "Lucro Real")]
    LucroReal,
    #[serde(rename = "MEI")]
    Mei,
}

impl TaxRegime {
    pub const ALL: [TaxRegime; 4] = [
        Self::SimplesNacional,
        Self::LucroPresumido,
        Self::LucroReal,
        Self::Mei,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SimplesNacional => "Simples Nacional",
            Self::LucroPresumido => "Lucro Presumido",
            Self::LucroReal => "Lucro Real",
            Self::Mei => "MEI",
        }
    }
}

impl std::fmt::Display for TaxRegime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaxRegime {
    type Err = String;

    /// Accepts the display name ("Lucro Real") or a slug ("lucro-real"),
    /// case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', '_'], " ");
        Self::ALL
            .into_iter()
            .find(|regime| regime.as_str().to_lowercase() == normalized)
            .ok_or_else(|| format!("Invalid tax regime: {}", s))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Alert,
    Overdue,
    Urgent,
    Completed,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alert => "alert",
            Self::Overdue => "overdue",
            Self::Urgent => "urgent",
            Self::Completed => "completed",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "alert" => Ok(Self::Alert),
            "overdue" => Ok(Self::Overdue),
            "urgent" => Ok(Self::Urgent),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Invalid notification kind: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub id: i64,
    pub board_id: i64,
    pub title: String,
    pub position: i32,
    /// Derived from the tasks referencing this column, in task order.
    #[serde(default)]
    pub task_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: i64,
    pub column_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub position: i32,
    pub client_id: Option<i64>,
    pub client_name: Option<String>,
    pub client_cnpj: Option<String>,
    pub obligation_type: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub competence: Option<String>,
    pub priority: Option<Priority>,
    pub observations: Option<String>,
}

/// Fields supplied when creating a task. Client fields are a display
/// snapshot, never a live join against the client registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub client_id: Option<i64>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub client_cnpj: Option<String>,
    #[serde(default)]
    pub obligation_type: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub competence: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub observations: Option<String>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Copy the client's display fields onto the task.
    pub fn with_client(mut self, client: &Client) -> Self {
        self.client_id = Some(client.id);
        self.client_name = Some(client.name.clone());
        self.client_cnpj = client.cnpj.clone();
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ColumnUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub position: Option<i32>,
}

/// One user's board: ordered columns plus the flat task set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Board {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub columns: Vec<Column>,
    pub tasks: Vec<Task>,
}

impl Board {
    /// Build a board from raw store rows: columns ordered by position (ties
    /// by id), tasks ordered the same way, and each column's `task_ids`
    /// materialized from the tasks that reference it. Tasks pointing at a
    /// column outside this board are dropped.
    pub fn assemble(
        id: i64,
        user_id: impl Into<String>,
        title: impl Into<String>,
        mut columns: Vec<Column>,
        mut tasks: Vec<Task>,
    ) -> Self {
        columns.sort_by_key(|c| (c.position, c.id));
        tasks.retain(|t| columns.iter().any(|c| c.id == t.column_id));
        tasks.sort_by_key(|t| (t.position, t.id));
        for column in &mut columns {
            column.task_ids = tasks
                .iter()
                .filter(|t| t.column_id == column.id)
                .map(|t| t.id)
                .collect();
        }
        Self {
            id,
            user_id: user_id.into(),
            title: title.into(),
            columns,
            tasks,
        }
    }

    pub fn column(&self, id: i64) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn column_by_title(&self, title: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.title == title)
    }

    pub fn task(&self, id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks of a column in display order.
    pub fn tasks_in(&self, column_id: i64) -> Vec<&Task> {
        self.column(column_id)
            .map(|c| c.task_ids.iter().filter_map(|id| self.task(*id)).collect())
            .unwrap_or_default()
    }

    /// Position for a column appended at the right edge.
    pub fn next_column_position(&self) -> i32 {
        self.columns
            .iter()
            .map(|c| c.position + 1)
            .max()
            .unwrap_or(0)
            .max(self.columns.len() as i32)
    }

    /// Position for a task appended at the end of `column_id`.
    pub fn next_task_position(&self, column_id: i64) -> i32 {
        let in_column: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| t.column_id == column_id)
            .collect();
        in_column
            .iter()
            .map(|t| t.position + 1)
            .max()
            .unwrap_or(0)
            .max(in_column.len() as i32)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Client {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub cnpj: Option<String>,
    pub tax_regime: Option<TaxRegime>,
    #[serde(default)]
    pub active_obligations: Vec<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Editable client attributes, used for both insert and full update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClientFields {
    pub name: String,
    #[serde(default)]
    pub cnpj: Option<String>,
    #[serde(default)]
    pub tax_regime: Option<TaxRegime>,
    #[serde(default)]
    pub active_obligations: Vec<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: i64,
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: Option<String>,
    #[serde(default)]
    pub task_ids: Vec<i64>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewNotification {
    pub kind: NotificationKind,
    pub title: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub task_ids: Vec<i64>,
}
