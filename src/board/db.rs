use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::gateway::Gateway;
use super::models::*;
use crate::errors::{BoardError, BoardResult};

/// Board title and column titles written when a user's board is first
/// created.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSeed {
    pub title: String,
    pub columns: Vec<String>,
}

impl Default for BoardSeed {
    fn default() -> Self {
        Self {
            title: "My Board".to_string(),
            columns: [
                "To Do",
                "Awaiting Client",
                "In Progress",
                "In Review",
                "Delivered",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        }
    }
}

/// Async-safe handle to the board database.
///
/// Wraps `BoardDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`, keeping synchronous SQLite
/// I/O off the async worker threads.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<BoardDb>>,
}

impl DbHandle {
    pub fn new(db: BoardDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&BoardDb) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db.lock().map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }
}

pub struct BoardDb {
    conn: Connection,
    seed: BoardSeed,
}

const TASK_COLUMNS: &str = "t.id, t.column_id, t.title, t.description, t.position, t.client_id, \
     t.client_name, t.client_cnpj, t.obligation_type, t.due_date, t.competence, t.priority, \
     t.observations";

const CLIENT_COLUMNS: &str =
    "id, user_id, name, cnpj, tax_regime, active_obligations, email, phone";

const NOTIFICATION_COLUMNS: &str = "id, user_id, kind, title, message, task_ids, is_read, created_at";

impl BoardDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let db = Self {
            conn,
            seed: BoardSeed::default(),
        };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self {
            conn,
            seed: BoardSeed::default(),
        };
        db.init()?;
        Ok(db)
    }

    pub fn with_seed(mut self, seed: BoardSeed) -> Self {
        self.seed = seed;
        self
    }

    fn init(&self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        self.run_migrations().context("Failed to run migrations")?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS boards (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id TEXT NOT NULL UNIQUE,
                    title TEXT NOT NULL,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS board_columns (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    board_id INTEGER NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
                    title TEXT NOT NULL,
                    position INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS tasks (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    column_id INTEGER NOT NULL REFERENCES board_columns(id) ON DELETE CASCADE,
                    title TEXT NOT NULL,
                    description TEXT,
                    position INTEGER NOT NULL DEFAULT 0,
                    client_id INTEGER,
                    client_name TEXT,
                    client_cnpj TEXT,
                    obligation_type TEXT,
                    due_date TEXT,
                    competence TEXT,
                    priority TEXT,
                    observations TEXT,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS clients (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id TEXT NOT NULL,
                    name TEXT NOT NULL,
                    cnpj TEXT,
                    tax_regime TEXT,
                    active_obligations TEXT NOT NULL DEFAULT '[]',
                    email TEXT,
                    phone TEXT,
                    created_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS notifications (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id TEXT NOT NULL,
                    kind TEXT NOT NULL,
                    title TEXT NOT NULL,
                    message TEXT,
                    task_ids TEXT NOT NULL DEFAULT '[]',
                    is_read INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_columns_board ON board_columns(board_id);
                CREATE INDEX IF NOT EXISTS idx_tasks_column ON tasks(column_id);
                CREATE INDEX IF NOT EXISTS idx_clients_user ON clients(user_id);
                CREATE INDEX IF NOT EXISTS idx_notifications_user ON notifications(user_id, created_at);
                ",
            )
            .context("Failed to create tables")?;
        Ok(())
    }

    // ── Boards ────────────────────────────────────────────────────────

    fn find_board(&self, user_id: &str) -> Result<Option<(i64, String)>> {
        self.conn
            .query_row(
                "SELECT id, title FROM boards WHERE user_id = ?1",
                params![user_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .context("Failed to query board")
    }

    /// Return the user's board row, creating it and its seed columns on
    /// first access.
    pub fn get_or_create_board(&self, user_id: &str) -> Result<(i64, String)> {
        if let Some(found) = self.find_board(user_id)? {
            return Ok(found);
        }

        // Safety: DbHandle's Mutex already guarantees single-threaded access.
        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        tx.execute(
            "INSERT INTO boards (user_id, title) VALUES (?1, ?2)",
            params![user_id, self.seed.title],
        )
        .context("Failed to insert board")?;
        let board_id = tx.last_insert_rowid();
        for (position, title) in self.seed.columns.iter().enumerate() {
            tx.execute(
                "INSERT INTO board_columns (board_id, title, position) VALUES (?1, ?2, ?3)",
                params![board_id, title, position as i32],
            )
            .context("Failed to insert default column")?;
        }
        tx.commit().context("Failed to commit board creation")?;
        Ok((board_id, self.seed.title.clone()))
    }

    pub fn board_exists(&self, board_id: i64) -> Result<bool> {
        self.conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM boards WHERE id = ?1",
                params![board_id],
                |row| row.get(0),
            )
            .context("Failed to check board")
    }

    pub fn get_board(&self, user_id: &str) -> Result<Board> {
        let (board_id, title) = self.get_or_create_board(user_id)?;
        let columns = self.list_columns(board_id)?;
        let tasks = self.list_tasks(board_id)?;
        Ok(Board::assemble(board_id, user_id, title, columns, tasks))
    }

    // ── Columns ───────────────────────────────────────────────────────

    pub fn create_column(&self, board_id: i64, title: &str, position: i32) -> Result<Column> {
        self.conn
            .execute(
                "INSERT INTO board_columns (board_id, title, position) VALUES (?1, ?2, ?3)",
                params![board_id, title, position],
            )
            .context("Failed to insert column")?;
        let id = self.conn.last_insert_rowid();
        self.get_column(id)?.context("Column not found after insert")
    }

    pub fn get_column(&self, id: i64) -> Result<Option<Column>> {
        self.conn
            .query_row(
                "SELECT id, board_id, title, position FROM board_columns WHERE id = ?1",
                params![id],
                column_from_row,
            )
            .optional()
            .context("Failed to query column")
    }

    pub fn list_columns(&self, board_id: i64) -> Result<Vec<Column>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, board_id, title, position FROM board_columns
                 WHERE board_id = ?1 ORDER BY position, id",
            )
            .context("Failed to prepare list_columns")?;
        let rows = stmt
            .query_map(params![board_id], column_from_row)
            .context("Failed to query columns")?;
        let mut columns = Vec::new();
        for row in rows {
            columns.push(row.context("Failed to read column row")?);
        }
        Ok(columns)
    }

    /// Returns false when the column does not exist.
    pub fn update_column(&self, id: i64, update: &ColumnUpdate) -> Result<bool> {
        if self.get_column(id)?.is_none() {
            return Ok(false);
        }

        let tx = self
            .conn
            .unchecked_transaction()
            .context("Failed to begin transaction")?;
        if let Some(title) = &update.title {
            tx.execute(
                "UPDATE board_columns SET title = ?1 WHERE id = ?2",
                params![title, id],
            )
            .context("Failed to update column title")?;
        }
        if let Some(position) = update.position {
            tx.execute(
                "UPDATE board_columns SET position = ?1 WHERE id = ?2",
                params![position, id],
            )
            .context("Failed to update column position")?;
        }
        tx.commit().context("Failed to commit column update")?;
        Ok(true)
    }

    /// Deletes the column; its tasks go with it through the foreign key.
    pub fn delete_column(&self, id: i64) -> Result<bool> {
        let count = self
            .conn
            .execute("DELETE FROM board_columns WHERE id = ?1", params![id])
            .context("Failed to delete column")?;
        Ok(count > 0)
    }

    // ── Tasks ─────────────────────────────────────────────────────────

    pub fn create_task(&self, column_id: i64, task: &NewTask, position: i32) -> Result<Task> {
        self.conn
            .execute(
                "INSERT INTO tasks (column_id, title, description, position, client_id, client_name,
                    client_cnpj, obligation_type, due_date, competence, priority, observations)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    column_id,
                    task.title,
                    task.description,
                    position,
                    task.client_id,
                    task.client_name,
                    task.client_cnpj,
                    task.obligation_type,
                    task.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
                    task.competence,
                    task.priority.map(|p| p.as_str()),
                    task.observations,
                ],
            )
            .context("Failed to insert task")?;
        let id = self.conn.last_insert_rowid();
        self.get_task(id)?.context("Task not found after insert")
    }

    pub fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let sql = format!("SELECT {} FROM tasks t WHERE t.id = ?1", TASK_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![id], task_row)
            .optional()
            .context("Failed to query task")?;
        row.map(TaskRow::into_task).transpose()
    }

    pub fn list_tasks(&self, board_id: i64) -> Result<Vec<Task>> {
        let sql = format!(
            "SELECT {} FROM tasks t JOIN board_columns c ON c.id = t.column_id
             WHERE c.board_id = ?1 ORDER BY t.position, t.id",
            TASK_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql).context("Failed to prepare list_tasks")?;
        let rows = stmt
            .query_map(params![board_id], task_row)
            .context("Failed to query tasks")?;
        let mut tasks = Vec::new();
        for row in rows {
            let r = row.context("Failed to read task row")?;
            tasks.push(r.into_task()?);
        }
        Ok(tasks)
    }

    pub fn move_task(&self, id: i64, column_id: i64, position: i32) -> Result<bool> {
        let count = self
            .conn
            .execute(
                "UPDATE tasks SET column_id = ?1, position = ?2, updated_at = datetime('now') WHERE id = ?3",
                params![column_id, position, id],
            )
            .context("Failed to move task")?;
        Ok(count > 0)
    }

    pub fn delete_task(&self, id: i64) -> Result<bool> {
        let count = self
            .conn
            .execute("DELETE FROM tasks WHERE id = ?1", params![id])
            .context("Failed to delete task")?;
        Ok(count > 0)
    }

    // ── Clients ───────────────────────────────────────────────────────

    pub fn list_clients(&self, user_id: &str) -> Result<Vec<Client>> {
        let sql = format!(
            "SELECT {} FROM clients WHERE user_id = ?1 ORDER BY name COLLATE NOCASE, id",
            CLIENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql).context("Failed to prepare list_clients")?;
        let rows = stmt
            .query_map(params![user_id], client_row)
            .context("Failed to query clients")?;
        let mut clients = Vec::new();
        for row in rows {
            let r = row.context("Failed to read client row")?;
            clients.push(r.into_client()?);
        }
        Ok(clients)
    }

    pub fn get_client(&self, id: i64) -> Result<Option<Client>> {
        let sql = format!("SELECT {} FROM clients WHERE id = ?1", CLIENT_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![id], client_row)
            .optional()
            .context("Failed to query client")?;
        row.map(ClientRow::into_client).transpose()
    }

    pub fn create_client(&self, user_id: &str, fields: &ClientFields) -> Result<Client> {
        let obligations = serde_json::to_string(&fields.active_obligations)
            .context("Failed to encode obligations")?;
        self.conn
            .execute(
                "INSERT INTO clients (user_id, name, cnpj, tax_regime, active_obligations, email, phone)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    user_id,
                    fields.name,
                    fields.cnpj,
                    fields.tax_regime.map(|r| r.as_str()),
                    obligations,
                    fields.email,
                    fields.phone,
                ],
            )
            .context("Failed to insert client")?;
        let id = self.conn.last_insert_rowid();
        self.get_client(id)?.context("Client not found after insert")
    }

    pub fn update_client(&self, id: i64, fields: &ClientFields) -> Result<bool> {
        let obligations = serde_json::to_string(&fields.active_obligations)
            .context("Failed to encode obligations")?;
        let count = self
            .conn
            .execute(
                "UPDATE clients SET name = ?1, cnpj = ?2, tax_regime = ?3, active_obligations = ?4,
                    email = ?5, phone = ?6
                 WHERE id = ?7",
                params![
                    fields.name,
                    fields.cnpj,
                    fields.tax_regime.map(|r| r.as_str()),
                    obligations,
                    fields.email,
                    fields.phone,
                    id,
                ],
            )
            .context("Failed to update client")?;
        Ok(count > 0)
    }

    pub fn delete_client(&self, id: i64) -> Result<bool> {
        let count = self
            .conn
            .execute("DELETE FROM clients WHERE id = ?1", params![id])
            .context("Failed to delete client")?;
        Ok(count > 0)
    }

    // ── Notifications ─────────────────────────────────────────────────

    pub fn list_notifications(&self, user_id: &str) -> Result<Vec<Notification>> {
        let sql = format!(
            "SELECT {} FROM notifications WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
            NOTIFICATION_COLUMNS
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("Failed to prepare list_notifications")?;
        let rows = stmt
            .query_map(params![user_id], notification_row)
            .context("Failed to query notifications")?;
        let mut notifications = Vec::new();
        for row in rows {
            let r = row.context("Failed to read notification row")?;
            notifications.push(r.into_notification()?);
        }
        Ok(notifications)
    }

    pub fn create_notification(
        &self,
        user_id: &str,
        notification: &NewNotification,
    ) -> Result<Notification> {
        self.create_notification_at(user_id, notification, Utc::now())
    }

    pub fn create_notification_at(
        &self,
        user_id: &str,
        notification: &NewNotification,
        created_at: DateTime<Utc>,
    ) -> Result<Notification> {
        let task_ids =
            serde_json::to_string(&notification.task_ids).context("Failed to encode task ids")?;
        self.conn
            .execute(
                "INSERT INTO notifications (user_id, kind, title, message, task_ids, is_read, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
                params![
                    user_id,
                    notification.kind.as_str(),
                    notification.title,
                    notification.message,
                    task_ids,
                    timestamp(created_at),
                ],
            )
            .context("Failed to insert notification")?;
        let id = self.conn.last_insert_rowid();
        self.get_notification(id)?
            .context("Notification not found after insert")
    }

    pub fn get_notification(&self, id: i64) -> Result<Option<Notification>> {
        let sql = format!("SELECT {} FROM notifications WHERE id = ?1", NOTIFICATION_COLUMNS);
        let row = self
            .conn
            .query_row(&sql, params![id], notification_row)
            .optional()
            .context("Failed to query notification")?;
        row.map(NotificationRow::into_notification).transpose()
    }

    pub fn mark_notification_read(&self, id: i64) -> Result<bool> {
        let count = self
            .conn
            .execute(
                "UPDATE notifications SET is_read = 1 WHERE id = ?1",
                params![id],
            )
            .context("Failed to mark notification read")?;
        Ok(count > 0)
    }

    pub fn mark_all_notifications_read(&self, user_id: &str) -> Result<usize> {
        self.conn
            .execute(
                "UPDATE notifications SET is_read = 1 WHERE user_id = ?1 AND is_read = 0",
                params![user_id],
            )
            .context("Failed to mark notifications read")
    }

    pub fn delete_notifications_before(
        &self,
        user_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<usize> {
        self.conn
            .execute(
                "DELETE FROM notifications WHERE user_id = ?1 AND created_at < ?2",
                params![user_id, timestamp(cutoff)],
            )
            .context("Failed to delete old notifications")
    }
}

/// Fixed-width UTC timestamps so that text comparison orders chronologically.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ── Row types ─────────────────────────────────────────────────────────

fn column_from_row(row: &Row<'_>) -> rusqlite::Result<Column> {
    Ok(Column {
        id: row.get(0)?,
        board_id: row.get(1)?,
        title: row.get(2)?,
        position: row.get(3)?,
        task_ids: Vec::new(),
    })
}

struct TaskRow {
    id: i64,
    column_id: i64,
    title: String,
    description: Option<String>,
    position: i32,
    client_id: Option<i64>,
    client_name: Option<String>,
    client_cnpj: Option<String>,
    obligation_type: Option<String>,
    due_date: Option<String>,
    competence: Option<String>,
    priority: Option<String>,
    observations: Option<String>,
}

fn task_row(row: &Row<'_>) -> rusqlite::Result<TaskRow> {
    Ok(TaskRow {
        id: row.get(0)?,
        column_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        position: row.get(4)?,
        client_id: row.get(5)?,
        client_name: row.get(6)?,
        client_cnpj: row.get(7)?,
        obligation_type: row.get(8)?,
        due_date: row.get(9)?,
        competence: row.get(10)?,
        priority: row.get(11)?,
        observations: row.get(12)?,
    })
}

impl TaskRow {
    fn into_task(self) -> Result<Task> {
        let due_date = self
            .due_date
            .map(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d"))
            .transpose()
            .with_context(|| format!("Invalid due date on task {}", self.id))?;
        let priority = self
            .priority
            .map(|p| Priority::from_str(&p))
            .transpose()
            .map_err(|e| anyhow::anyhow!(e))?;
        Ok(Task {
            id: self.id,
            column_id: self.column_id,
            title: self.title,
            description: self.description,
            position: self.position,
            client_id: self.client_id,
            client_name: self.client_name,
            client_cnpj: self.client_cnpj,
            obligation_type: self.obligation_type,
            due_date,
            competence: self.competence,
            priority,
            observations: self.observations,
        })
    }
}

struct ClientRow {
    id: i64,
    user_id: String,
    name: String,
    cnpj: Option<String>,
    tax_regime: Option<String>,
    active_obligations: String,
    email: Option<String>,
    phone: Option<String>,
}

fn client_row(row: &Row<'_>) -> rusqlite::Result<ClientRow> {
    Ok(ClientRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        cnpj: row.get(3)?,
        tax_regime: row.get(4)?,
        active_obligations: row.get(5)?,
        email: row.get(6)?,
        phone: row.get(7)?,
    })
}

impl ClientRow {
    fn into_client(self) -> Result<Client> {
        let tax_regime = self
            .tax_regime
            .map(|r| TaxRegime::from_str(&r))
            .transpose()
            .map_err(|e| anyhow::anyhow!(e))?;
        let active_obligations: Vec<String> = serde_json::from_str(&self.active_obligations)
            .with_context(|| format!("Invalid obligations on client {}", self.id))?;
        Ok(Client {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            cnpj: self.cnpj,
            tax_regime,
            active_obligations,
            email: self.email,
            phone: self.phone,
        })
    }
}

struct NotificationRow {
    id: i64,
    user_id: String,
    kind: String,
    title: String,
    message: Option<String>,
    task_ids: String,
    read: bool,
    created_at: String,
}

fn notification_row(row: &Row<'_>) -> rusqlite::Result<NotificationRow> {
    Ok(NotificationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        kind: row.get(2)?,
        title: row.get(3)?,
        message: row.get(4)?,
        task_ids: row.get(5)?,
        read: row.get(6)?,
        created_at: row.get(7)?,
    })
}

impl NotificationRow {
    fn into_notification(self) -> Result<Notification> {
        let kind = NotificationKind::from_str(&self.kind).map_err(|e| anyhow::anyhow!(e))?;
        let task_ids: Vec<i64> = serde_json::from_str(&self.task_ids)
            .with_context(|| format!("Invalid task ids on notification {}", self.id))?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .with_context(|| format!("Invalid timestamp on notification {}", self.id))?
            .with_timezone(&Utc);
        Ok(Notification {
            id: self.id,
            user_id: self.user_id,
            kind,
            title: self.title,
            message: self.message,
            task_ids,
            read: self.read,
            created_at,
        })
    }
}

// ── Gateway ───────────────────────────────────────────────────────────

#[async_trait]
impl Gateway for DbHandle {
    async fn get_board(&self, user_id: &str) -> BoardResult<Board> {
        let user_id = user_id.to_string();
        Ok(self.call(move |db| db.get_board(&user_id)).await?)
    }

    async fn add_column(&self, board_id: i64, title: &str, position: i32) -> BoardResult<Column> {
        let title = title.to_string();
        let column = self
            .call(move |db| {
                if !db.board_exists(board_id)? {
                    return Ok(None);
                }
                db.create_column(board_id, &title, position).map(Some)
            })
            .await?;
        column.ok_or(BoardError::NotFound {
            entity: "Board",
            id: board_id,
        })
    }

    async fn update_column(&self, column_id: i64, update: ColumnUpdate) -> BoardResult<()> {
        let updated = self
            .call(move |db| db.update_column(column_id, &update))
            .await?;
        if !updated {
            return Err(BoardError::column_not_found(column_id));
        }
        Ok(())
    }

    async fn delete_column(&self, column_id: i64) -> BoardResult<()> {
        let deleted = self.call(move |db| db.delete_column(column_id)).await?;
        if !deleted {
            return Err(BoardError::column_not_found(column_id));
        }
        Ok(())
    }

    async fn add_task(&self, column_id: i64, task: NewTask, position: i32) -> BoardResult<Task> {
        let created = self
            .call(move |db| {
                if db.get_column(column_id)?.is_none() {
                    return Ok(None);
                }
                db.create_task(column_id, &task, position).map(Some)
            })
            .await?;
        created.ok_or(BoardError::column_not_found(column_id))
    }

    async fn delete_task(&self, task_id: i64) -> BoardResult<()> {
        let deleted = self.call(move |db| db.delete_task(task_id)).await?;
        if !deleted {
            return Err(BoardError::task_not_found(task_id));
        }
        Ok(())
    }

    async fn move_task(&self, task_id: i64, column_id: i64, position: i32) -> BoardResult<()> {
        self.call(move |db| {
            if db.get_column(column_id)?.is_none() {
                return Ok(Err(BoardError::column_not_found(column_id)));
            }
            if !db.move_task(task_id, column_id, position)? {
                return Ok(Err(BoardError::task_not_found(task_id)));
            }
            Ok(Ok(()))
        })
        .await?
    }

    async fn get_clients(&self, user_id: &str) -> BoardResult<Vec<Client>> {
        let user_id = user_id.to_string();
        Ok(self.call(move |db| db.list_clients(&user_id)).await?)
    }

    async fn add_client(&self, user_id: &str, client: ClientFields) -> BoardResult<Client> {
        let user_id = user_id.to_string();
        Ok(self
            .call(move |db| db.create_client(&user_id, &client))
            .await?)
    }

    async fn update_client(&self, client_id: i64, client: ClientFields) -> BoardResult<()> {
        let updated = self
            .call(move |db| db.update_client(client_id, &client))
            .await?;
        if !updated {
            return Err(BoardError::client_not_found(client_id));
        }
        Ok(())
    }

    async fn delete_client(&self, client_id: i64) -> BoardResult<()> {
        let deleted = self.call(move |db| db.delete_client(client_id)).await?;
        if !deleted {
            return Err(BoardError::client_not_found(client_id));
        }
        Ok(())
    }

    async fn get_notifications(&self, user_id: &str) -> BoardResult<Vec<Notification>> {
        let user_id = user_id.to_string();
        Ok(self.call(move |db| db.list_notifications(&user_id)).await?)
    }

    async fn add_notification(
        &self,
        user_id: &str,
        notification: NewNotification,
    ) -> BoardResult<Notification> {
        let user_id = user_id.to_string();
        Ok(self
            .call(move |db| db.create_notification(&user_id, &notification))
            .await?)
    }

    async fn mark_as_read(&self, notification_id: i64) -> BoardResult<()> {
        let marked = self
            .call(move |db| db.mark_notification_read(notification_id))
            .await?;
        if !marked {
            return Err(BoardError::NotFound {
                entity: "Notification",
                id: notification_id,
            });
        }
        Ok(())
    }

    async fn mark_all_as_read(&self, user_id: &str) -> BoardResult<()> {
        let user_id = user_id.to_string();
        self.call(move |db| db.mark_all_notifications_read(&user_id))
            .await?;
        Ok(())
    }

    async fn delete_older_than(&self, user_id: &str, days: u32) -> BoardResult<usize> {
        let user_id = user_id.to_string();
        let Some(cutoff) = retention_cutoff(Utc::now(), days) else {
            return Ok(0);
        };
        Ok(self
            .call(move |db| db.delete_notifications_before(&user_id, cutoff))
            .await?)
    }
}

/// Oldest timestamp kept by a purge of `days`. `None` when the window
/// reaches past the earliest representable date, so nothing can be older.
fn retention_cutoff(now: DateTime<Utc>, days: u32) -> Option<DateTime<Utc>> {
    Duration::try_days(i64::from(days)).and_then(|window| now.checked_sub_signed(window))
}
