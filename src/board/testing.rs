//! Test doubles shared by the board engine's unit tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::db::{BoardDb, DbHandle};
use super::gateway::Gateway;
use super::models::*;
use super::state::{BoardState, Session};
use crate::errors::{BoardError, BoardResult};

/// In-memory store that records every gateway call by name and can be
/// switched to fail all writes, or every write after the next `n`.
pub struct RecordingGateway {
    inner: DbHandle,
    calls: Mutex<Vec<&'static str>>,
    fail_writes: AtomicBool,
    writes_left: Mutex<Option<usize>>,
}

impl RecordingGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: DbHandle::new(BoardDb::new_in_memory().expect("in-memory db")),
            calls: Mutex::new(Vec::new()),
            fail_writes: AtomicBool::new(false),
            writes_left: Mutex::new(None),
        })
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| **c == name).count()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Let the next `n` writes through, then fail every write.
    pub fn fail_after(&self, n: usize) {
        *self.writes_left.lock().unwrap() = Some(n);
    }

    pub fn clear_fail_after(&self) {
        *self.writes_left.lock().unwrap() = None;
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }

    fn write(&self, name: &'static str) -> BoardResult<()> {
        self.record(name);
        let exhausted = match self.writes_left.lock().unwrap().as_mut() {
            Some(0) => true,
            Some(left) => {
                *left -= 1;
                false
            }
            None => false,
        };
        if exhausted || self.fail_writes.load(Ordering::SeqCst) {
            return Err(BoardError::Persistence(anyhow::anyhow!(
                "store unavailable during {}",
                name
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Gateway for RecordingGateway {
    async fn get_board(&self, user_id: &str) -> BoardResult<Board> {
        self.record("get_board");
        self.inner.get_board(user_id).await
    }

    async fn add_column(&self, board_id: i64, title: &str, position: i32) -> BoardResult<Column> {
        self.write("add_column")?;
        self.inner.add_column(board_id, title, position).await
    }

    async fn update_column(&self, column_id: i64, update: ColumnUpdate) -> BoardResult<()> {
        self.write("update_column")?;
        self.inner.update_column(column_id, update).await
    }

    async fn delete_column(&self, column_id: i64) -> BoardResult<()> {
        self.write("delete_column")?;
        self.inner.delete_column(column_id).await
    }

    async fn add_task(&self, column_id: i64, task: NewTask, position: i32) -> BoardResult<Task> {
        self.write("add_task")?;
        self.inner.add_task(column_id, task, position).await
    }

    async fn delete_task(&self, task_id: i64) -> BoardResult<()> {
        self.write("delete_task")?;
        self.inner.delete_task(task_id).await
    }

    async fn move_task(&self, task_id: i64, column_id: i64, position: i32) -> BoardResult<()> {
        self.write("move_task")?;
        self.inner.move_task(task_id, column_id, position).await
    }

    async fn get_clients(&self, user_id: &str) -> BoardResult<Vec<Client>> {
        self.record("get_clients");
        self.inner.get_clients(user_id).await
    }

    async fn add_client(&self, user_id: &str, client: ClientFields) -> BoardResult<Client> {
        self.write("add_client")?;
        self.inner.add_client(user_id, client).await
    }

    async fn update_client(&self, client_id: i64, client: ClientFields) -> BoardResult<()> {
        self.write("update_client")?;
        self.inner.update_client(client_id, client).await
    }

    async fn delete_client(&self, client_id: i64) -> BoardResult<()> {
        self.write("delete_client")?;
        self.inner.delete_client(client_id).await
    }

    async fn get_notifications(&self, user_id: &str) -> BoardResult<Vec<Notification>> {
        self.record("get_notifications");
        self.inner.get_notifications(user_id).await
    }

    async fn add_notification(
        &self,
        user_id: &str,
        notification: NewNotification,
    ) -> BoardResult<Notification> {
        self.write("add_notification")?;
        self.inner.add_notification(user_id, notification).await
    }

    async fn mark_as_read(&self, notification_id: i64) -> BoardResult<()> {
        self.write("mark_as_read")?;
        self.inner.mark_as_read(notification_id).await
    }

    async fn mark_all_as_read(&self, user_id: &str) -> BoardResult<()> {
        self.write("mark_all_as_read")?;
        self.inner.mark_all_as_read(user_id).await
    }

    async fn delete_older_than(&self, user_id: &str, days: u32) -> BoardResult<usize> {
        self.write("delete_older_than")?;
        self.inner.delete_older_than(user_id, days).await
    }
}

/// A loaded board state for user "tester" over a fresh recording store.
pub async fn loaded_state() -> (BoardState, Arc<RecordingGateway>) {
    let gateway = RecordingGateway::new();
    let mut state = BoardState::new(gateway.clone(), Session::new("tester"));
    state.load().await.expect("load board");
    gateway.clear();
    (state, gateway)
}

/// Id of the column with the given title in the loaded board.
pub fn column_id(state: &BoardState, title: &str) -> i64 {
    state
        .board()
        .expect("board loaded")
        .column_by_title(title)
        .unwrap_or_else(|| panic!("no column {}", title))
        .id
}
