//! Data-access contract consumed by the board engine.
//!
//! Implementations translate shapes only; ordering, validation and append
//! positions are decided by the callers in `state`, `clients` and
//! `notifications`.

use async_trait::async_trait;

use super::models::*;
use crate::errors::BoardResult;

#[async_trait]
pub trait Gateway: Send + Sync {
    /// Fetch the user's board, creating it with the default columns on
    /// first access.
    async fn get_board(&self, user_id: &str) -> BoardResult<Board>;

    async fn add_column(&self, board_id: i64, title: &str, position: i32) -> BoardResult<Column>;

    async fn update_column(&self, column_id: i64, update: ColumnUpdate) -> BoardResult<()>;

    /// Deletes the column and every task that references it.
    async fn delete_column(&self, column_id: i64) -> BoardResult<()>;

    async fn add_task(&self, column_id: i64, task: NewTask, position: i32) -> BoardResult<Task>;

    async fn delete_task(&self, task_id: i64) -> BoardResult<()>;

    async fn move_task(&self, task_id: i64, column_id: i64, position: i32) -> BoardResult<()>;

    async fn get_clients(&self, user_id: &str) -> BoardResult<Vec<Client>>;

    async fn add_client(&self, user_id: &str, client: ClientFields) -> BoardResult<Client>;

    async fn update_client(&self, client_id: i64, client: ClientFields) -> BoardResult<()>;

    async fn delete_client(&self, client_id: i64) -> BoardResult<()>;

    /// Newest first.
    async fn get_notifications(&self, user_id: &str) -> BoardResult<Vec<Notification>>;

    async fn add_notification(
        &self,
        user_id: &str,
        notification: NewNotification,
    ) -> BoardResult<Notification>;

    async fn mark_as_read(&self, notification_id: i64) -> BoardResult<()>;

    async fn mark_all_as_read(&self, user_id: &str) -> BoardResult<()>;

    /// Returns the number of notifications removed.
    async fn delete_older_than(&self, user_id: &str, days: u32) -> BoardResult<usize>;
}
