//! In-memory board model for one user session.
//!
//! Every mutation validates against the loaded snapshot, forwards a single
//! intent to the gateway and then reloads the whole board. If any gateway
//! call fails the previous snapshot stays current and the error is returned.

use std::sync::Arc;

use super::gateway::Gateway;
use super::models::{Board, Column, ColumnUpdate, NewTask, Task};
use crate::errors::{BoardError, BoardResult, require_text};

/// Identity of the user whose board is being worked on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

pub struct BoardState {
    gateway: Arc<dyn Gateway>,
    session: Session,
    board: Option<Board>,
}

impl BoardState {
    pub fn new(gateway: Arc<dyn Gateway>, session: Session) -> Self {
        Self {
            gateway,
            session,
            board: None,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn gateway(&self) -> &Arc<dyn Gateway> {
        &self.gateway
    }

    /// The current snapshot, or `NotLoaded` before the first `load`.
    pub fn board(&self) -> BoardResult<&Board> {
        self.board.as_ref().ok_or(BoardError::NotLoaded)
    }

    /// Fetch the user's board, creating it on first access.
    pub async fn load(&mut self) -> BoardResult<&Board> {
        self.reload().await?;
        self.board()
    }

    async fn reload(&mut self) -> BoardResult<()> {
        let board = self.gateway.get_board(&self.session.user_id).await?;
        tracing::debug!(
            board_id = board.id,
            columns = board.columns.len(),
            tasks = board.tasks.len(),
            "Board reloaded"
        );
        self.board = Some(board);
        Ok(())
    }

    fn require_column(&self, column_id: i64) -> BoardResult<&Column> {
        self.board()?
            .column(column_id)
            .ok_or(BoardError::column_not_found(column_id))
    }

    fn require_task(&self, task_id: i64) -> BoardResult<&Task> {
        self.board()?
            .task(task_id)
            .ok_or(BoardError::task_not_found(task_id))
    }

    /// Resolve a column by exact title in the loaded snapshot.
    pub fn column_named(&self, title: &str) -> BoardResult<&Column> {
        self.board()?
            .column_by_title(title)
            .ok_or_else(|| BoardError::ColumnTitleNotFound {
                title: title.to_string(),
            })
    }

    pub async fn add_column(&mut self, title: &str) -> BoardResult<Column> {
        let title = require_text("Column title", title)?;
        let board = self.board()?;
        let (board_id, position) = (board.id, board.next_column_position());

        let column = self
            .gateway
            .add_column(board_id, &title, position)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Failed to add column"))?;
        tracing::info!(column_id = column.id, title = %column.title, position, "Column added");
        self.reload().await?;
        Ok(column)
    }

    pub async fn rename_column(&mut self, column_id: i64, title: &str) -> BoardResult<()> {
        let title = require_text("Column title", title)?;
        self.require_column(column_id)?;

        let update = ColumnUpdate {
            title: Some(title.clone()),
            position: None,
        };
        self.gateway
            .update_column(column_id, update)
            .await
            .inspect_err(|e| tracing::warn!(column_id, error = %e, "Failed to rename column"))?;
        tracing::info!(column_id, title = %title, "Column renamed");
        self.reload().await
    }

    /// Removes the column together with every task in it.
    pub async fn remove_column(&mut self, column_id: i64) -> BoardResult<()> {
        let task_count = self.require_column(column_id)?.task_ids.len();

        self.gateway
            .delete_column(column_id)
            .await
            .inspect_err(|e| tracing::warn!(column_id, error = %e, "Failed to remove column"))?;
        tracing::info!(column_id, tasks_removed = task_count, "Column removed");
        self.reload().await
    }

    /// Append a task to the end of `column_id`.
    pub async fn add_task(&mut self, column_id: i64, mut task: NewTask) -> BoardResult<Task> {
        task.title = require_text("Task title", &task.title)?;
        self.require_column(column_id)?;
        let position = self.board()?.next_task_position(column_id);

        let created = self
            .gateway
            .add_task(column_id, task, position)
            .await
            .inspect_err(|e| tracing::warn!(column_id, error = %e, "Failed to add task"))?;
        tracing::info!(task_id = created.id, column_id, position, "Task added");
        self.reload().await?;
        Ok(created)
    }

    /// Append many tasks to `column_id` in order, reloading once at the end.
    ///
    /// All rows are validated before the first write. Writes are sequential
    /// and not transactional: on failure the rows already written stay and
    /// the snapshot is left as it was before the batch.
    pub async fn add_tasks(&mut self, column_id: i64, rows: Vec<NewTask>) -> BoardResult<usize> {
        let mut validated = Vec::with_capacity(rows.len());
        for (index, mut row) in rows.into_iter().enumerate() {
            row.title = require_text(&format!("Row {} title", index + 1), &row.title)?;
            validated.push(row);
        }
        self.require_column(column_id)?;
        if validated.is_empty() {
            return Ok(0);
        }

        let mut position = self.board()?.next_task_position(column_id);
        let total = validated.len();
        for (index, row) in validated.into_iter().enumerate() {
            self.gateway
                .add_task(column_id, row, position)
                .await
                .inspect_err(|e| {
                    tracing::warn!(column_id, written = index, total, error = %e, "Batch import aborted")
                })?;
            position += 1;
        }
        tracing::info!(column_id, count = total, "Tasks imported");
        self.reload().await?;
        Ok(total)
    }

    pub async fn remove_task(&mut self, task_id: i64) -> BoardResult<()> {
        self.require_task(task_id)?;

        self.gateway
            .delete_task(task_id)
            .await
            .inspect_err(|e| tracing::warn!(task_id, error = %e, "Failed to remove task"))?;
        tracing::info!(task_id, "Task removed");
        self.reload().await
    }

    /// Move a task to the end of `to_column_id`. A move into the column the
    /// task already sits in is still written.
    pub async fn move_task(
        &mut self,
        task_id: i64,
        from_column_id: i64,
        to_column_id: i64,
    ) -> BoardResult<()> {
        let current = self.require_task(task_id)?.column_id;
        if current != from_column_id {
            return Err(BoardError::validation(format!(
                "Task {} is not in column {}",
                task_id, from_column_id
            )));
        }
        self.require_column(to_column_id)?;
        let position = self.board()?.next_task_position(to_column_id);

        if from_column_id == to_column_id {
            tracing::debug!(task_id, column_id = to_column_id, "No-op move, writing anyway");
        }
        self.gateway
            .move_task(task_id, to_column_id, position)
            .await
            .inspect_err(|e| tracing::warn!(task_id, error = %e, "Failed to move task"))?;
        tracing::info!(
            task_id,
            from = from_column_id,
            to = to_column_id,
            position,
            "Task moved"
        );
        self.reload().await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::board::testing::{RecordingGateway, column_id, loaded_state};

    fn assert_task_ids_disjoint(board: &Board) {
        let mut seen = HashSet::new();
        for column in &board.columns {
            for id in &column.task_ids {
                assert!(seen.insert(*id), "task {} listed in two columns", id);
            }
        }
    }

    #[tokio::test]
    async fn test_mutation_before_load_is_not_loaded() {
        let gateway = RecordingGateway::new();
        let mut state = BoardState::new(gateway.clone(), Session::new("u"));
        let err = state.add_column("Archive").await.unwrap_err();
        assert!(matches!(err, BoardError::NotLoaded));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_add_column_appends_and_reloads() {
        let (mut state, gateway) = loaded_state().await;
        let column = state.add_column("  Archive ").await.unwrap();
        assert_eq!(column.title, "Archive");
        assert_eq!(column.position, 5);
        assert_eq!(gateway.calls(), vec!["add_column", "get_board"]);

        let board = state.board().unwrap();
        assert_eq!(board.columns.last().unwrap().title, "Archive");
    }

    #[tokio::test]
    async fn test_blank_titles_never_reach_gateway() {
        let (mut state, gateway) = loaded_state().await;
        let todo = column_id(&state, "To Do");

        assert!(matches!(
            state.add_column("   ").await,
            Err(BoardError::Validation(_))
        ));
        assert!(matches!(
            state.rename_column(todo, "").await,
            Err(BoardError::Validation(_))
        ));
        assert!(matches!(
            state.add_task(todo, NewTask::titled(" ")).await,
            Err(BoardError::Validation(_))
        ));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rename_column() {
        let (mut state, _) = loaded_state().await;
        let review = column_id(&state, "In Review");
        state.rename_column(review, "Checking").await.unwrap();
        assert_eq!(
            state.board().unwrap().column(review).unwrap().title,
            "Checking"
        );
    }

    #[tokio::test]
    async fn test_remove_column_drops_exactly_its_tasks() {
        let (mut state, _) = loaded_state().await;
        let todo = column_id(&state, "To Do");
        let waiting = column_id(&state, "Awaiting Client");
        for title in ["a", "b", "c"] {
            state.add_task(todo, NewTask::titled(title)).await.unwrap();
        }
        let kept = state.add_task(waiting, NewTask::titled("d")).await.unwrap();

        state.remove_column(todo).await.unwrap();
        let board = state.board().unwrap();
        assert!(board.column(todo).is_none());
        assert_eq!(board.tasks.len(), 1);
        assert_eq!(board.column(waiting).unwrap().task_ids, vec![kept.id]);
    }

    #[tokio::test]
    async fn test_add_task_appends_at_end() {
        let (mut state, _) = loaded_state().await;
        let todo = column_id(&state, "To Do");
        let first = state.add_task(todo, NewTask::titled("first")).await.unwrap();
        let second = state.add_task(todo, NewTask::titled("second")).await.unwrap();
        assert_eq!(first.position, 0);
        assert_eq!(second.position, 1);
        assert_eq!(
            state.board().unwrap().column(todo).unwrap().task_ids,
            vec![first.id, second.id]
        );
    }

    #[tokio::test]
    async fn test_add_task_to_unknown_column_is_not_found() {
        let (mut state, gateway) = loaded_state().await;
        let err = state.add_task(9999, NewTask::titled("x")).await.unwrap_err();
        assert!(matches!(err, BoardError::NotFound { entity: "Column", .. }));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_move_task_between_columns() {
        let (mut state, gateway) = loaded_state().await;
        let todo = column_id(&state, "To Do");
        let done = column_id(&state, "Delivered");
        let mut ids = Vec::new();
        for title in ["a", "b", "c"] {
            ids.push(state.add_task(todo, NewTask::titled(title)).await.unwrap().id);
        }
        state.add_task(done, NewTask::titled("d")).await.unwrap();
        gateway.clear();

        state.move_task(ids[1], todo, done).await.unwrap();
        assert_eq!(gateway.calls(), vec!["move_task", "get_board"]);

        let board = state.board().unwrap();
        assert_eq!(board.column(todo).unwrap().task_ids.len(), 2);
        assert_eq!(board.column(done).unwrap().task_ids.len(), 2);
        assert_eq!(board.task(ids[1]).unwrap().position, 1);
        assert_eq!(board.column(done).unwrap().task_ids[1], ids[1]);
        assert_task_ids_disjoint(board);
    }

    #[tokio::test]
    async fn test_move_to_same_column_still_writes() {
        let (mut state, gateway) = loaded_state().await;
        let todo = column_id(&state, "To Do");
        let a = state.add_task(todo, NewTask::titled("a")).await.unwrap();
        state.add_task(todo, NewTask::titled("b")).await.unwrap();
        gateway.clear();

        state.move_task(a.id, todo, todo).await.unwrap();
        assert_eq!(gateway.count("move_task"), 1);
        let board = state.board().unwrap();
        assert_eq!(board.column(todo).unwrap().task_ids.len(), 2);
        assert_eq!(board.task(a.id).unwrap().column_id, todo);
    }

    #[tokio::test]
    async fn test_move_from_wrong_column_is_rejected() {
        let (mut state, gateway) = loaded_state().await;
        let todo = column_id(&state, "To Do");
        let done = column_id(&state, "Delivered");
        let a = state.add_task(todo, NewTask::titled("a")).await.unwrap();
        gateway.clear();

        let err = state.move_task(a.id, done, todo).await.unwrap_err();
        assert!(matches!(err, BoardError::Validation(_)));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_gateway_failure_keeps_prior_snapshot() {
        let (mut state, gateway) = loaded_state().await;
        let todo = column_id(&state, "To Do");
        state.add_task(todo, NewTask::titled("a")).await.unwrap();
        let before = state.board().unwrap().clone();

        gateway.fail_writes(true);
        gateway.clear();
        let err = state.add_task(todo, NewTask::titled("b")).await.unwrap_err();
        assert!(matches!(err, BoardError::Persistence(_)));
        assert_eq!(gateway.calls(), vec!["add_task"], "no reload after failure");
        assert_eq!(state.board().unwrap(), &before);

        assert!(state.remove_column(todo).await.is_err());
        assert_eq!(state.board().unwrap(), &before);
    }

    #[tokio::test]
    async fn test_add_tasks_batch_reloads_once() {
        let (mut state, gateway) = loaded_state().await;
        let todo = column_id(&state, "To Do");
        state.add_task(todo, NewTask::titled("existing")).await.unwrap();
        gateway.clear();

        let rows = vec![NewTask::titled("one"), NewTask::titled("two"), NewTask::titled("three")];
        let count = state.add_tasks(todo, rows).await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(gateway.count("add_task"), 3);
        assert_eq!(gateway.count("get_board"), 1);

        let board = state.board().unwrap();
        let titles: Vec<&str> = board
            .tasks_in(todo)
            .iter()
            .map(|t| t.title.as_str())
            .collect();
        assert_eq!(titles, vec!["existing", "one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_add_tasks_rejects_any_blank_row_before_writing() {
        let (mut state, gateway) = loaded_state().await;
        let todo = column_id(&state, "To Do");
        let rows = vec![NewTask::titled("ok"), NewTask::titled("")];
        let err = state.add_tasks(todo, rows).await.unwrap_err();
        assert!(err.to_string().contains("Row 2"));
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_add_tasks_failure_partway_keeps_written_rows() {
        let (mut state, gateway) = loaded_state().await;
        let todo = column_id(&state, "To Do");
        let rows: Vec<NewTask> = ["a", "b", "c", "d"].into_iter().map(NewTask::titled).collect();

        gateway.fail_after(2);
        let err = state.add_tasks(todo, rows).await.unwrap_err();
        assert!(matches!(err, BoardError::Persistence(_)));
        assert_eq!(gateway.count("add_task"), 3);
        assert_eq!(gateway.count("get_board"), 0);
        assert!(state.board().unwrap().tasks.is_empty());

        let stored = state.gateway().get_board("tester").await.unwrap();
        let titles: Vec<&str> = stored.tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b"]);

        gateway.clear_fail_after();
        state.load().await.unwrap();
        assert_eq!(state.board().unwrap().column(todo).unwrap().task_ids.len(), 2);
    }

    #[tokio::test]
    async fn test_column_named() {
        let (state, _) = loaded_state().await;
        assert_eq!(state.column_named("In Progress").unwrap().position, 2);
        let err = state.column_named("Done").unwrap_err();
        assert!(matches!(err, BoardError::ColumnTitleNotFound { .. }));
    }
}
