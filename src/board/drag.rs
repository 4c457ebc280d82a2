//! Drag-and-drop state machine over the board state.
//!
//! ```text
//! Idle ──drag_start──▶ Dragging ──drop_on(valid column)──▶ move_task ──▶ Idle
//!                          │
//!                          ├──drop_on(unknown column)──▶ Idle (no call)
//!                          └──cancel──────────────────▶ Idle
//! ```

use super::state::BoardState;
use crate::errors::BoardResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        task_id: i64,
        source_column_id: i64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    Moved {
        task_id: i64,
        from_column_id: i64,
        to_column_id: i64,
    },
    /// Dropped while idle or onto a column that is not on the board.
    Ignored,
}

#[derive(Debug, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    /// Pick up a task. Starting a new drag replaces any drag in progress.
    pub fn drag_start(&mut self, task_id: i64, source_column_id: i64) {
        tracing::debug!(task_id, source_column_id, "Drag started");
        self.state = DragState::Dragging {
            task_id,
            source_column_id,
        };
    }

    pub fn cancel(&mut self) {
        if self.state != DragState::Idle {
            tracing::debug!("Drag cancelled");
        }
        self.state = DragState::Idle;
    }

    /// Release the dragged task over `target_column_id`.
    ///
    /// The controller is idle again afterwards whatever the outcome,
    /// including when the move itself fails.
    pub async fn drop_on(
        &mut self,
        board: &mut BoardState,
        target_column_id: i64,
    ) -> BoardResult<DropOutcome> {
        let DragState::Dragging {
            task_id,
            source_column_id,
        } = std::mem::take(&mut self.state)
        else {
            tracing::debug!(target_column_id, "Drop while idle ignored");
            return Ok(DropOutcome::Ignored);
        };

        let target_known = board
            .board()
            .map(|b| b.column(target_column_id).is_some())
            .unwrap_or(false);
        if !target_known {
            tracing::debug!(task_id, target_column_id, "Drop on unknown column ignored");
            return Ok(DropOutcome::Ignored);
        }

        board
            .move_task(task_id, source_column_id, target_column_id)
            .await?;
        Ok(DropOutcome::Moved {
            task_id,
            from_column_id: source_column_id,
            to_column_id: target_column_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::models::NewTask;
    use crate::board::testing::{column_id, loaded_state};

    #[tokio::test]
    async fn test_drag_and_drop_moves_task_to_end_of_target() {
        let (mut board, gateway) = loaded_state().await;
        let todo = column_id(&board, "To Do");
        let done = column_id(&board, "Delivered");
        let mut ids = Vec::new();
        for title in ["a", "b", "c"] {
            ids.push(board.add_task(todo, NewTask::titled(title)).await.unwrap().id);
        }
        board.add_task(done, NewTask::titled("shipped")).await.unwrap();
        gateway.clear();

        let mut drag = DragController::new();
        drag.drag_start(ids[0], todo);
        assert!(matches!(drag.state(), DragState::Dragging { .. }));

        let outcome = drag.drop_on(&mut board, done).await.unwrap();
        assert_eq!(
            outcome,
            DropOutcome::Moved {
                task_id: ids[0],
                from_column_id: todo,
                to_column_id: done,
            }
        );
        assert_eq!(drag.state(), DragState::Idle);
        assert_eq!(gateway.count("move_task"), 1);

        let snapshot = board.board().unwrap();
        assert_eq!(snapshot.column(todo).unwrap().task_ids.len(), 2);
        assert_eq!(snapshot.column(done).unwrap().task_ids.len(), 2);
        assert_eq!(snapshot.task(ids[0]).unwrap().position, 1);
    }

    #[tokio::test]
    async fn test_drop_on_source_column_still_moves() {
        let (mut board, gateway) = loaded_state().await;
        let todo = column_id(&board, "To Do");
        let task = board.add_task(todo, NewTask::titled("a")).await.unwrap();
        gateway.clear();

        let mut drag = DragController::new();
        drag.drag_start(task.id, todo);
        let outcome = drag.drop_on(&mut board, todo).await.unwrap();
        assert!(matches!(outcome, DropOutcome::Moved { .. }));
        assert_eq!(gateway.count("move_task"), 1);
        assert_eq!(board.board().unwrap().column(todo).unwrap().task_ids, vec![task.id]);
    }

    #[tokio::test]
    async fn test_drop_on_unknown_column_is_ignored() {
        let (mut board, gateway) = loaded_state().await;
        let todo = column_id(&board, "To Do");
        let task = board.add_task(todo, NewTask::titled("a")).await.unwrap();
        gateway.clear();

        let mut drag = DragController::new();
        drag.drag_start(task.id, todo);
        let outcome = drag.drop_on(&mut board, 424242).await.unwrap();
        assert_eq!(outcome, DropOutcome::Ignored);
        assert_eq!(drag.state(), DragState::Idle);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_drop_while_idle_is_ignored() {
        let (mut board, gateway) = loaded_state().await;
        let todo = column_id(&board, "To Do");
        let mut drag = DragController::new();
        assert_eq!(drag.drop_on(&mut board, todo).await.unwrap(), DropOutcome::Ignored);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_returns_to_idle_without_calls() {
        let (mut board, gateway) = loaded_state().await;
        let todo = column_id(&board, "To Do");
        let mut drag = DragController::new();
        drag.drag_start(1, todo);
        drag.cancel();
        assert_eq!(drag.state(), DragState::Idle);
        assert_eq!(drag.drop_on(&mut board, todo).await.unwrap(), DropOutcome::Ignored);
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_move_leaves_controller_idle() {
        let (mut board, gateway) = loaded_state().await;
        let todo = column_id(&board, "To Do");
        let done = column_id(&board, "Delivered");
        let task = board.add_task(todo, NewTask::titled("a")).await.unwrap();
        gateway.fail_writes(true);

        let mut drag = DragController::new();
        drag.drag_start(task.id, todo);
        assert!(drag.drop_on(&mut board, done).await.is_err());
        assert_eq!(drag.state(), DragState::Idle);
        assert_eq!(board.board().unwrap().task(task.id).unwrap().column_id, todo);
    }
}
