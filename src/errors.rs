//! Typed error hierarchy for the board engine.
//!
//! `BoardError` is the single error type crossing the gateway seam:
//! - `Validation` — rejected before any gateway call
//! - `NotFound` / `ColumnTitleNotFound` — referenced entity is gone
//! - `Persistence` — the backing store failed; the mutation is dropped

use thiserror::Error;

/// Errors raised by the board state model, its gateways and the generators.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("Column '{title}' not found")]
    ColumnTitleNotFound { title: String },

    #[error("Board has not been loaded")]
    NotLoaded,

    #[error("Persistence error: {0}")]
    Persistence(#[source] anyhow::Error),
}

impl BoardError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn column_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: "Column",
            id,
        }
    }

    pub fn task_not_found(id: i64) -> Self {
        Self::NotFound { entity: "Task", id }
    }

    pub fn client_not_found(id: i64) -> Self {
        Self::NotFound {
            entity: "Client",
            id,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::ColumnTitleNotFound { .. }
        )
    }
}

impl From<anyhow::Error> for BoardError {
    fn from(err: anyhow::Error) -> Self {
        Self::Persistence(err)
    }
}

pub type BoardResult<T> = std::result::Result<T, BoardError>;

/// Reject blank required text fields, returning the trimmed value.
pub fn require_text(field: &str, value: &str) -> BoardResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BoardError::validation(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}
