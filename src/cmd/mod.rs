//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module          | Commands handled                                   |
//! |-----------------|-----------------------------------------------------|
//! | `init`          | `Init`                                             |
//! | `board`         | `Board`                                            |
//! | `column`        | `Column add/rename/remove`                         |
//! | `task`          | `Task add/remove/move/import`                      |
//! | `client`        | `Client list/add/update/remove/import`             |
//! | `generate`      | `Generate`                                         |
//! | `notify`        | `Notify list/read/read-all/purge/check/watch`      |
//! | `config`        | `Config show/validate`                             |
//! | `serve`         | `Serve`                                            |

pub mod board;
pub mod client;
pub mod column;
pub mod config;
pub mod generate;
pub mod init;
pub mod notify;
pub mod serve;
pub mod task;

pub use board::cmd_board;
pub use client::cmd_client;
pub use column::cmd_column;
pub use config::cmd_config;
pub use generate::cmd_generate;
pub use init::cmd_init;
pub use notify::cmd_notify;
pub use serve::cmd_serve;
pub use task::cmd_task;

use std::sync::Arc;

use anyhow::{Context, Result};
use ledgerboard::board::clients::ClientDirectory;
use ledgerboard::board::db::{BoardDb, DbHandle};
use ledgerboard::board::gateway::Gateway;
use ledgerboard::board::models::Column;
use ledgerboard::board::notifications::NotificationCenter;
use ledgerboard::board::remote::HttpGateway;
use ledgerboard::board::state::{BoardState, Session};
use ledgerboard::config::AppConfig;
use ledgerboard::errors::BoardError;

/// Everything a command needs: resolved config, the session and the
/// gateway selected for it (local database or remote server).
pub struct Workspace {
    pub config: AppConfig,
    pub session: Session,
    pub gateway: Arc<dyn Gateway>,
}

impl Workspace {
    pub fn open(config: AppConfig) -> Result<Self> {
        let session = Session::new(config.user());
        let gateway: Arc<dyn Gateway> = match config.remote() {
            Some(url) => {
                tracing::debug!(%url, "Using remote gateway");
                Arc::new(HttpGateway::new(url))
            }
            None => {
                std::fs::create_dir_all(&config.data_dir).with_context(|| {
                    format!("Failed to create data directory: {}", config.data_dir.display())
                })?;
                let db = BoardDb::new(&config.db_file())
                    .context("Failed to open board database")?
                    .with_seed(config.toml.board.to_seed());
                Arc::new(DbHandle::new(db))
            }
        };
        Ok(Self {
            config,
            session,
            gateway,
        })
    }

    /// Board state for the session, already loaded.
    pub async fn board_state(&self) -> Result<BoardState> {
        let mut state = BoardState::new(self.gateway.clone(), self.session.clone());
        state.load().await?;
        Ok(state)
    }

    pub fn clients(&self) -> ClientDirectory {
        ClientDirectory::new(self.gateway.clone(), self.session.clone())
    }

    pub fn notifications(&self) -> Result<NotificationCenter> {
        let schedule = self.config.toml.notifications.to_schedule()?;
        Ok(NotificationCenter::new(
            self.gateway.clone(),
            self.session.clone(),
            schedule,
        ))
    }
}

/// Resolve a column by exact title, falling back to its id.
pub fn resolve_column<'a>(state: &'a BoardState, column: &str) -> Result<&'a Column> {
    let board = state.board()?;
    board
        .column_by_title(column)
        .or_else(|| column.parse::<i64>().ok().and_then(|id| board.column(id)))
        .ok_or_else(|| {
            BoardError::ColumnTitleNotFound {
                title: column.to_string(),
            }
            .into()
        })
}

/// Read a JSON array from a file.
pub fn read_json_rows<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> Result<Vec<T>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {} as a JSON array", path.display()))
}

/// Split a comma-separated list, dropping blanks.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
