//! Board HTTP server command — `ledgerboard serve`.

use anyhow::Result;
use ledgerboard::board::server::{ServerConfig, start_server};
use ledgerboard::config::AppConfig;

pub async fn cmd_serve(config: AppConfig, port: Option<u16>, dev: bool) -> Result<()> {
    if let Some(url) = config.remote() {
        tracing::warn!(%url, "Remote gateway ignored by serve, using the local database");
    }

    start_server(ServerConfig {
        port: port.unwrap_or(config.toml.server.port),
        db_path: config.db_file(),
        seed: config.toml.board.to_seed(),
        dev_mode: dev || config.toml.server.dev,
    })
    .await
}
