//! Configuration read from `.ledgerboard/config.toml`.
//!
//! Every field has a default, so a missing file or a partial file is valid.
//! Settings are layered file → environment → CLI; the environment and CLI
//! layers arrive together through clap (`LEDGERBOARD_USER`,
//! `LEDGERBOARD_REMOTE`).
//!
//! # Configuration File Format
//!
//! ```toml
//! [board]
//! title = "My Board"
//! columns = ["To Do", "Awaiting Client", "In Progress", "In Review", "Delivered"]
//!
//! [obligations]
//! intake_column = "To Do"
//! default_due_day = 15
//!
//! [obligations.due_days]
//! PGDAS = 20
//! FGTS = 7
//! "Folha de Pagamento" = 7
//!
//! [notifications]
//! morning = "08:00"
//! evening = "17:00"
//! poll_interval_secs = 60
//! retention_days = 90
//!
//! [server]
//! port = 3141
//! dev = false
//!
//! [gateway]
//! url = "http://127.0.0.1:3141"
//!
//! [session]
//! user = "local"
//!
//! [logging]
//! format = "pretty"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::board::db::BoardSeed;
use crate::board::notifications::Schedule;
use crate::board::obligations::{ObligationRules, default_due_days};
use crate::logging::LogFormat;

pub const CONFIG_FILE: &str = "config.toml";
pub const DB_FILE: &str = "board.db";
pub const WATERMARKS_FILE: &str = "watermarks.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSection {
    #[serde(default = "default_board_title")]
    pub title: String,
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,
}

fn default_board_title() -> String {
    "My Board".to_string()
}

fn default_columns() -> Vec<String> {
    BoardSeed::default().columns
}

impl Default for BoardSection {
    fn default() -> Self {
        Self {
            title: default_board_title(),
            columns: default_columns(),
        }
    }
}

impl BoardSection {
    pub fn to_seed(&self) -> BoardSeed {
        BoardSeed {
            title: self.title.clone(),
            columns: self.columns.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObligationsSection {
    #[serde(default = "default_intake_column")]
    pub intake_column: String,
    #[serde(default = "default_due_day")]
    pub default_due_day: u32,
    #[serde(default = "default_due_days")]
    pub due_days: BTreeMap<String, u32>,
}

fn default_intake_column() -> String {
    "To Do".to_string()
}

fn default_due_day() -> u32 {
    15
}

impl Default for ObligationsSection {
    fn default() -> Self {
        Self {
            intake_column: default_intake_column(),
            default_due_day: default_due_day(),
            due_days: default_due_days(),
        }
    }
}

impl ObligationsSection {
    pub fn to_rules(&self) -> ObligationRules {
        ObligationRules {
            intake_column: self.intake_column.clone(),
            default_due_day: self.default_due_day,
            due_days: self.due_days.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationsSection {
    /// `HH:MM`, local time.
    #[serde(default = "default_morning")]
    pub morning: String,
    /// `HH:MM`, local time.
    #[serde(default = "default_evening")]
    pub evening: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_morning() -> String {
    "08:00".to_string()
}

fn default_evening() -> String {
    "17:00".to_string()
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_retention_days() -> u32 {
    90
}

impl Default for NotificationsSection {
    fn default() -> Self {
        Self {
            morning: default_morning(),
            evening: default_evening(),
            poll_interval_secs: default_poll_interval_secs(),
            retention_days: default_retention_days(),
        }
    }
}

fn parse_checkpoint(name: &str, value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .with_context(|| format!("Invalid {} time '{}': expected HH:MM", name, value))
}

impl NotificationsSection {
    pub fn to_schedule(&self) -> Result<Schedule> {
        Ok(Schedule {
            morning: parse_checkpoint("morning", &self.morning)?,
            evening: parse_checkpoint("evening", &self.evening)?,
        })
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_port")]
    pub port: u16,
    /// Permissive CORS for a front-end served from another origin.
    #[serde(default)]
    pub dev: bool,
}

fn default_port() -> u16 {
    3141
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            dev: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewaySection {
    /// Base URL of a `ledgerboard serve` instance. Unset means the local
    /// database is used directly.
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSection {
    #[serde(default = "default_user")]
    pub user: String,
}

fn default_user() -> String {
    "local".to_string()
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            user: default_user(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingSection {
    #[serde(default)]
    pub format: LogFormat,
}

/// The complete config.toml structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerToml {
    #[serde(default)]
    pub board: BoardSection,
    #[serde(default)]
    pub obligations: ObligationsSection,
    #[serde(default)]
    pub notifications: NotificationsSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub gateway: GatewaySection,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

impl LedgerToml {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config.toml")
    }

    /// Returns the default configuration if the file doesn't exist.
    pub fn load_or_default(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config.toml")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate the configuration and return any warnings.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.board.columns.iter().any(|c| c.trim().is_empty()) {
            warnings.push("Blank column title in [board].columns".to_string());
        }
        if !self
            .board
            .columns
            .iter()
            .any(|c| c == &self.obligations.intake_column)
        {
            warnings.push(format!(
                "Intake column '{}' is not one of the default columns",
                self.obligations.intake_column
            ));
        }
        if !(1..=31).contains(&self.obligations.default_due_day) {
            warnings.push(format!(
                "default_due_day {} is outside 1..=31",
                self.obligations.default_due_day
            ));
        }
        for (obligation, day) in &self.obligations.due_days {
            if !(1..=31).contains(day) {
                warnings.push(format!(
                    "Due day {} for '{}' is outside 1..=31",
                    day, obligation
                ));
            }
        }
        if let Err(e) = self.notifications.to_schedule() {
            warnings.push(e.to_string());
        }

        warnings
    }
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub toml: LedgerToml,
    /// CLI/env override for `[session].user`.
    pub cli_user: Option<String>,
    /// CLI/env override for `[gateway].url`.
    pub cli_remote: Option<String>,
    pub verbose: bool,
}

impl AppConfig {
    pub fn load(data_dir: PathBuf) -> Result<Self> {
        let toml = LedgerToml::load_or_default(&data_dir)?;
        Ok(Self {
            data_dir,
            toml,
            cli_user: None,
            cli_remote: None,
            verbose: false,
        })
    }

    pub fn with_cli_args(
        data_dir: PathBuf,
        user: Option<String>,
        remote: Option<String>,
        verbose: bool,
    ) -> Result<Self> {
        let mut config = Self::load(data_dir)?;
        config.cli_user = user;
        config.cli_remote = remote;
        config.verbose = verbose;
        Ok(config)
    }

    /// User id (CLI/env → file → default).
    pub fn user(&self) -> String {
        self.cli_user
            .clone()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| self.toml.session.user.clone())
    }

    /// Remote gateway URL (CLI/env → file), if any.
    pub fn remote(&self) -> Option<String> {
        self.cli_remote
            .clone()
            .or_else(|| self.toml.gateway.url.clone())
            .filter(|u| !u.trim().is_empty())
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    pub fn db_file(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }

    pub fn watermarks_file(&self) -> PathBuf {
        self.data_dir.join(WATERMARKS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_file_yields_defaults() {
        let config = LedgerToml::parse("").unwrap();
        assert_eq!(config, LedgerToml::default());
        assert_eq!(config.board.title, "My Board");
        assert_eq!(config.board.columns.len(), 5);
        assert_eq!(config.obligations.intake_column, "To Do");
        assert_eq!(config.obligations.due_days.get("PGDAS"), Some(&20));
        assert_eq!(config.notifications.retention_days, 90);
        assert_eq!(config.server.port, 3141);
        assert_eq!(config.session.user, "local");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = LedgerToml::parse(
            r#"
            [obligations]
            intake_column = "Inbox"

            [obligations.due_days]
            DCTFWeb = 15

            [board]
            columns = ["Inbox", "Done"]

            [logging]
            format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.board.title, "My Board");
        assert_eq!(config.obligations.default_due_day, 15);
        assert_eq!(config.obligations.due_days.len(), 1);
        assert_eq!(config.logging.format, LogFormat::Json);

        let rules = config.obligations.to_rules();
        assert_eq!(rules.intake_column, "Inbox");
        assert_eq!(rules.due_day("PGDAS"), 15);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_schedule_parsing() {
        let section = NotificationsSection {
            morning: "07:30".into(),
            ..NotificationsSection::default()
        };
        let schedule = section.to_schedule().unwrap();
        assert_eq!(schedule.morning, NaiveTime::from_hms_opt(7, 30, 0).unwrap());
        assert_eq!(schedule, Schedule {
            morning: NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
            evening: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        });

        let bad = NotificationsSection {
            evening: "5pm".into(),
            ..NotificationsSection::default()
        };
        assert!(bad.to_schedule().is_err());
    }

    #[test]
    fn test_validate_reports_problems() {
        let mut config = LedgerToml::default();
        config.obligations.intake_column = "Inbox".into();
        config.obligations.due_days.insert("X".into(), 40);
        config.notifications.morning = "25:00".into();
        let warnings = config.validate();
        assert_eq!(warnings.len(), 3);
        assert!(warnings.iter().any(|w| w.contains("Inbox")));
        assert!(warnings.iter().any(|w| w.contains("'X'")));
        assert!(warnings.iter().any(|w| w.contains("morning")));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let mut config = LedgerToml::default();
        config.server.port = 8080;
        config.gateway.url = Some("http://board.local:3141".into());
        config.save(&dir.path().join(CONFIG_FILE)).unwrap();

        let loaded = LedgerToml::load_or_default(dir.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempdir().unwrap();
        let loaded = LedgerToml::load_or_default(dir.path()).unwrap();
        assert_eq!(loaded, LedgerToml::default());
    }

    #[test]
    fn test_cli_overrides_file() {
        let dir = tempdir().unwrap();
        let mut file = LedgerToml::default();
        file.session.user = "ana".into();
        file.gateway.url = Some("http://file:3141".into());
        file.save(&dir.path().join(CONFIG_FILE)).unwrap();

        let config = AppConfig::load(dir.path().to_path_buf()).unwrap();
        assert_eq!(config.user(), "ana");
        assert_eq!(config.remote().as_deref(), Some("http://file:3141"));

        let config = AppConfig::with_cli_args(
            dir.path().to_path_buf(),
            Some("bruno".into()),
            Some("http://cli:3141".into()),
            true,
        )
        .unwrap();
        assert_eq!(config.user(), "bruno");
        assert_eq!(config.remote().as_deref(), Some("http://cli:3141"));
        assert!(config.verbose);
        assert_eq!(config.db_file(), dir.path().join("board.db"));
    }
}
