use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ledgerboard::board::models::{Priority, TaxRegime};
use ledgerboard::board::view::StatusFilter;
use ledgerboard::config::AppConfig;

mod cmd;

#[derive(Parser)]
#[command(name = "ledgerboard")]
#[command(version, about = "Kanban board for client tax obligations")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Board owner. Overrides [session].user in config.toml
    #[arg(long, global = true, env = "LEDGERBOARD_USER")]
    pub user: Option<String>,

    /// Directory holding config.toml, the database and notification marks
    #[arg(long, global = true, default_value = ".ledgerboard")]
    pub data_dir: PathBuf,

    /// Talk to a running `ledgerboard serve` instead of the local database
    #[arg(long, global = true, env = "LEDGERBOARD_REMOTE")]
    pub remote: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default config.toml and create the board
    Init {
        /// Overwrite an existing config.toml
        #[arg(long)]
        force: bool,
    },
    /// Show the board with KPIs, optionally filtered
    Board {
        /// Only tasks of this client id
        #[arg(long)]
        client: Option<i64>,
        /// Only tasks of this obligation type
        #[arg(long)]
        obligation: Option<String>,
        /// all, overdue, urgent or on-track
        #[arg(long, default_value = "all")]
        status: StatusFilter,
        /// Substring of the client name
        #[arg(long)]
        search: Option<String>,
        /// Print the view as JSON
        #[arg(long)]
        json: bool,
        /// Evaluate due dates against this day instead of today (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Manage board columns
    Column {
        #[command(subcommand)]
        command: ColumnCommands,
    },
    /// Manage tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },
    /// Manage the client registry
    Client {
        #[command(subcommand)]
        command: ClientCommands,
    },
    /// Create this month's obligation tasks for every client
    Generate {
        /// Only generate for this client id
        #[arg(long)]
        client: Option<i64>,
        /// Generate as if today were this day (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Notification inbox and due-date checks
    Notify {
        #[command(subcommand)]
        command: NotifyCommands,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Serve the board store over HTTP
    Serve {
        #[arg(long)]
        port: Option<u16>,
        /// Bind to all interfaces and allow any origin
        #[arg(long)]
        dev: bool,
    },
}

#[derive(Subcommand, Clone)]
pub enum ColumnCommands {
    /// Append a column at the right edge
    Add { title: String },
    /// Rename a column (by title, or by id when no title matches)
    Rename { column: String, title: String },
    /// Remove a column and all of its tasks
    Remove { column: String },
}

#[derive(Subcommand, Clone)]
pub enum TaskCommands {
    /// Append a task to a column (by title, or by id when no title matches)
    Add {
        column: String,
        title: String,
        /// Attach a registered client (id); copies its name and CNPJ
        #[arg(long)]
        client: Option<i64>,
        #[arg(long)]
        obligation: Option<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
        /// Reporting period, MM/YYYY
        #[arg(long)]
        competence: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        observations: Option<String>,
    },
    /// Delete a task
    Remove { id: i64 },
    /// Move a task to the end of another column (by title, or by id when no title matches)
    Move { id: i64, to: String },
    /// Append tasks from a JSON array file to a column
    Import { column: String, file: PathBuf },
}

#[derive(Subcommand, Clone)]
pub enum ClientCommands {
    /// List clients ordered by name
    List {
        /// Filter by name or CNPJ
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Register a client
    Add {
        name: String,
        #[arg(long)]
        cnpj: Option<String>,
        /// Simples Nacional, Lucro Presumido, Lucro Real or MEI
        #[arg(long)]
        regime: Option<TaxRegime>,
        /// Comma-separated obligation types, e.g. "PGDAS,FGTS". Defaults to
        /// the obligations suggested for --regime
        #[arg(long)]
        obligations: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Change a client; omitted fields keep their value
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        cnpj: Option<String>,
        #[arg(long)]
        regime: Option<TaxRegime>,
        #[arg(long)]
        obligations: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Delete a client. Tasks keep their client snapshot
    Remove { id: i64 },
    /// Register clients from a JSON array file
    Import { file: PathBuf },
}

#[derive(Subcommand, Clone)]
pub enum NotifyCommands {
    /// List notifications, newest first
    List {
        #[arg(long)]
        unread: bool,
        #[arg(long)]
        json: bool,
    },
    /// Mark one notification as read
    Read { id: i64 },
    /// Mark every notification as read
    ReadAll,
    /// Delete notifications older than N days
    Purge {
        /// Defaults to [notifications].retention_days
        #[arg(long)]
        days: Option<u32>,
    },
    /// Run the scheduled checks once, now
    Check,
    /// Run the scheduled checks until ctrl-c
    Watch,
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::with_cli_args(
        cli.data_dir.clone(),
        cli.user.clone(),
        cli.remote.clone(),
        cli.verbose,
    )?;
    ledgerboard::logging::init(config.toml.logging.format, cli.verbose);

    match &cli.command {
        Commands::Init { force } => cmd::cmd_init(config, *force).await?,
        Commands::Board {
            client,
            obligation,
            status,
            search,
            json,
            today,
        } => {
            let criteria = ledgerboard::board::view::FilterCriteria {
                client_id: *client,
                obligation_type: obligation.clone(),
                status: *status,
                search: search.clone(),
            };
            cmd::cmd_board(config, criteria, *today, *json).await?
        }
        Commands::Column { command } => cmd::cmd_column(config, command.clone()).await?,
        Commands::Task { command } => cmd::cmd_task(config, command.clone()).await?,
        Commands::Client { command } => cmd::cmd_client(config, command.clone()).await?,
        Commands::Generate { client, today } => cmd::cmd_generate(config, *client, *today).await?,
        Commands::Notify { command } => cmd::cmd_notify(config, command.clone()).await?,
        Commands::Config { command } => cmd::cmd_config(&config, command.clone())?,
        Commands::Serve { port, dev } => cmd::cmd_serve(config, *port, *dev).await?,
    }

    Ok(())
}
