//! Client settings and command-line surface.
//!
//! A value is taken from the first layer that sets it: command-line flag
//! (or its `GANTTBOARD_*` environment variable), then
//! `~/.config/ganttboard/config.toml`, then the board defaults. The
//! default file may be absent; a file named with `--config` must exist.

use std::path::{Path, PathBuf};

use ganttboard_proto::task::DEFAULT_TASK_DAYS;

use crate::board::{BoardSettings, DEFAULT_ROWS};
use crate::geometry::{DEFAULT_COLUMN_WIDTH, DEFAULT_FORWARD_DAYS, DEFAULT_HISTORY_DAYS};

/// Server used when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

/// Why client settings could not be assembled.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The settings file exists but could not be read.
    #[error("cannot read {path}: {source}")]
    ReadFile {
        /// File that was opened.
        path: PathBuf,
        /// I/O failure.
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for this schema.
    #[error("invalid settings file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// The server URL is not an absolute http(s) URL.
    #[error("invalid server url {url:?}: {reason}")]
    InvalidUrl {
        /// Configured value.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Settings file; every key is optional
// ---------------------------------------------------------------------------

/// Contents of `config.toml`.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    server: ServerFileConfig,
    user: UserFileConfig,
    board: BoardFileConfig,
    log: LogFileConfig,
}

/// `[server]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    url: Option<String>,
}

/// `[user]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UserFileConfig {
    name: Option<String>,
}

/// `[board]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct BoardFileConfig {
    column_width: Option<f64>,
    history_days: Option<u32>,
    forward_days: Option<u32>,
    rows: Option<u32>,
    default_task_days: Option<f64>,
}

/// `[log]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct LogFileConfig {
    debug: Option<bool>,
}

// ---------------------------------------------------------------------------
// Effective settings
// ---------------------------------------------------------------------------

/// Client settings after every layer has been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Base URL of the `ganttboard-server` instance.
    pub server_url: String,
    /// Name stamped on change-log events.
    pub user: Option<String>,
    /// Width of one day column in pixels.
    pub column_width: f64,
    /// Days shown before today.
    pub history_days: u32,
    /// Days shown after today.
    pub forward_days: u32,
    /// Number of board rows.
    pub rows: u32,
    /// Duration of a new task in days.
    pub default_task_days: f64,
    /// Verbose logging.
    pub debug: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            user: None,
            column_width: DEFAULT_COLUMN_WIDTH,
            history_days: DEFAULT_HISTORY_DAYS,
            forward_days: DEFAULT_FORWARD_DAYS,
            rows: DEFAULT_ROWS,
            default_task_days: DEFAULT_TASK_DAYS,
            debug: false,
        }
    }
}

impl ClientConfig {
    /// Builds the effective settings for this invocation.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an unreadable or malformed settings
    /// file, a missing `--config` file, or an unusable server URL.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = read_settings(cli.config.as_deref())?;
        let config = Self::resolve(cli, &file);
        config.validate()?;
        Ok(config)
    }

    /// Layers `cli` over `file` over the defaults.
    #[must_use]
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            server_url: cli
                .server_url
                .clone()
                .or_else(|| file.server.url.clone())
                .unwrap_or(defaults.server_url),
            user: cli.user.clone().or_else(|| file.user.name.clone()),
            column_width: cli
                .column_width
                .or(file.board.column_width)
                .unwrap_or(defaults.column_width),
            history_days: file.board.history_days.unwrap_or(defaults.history_days),
            forward_days: file.board.forward_days.unwrap_or(defaults.forward_days),
            rows: file.board.rows.unwrap_or(defaults.rows),
            default_task_days: file
                .board
                .default_task_days
                .unwrap_or(defaults.default_task_days),
            debug: cli.debug || file.log.debug.unwrap_or(defaults.debug),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidUrl {
            url: self.server_url.clone(),
            reason,
        };
        let url = url::Url::parse(&self.server_url).map_err(|e| invalid(e.to_string()))?;
        if matches!(url.scheme(), "http" | "https") {
            Ok(())
        } else {
            Err(invalid(format!("unsupported scheme {}", url.scheme())))
        }
    }

    /// Settings for a [`Board`](crate::board::Board) built from this
    /// configuration.
    #[must_use]
    pub fn board_settings(&self) -> BoardSettings {
        BoardSettings {
            user: self.user.clone(),
            column_width: self.column_width,
            history_days: self.history_days,
            forward_days: self.forward_days,
            rows: self.rows,
            default_task_days: self.default_task_days,
            ..BoardSettings::default()
        }
    }

    /// Log filter implied by `--log-level` and the debug switch.
    #[must_use]
    pub fn log_filter<'a>(&self, requested: &'a str) -> &'a str {
        if self.debug { "debug" } else { requested }
    }
}

/// Command-line flags and the subcommand to run.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Gantt-style scheduling board with order and warehouse tracking")]
pub struct CliArgs {
    /// Base URL of the board server.
    #[arg(long, env = "GANTTBOARD_URL")]
    pub server_url: Option<String>,

    /// Name recorded on change-log events.
    #[arg(long, env = "GANTTBOARD_USER")]
    pub user: Option<String>,

    /// Width of one day column in pixels.
    #[arg(long)]
    pub column_width: Option<f64>,

    /// Settings file to use instead of `~/.config/ganttboard/config.toml`.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Tracing filter directive, e.g. `info` or `ganttboard=debug`.
    #[arg(long, default_value = "info", env = "GANTTBOARD_LOG")]
    pub log_level: String,

    /// Where to write the log (default: `$TMPDIR/ganttboard.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,

    /// What to do.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Board commands.
#[derive(clap::Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List tasks.
    List,
    /// Add a task.
    Add {
        /// Board row.
        #[arg(long, default_value_t = 0)]
        row: u32,
        /// Start date (`YYYY-MM-DD`, default today).
        #[arg(long)]
        start: Option<chrono::NaiveDate>,
    },
    /// Move a task by whole days.
    Move {
        /// Task id.
        id: String,
        /// Days to move (negative moves back).
        #[arg(allow_hyphen_values = true)]
        days: i64,
    },
    /// Resize a task to a visible duration in days.
    Resize {
        /// Task id.
        id: String,
        /// New visible duration in days.
        days: f64,
    },
    /// Replace a task's comment.
    Comment {
        /// Task id.
        id: String,
        /// New comment text.
        text: String,
    },
    /// Edit a task's order with `ITEM=QTY` pairs (0 removes an item).
    Order {
        /// Task id.
        id: String,
        /// Quantities to set.
        #[arg(value_parser = parse_assignment)]
        items: Vec<(String, i64)>,
    },
    /// Replace a task's order from the goods catalog.
    CatalogOrder {
        /// Task id.
        id: String,
        /// Catalog items and quantities.
        #[arg(value_parser = parse_assignment)]
        items: Vec<(String, i64)>,
    },
    /// Show a task's order.
    ShowOrder {
        /// Task id.
        id: String,
    },
    /// Advance an order item's status color.
    ItemStatus {
        /// Task id.
        id: String,
        /// Item name.
        item: String,
    },
    /// Allocate ordered items to a warehouse with `ITEM=QTY` pairs.
    Allocate {
        /// Task id.
        id: String,
        /// Warehouse name.
        warehouse: String,
        /// Quantities to store there.
        #[arg(value_parser = parse_assignment)]
        items: Vec<(String, i64)>,
    },
    /// Advance a warehouse's status color.
    WarehouseStatus {
        /// Task id.
        id: String,
        /// Warehouse name.
        warehouse: String,
    },
    /// Show per-warehouse totals.
    Summary {
        /// Task id.
        id: String,
    },
    /// List goods and warehouses known to the server.
    Catalog,
    /// Show the change history.
    History,
    /// Delete a task.
    Delete {
        /// Task id.
        id: String,
    },
    /// Write all tasks to a binary snapshot file.
    Export {
        /// Output file.
        path: PathBuf,
    },
    /// Load tasks from a snapshot file.
    Import {
        /// Input file.
        path: PathBuf,
    },
}

/// Parses `ITEM=QTY`.
fn parse_assignment(raw: &str) -> Result<(String, i64), String> {
    let (item, qty) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected ITEM=QTY, got {raw:?}"))?;
    let item = item.trim();
    if item.is_empty() {
        return Err(format!("missing item name in {raw:?}"));
    }
    let qty = qty
        .trim()
        .parse::<i64>()
        .map_err(|e| format!("bad quantity in {raw:?}: {e}"))?;
    Ok((item.to_string(), qty))
}

/// `~/.config/ganttboard/config.toml`, if the platform has a config dir.
fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ganttboard").join("config.toml"))
}

/// Reads the settings file. `explicit` must exist; the default file may not.
fn read_settings(explicit: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => match default_settings_path() {
            Some(path) => (path, false),
            None => return Ok(ConfigFile::default()),
        },
    };
    match std::fs::read_to_string(&path) {
        Ok(text) => Ok(toml::from_str(&text)?),
        Err(source) if !required && source.kind() == std::io::ErrorKind::NotFound => {
            Ok(ConfigFile::default())
        }
        Err(source) => Err(ConfigError::ReadFile { path, source }),
    }
}
