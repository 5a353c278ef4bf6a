//! Server settings.
//!
//! Flags (and their `GANTTBOARD_*` variables) win over
//! `~/.config/ganttboard-server/config.toml`, which wins over the defaults.

use std::path::{Path, PathBuf};

use crate::history::DEFAULT_HISTORY_LIMIT;

/// Why server settings could not be assembled.
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
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerConfigFile {
    server: ServerFileConfig,
}

/// `[server]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    bind_addr: Option<String>,
    data_dir: Option<PathBuf>,
    retention_days: Option<u32>,
    history_limit: Option<usize>,
}

/// Server command-line flags.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Ganttboard HTTP server")]
pub struct ServerCliArgs {
    /// Address to bind the server to.
    #[arg(short, long, env = "GANTTBOARD_ADDR")]
    pub bind: Option<String>,

    /// Directory holding tasks, history, goods and warehouse files.
    #[arg(short, long, env = "GANTTBOARD_DATA")]
    pub data_dir: Option<PathBuf>,

    /// Settings file to use instead of the default one.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Tasks starting more than this many days ago are deleted on listing.
    #[arg(long)]
    pub retention_days: Option<u32>,

    /// Number of change-history entries kept.
    #[arg(long)]
    pub history_limit: Option<usize>,

    /// Tracing filter directive.
    #[arg(long, default_value = "info", env = "GANTTBOARD_LOG")]
    pub log_level: String,
}

/// Server settings after every layer has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Listen address.
    pub bind_addr: String,
    /// Data directory.
    pub data_dir: PathBuf,
    /// Task retention window in days.
    pub retention_days: u32,
    /// Change-history cap.
    pub history_limit: usize,
    /// Tracing filter directive.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            data_dir: default_data_dir(),
            retention_days: 90,
            history_limit: DEFAULT_HISTORY_LIMIT,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Builds the effective settings. The default settings file may be
    /// absent; one named with `--config` must exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a settings file cannot be read or parsed.
    pub fn load(cli: &ServerCliArgs) -> Result<Self, ConfigError> {
        let file = read_settings(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    fn resolve(cli: &ServerCliArgs, file: &ServerConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: cli
                .bind
                .clone()
                .or_else(|| file.server.bind_addr.clone())
                .unwrap_or(defaults.bind_addr),
            data_dir: cli
                .data_dir
                .clone()
                .or_else(|| file.server.data_dir.clone())
                .unwrap_or(defaults.data_dir),
            retention_days: cli
                .retention_days
                .or(file.server.retention_days)
                .unwrap_or(defaults.retention_days),
            history_limit: cli
                .history_limit
                .or(file.server.history_limit)
                .unwrap_or(defaults.history_limit),
            log_level: cli.log_level.clone(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from("data"), |d| d.join("ganttboard"))
}

fn read_settings(explicit: Option<&Path>) -> Result<ServerConfigFile, ConfigError> {
    let default_path =
        || dirs::config_dir().map(|dir| dir.join("ganttboard-server").join("config.toml"));
    let Some(path) = explicit.map(Path::to_path_buf).or_else(default_path) else {
        return Ok(ServerConfigFile::default());
    };
    match std::fs::read_to_string(&path) {
        Ok(text) => Ok(toml::from_str(&text)?),
        Err(source) if explicit.is_none() && source.kind() == std::io::ErrorKind::NotFound => {
            Ok(ServerConfigFile::default())
        }
        Err(source) => Err(ConfigError::ReadFile { path, source }),
    }
}
