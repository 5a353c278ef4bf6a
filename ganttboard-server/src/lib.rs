//! Ganttboard server library.
//!
//! Exposes the HTTP backend for use in tests and embedding. The server
//! stores tasks, the change history, the goods catalog and the warehouse
//! list as JSON files in one data directory.

pub mod catalog;
pub mod config;
pub mod history;
pub mod server;
pub mod tasks;

use std::path::PathBuf;

/// Errors raised by the file-backed stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing a data file failed.
    #[error("{path}: {source}")]
    Io {
        /// File that was accessed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A data file did not contain valid JSON.
    #[error("{path}: {source}")]
    Json {
        /// File that was parsed.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },
}

/// Reads a JSON file, treating a missing or empty file as `T::default()`.
pub(crate) async fn read_json<T>(path: &std::path::Path) -> Result<T, StoreError>
where
    T: serde::de::DeserializeOwned + Default,
{
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(&bytes).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Pretty-prints `value` into `path`, creating the parent directory.
pub(crate) async fn write_json<T: serde::Serialize + Sync>(
    path: &std::path::Path,
    value: &T,
) -> Result<(), StoreError> {
    let io_error = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
    }
    let bytes = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    tokio::fs::write(path, bytes).await.map_err(io_error)
}
