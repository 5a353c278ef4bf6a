//! Binary board snapshots.
//!
//! A snapshot is the whole task list encoded with postcard behind a
//! version number, used to export a board to a file and load it back.

use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u16 = 1;

/// Error type for snapshot encode/decode operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// The snapshot was written by an incompatible format version.
    #[error("unsupported snapshot version {found} (expected {SNAPSHOT_VERSION})")]
    UnsupportedVersion {
        /// Version found in the input.
        found: u16,
    },
}

/// Every task on a board at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// Format version, always [`SNAPSHOT_VERSION`] when produced here.
    pub version: u16,
    /// Milliseconds since epoch when the snapshot was taken.
    pub exported_at: u64,
    /// Tasks on the board.
    pub tasks: Vec<Task>,
}

impl BoardSnapshot {
    /// Wraps `tasks` in a snapshot of the current version.
    #[must_use]
    pub const fn new(tasks: Vec<Task>, exported_at: u64) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            exported_at,
            tasks,
        }
    }
}

/// Encodes a [`BoardSnapshot`] into a byte vector using postcard.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the snapshot cannot be serialized.
pub fn encode(snapshot: &BoardSnapshot) -> Result<Vec<u8>, CodecError> {
    postcard::to_allocvec(snapshot).map_err(|e| CodecError::Serialization(e.to_string()))
}

/// Decodes a [`BoardSnapshot`] from a byte slice using postcard.
///
/// # Errors
///
/// Returns `CodecError::Serialization` if the bytes cannot be deserialized,
/// or `CodecError::UnsupportedVersion` if the version does not match.
pub fn decode(bytes: &[u8]) -> Result<BoardSnapshot, CodecError> {
    let snapshot: BoardSnapshot =
        postcard::from_bytes(bytes).map_err(|e| CodecError::Serialization(e.to_string()))?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(CodecError::UnsupportedVersion {
            found: snapshot.version,
        });
    }
    Ok(snapshot)
}
