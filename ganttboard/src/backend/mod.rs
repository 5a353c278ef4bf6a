//! Collaborators the board talks to.
//!
//! The board never owns storage. Tasks, the change log, the goods catalog
//! and the warehouse directory live behind the traits below so the same
//! engine runs against [`InMemoryBackend`] in tests and [`HttpBackend`]
//! against a `ganttboard-server` instance.

pub mod http;
pub mod memory;

pub use http::HttpBackend;
pub use memory::InMemoryBackend;

use std::future::Future;

use ganttboard_proto::catalog::Catalog;
use ganttboard_proto::event::ChangeEvent;
use ganttboard_proto::task::{Task, TaskId};

/// Errors reported by a collaborator.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum BackendError {
    /// The backend could not be reached.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend answered but refused the request.
    #[error("request rejected ({status}): {message}")]
    Rejected {
        /// HTTP-style status code.
        status: u16,
        /// Error text returned by the backend.
        message: String,
    },

    /// The referenced record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A response body could not be decoded.
    #[error("decode failed: {0}")]
    Decode(String),

    /// The configured server address is not a usable base URL.
    #[error("invalid server url: {0}")]
    InvalidUrl(String),
}

/// Task persistence.
///
/// `update` carries the full task and is idempotent.
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    fn create(&self, task: &Task) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Replaces a stored task with `task`.
    fn update(&self, task: &Task) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Removes a task.
    fn delete(&self, id: &TaskId) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Every stored task.
    fn list_all(&self) -> impl Future<Output = Result<Vec<Task>, BackendError>> + Send;
}

/// Change-log sink.
pub trait ChangeLog: Send + Sync {
    /// Records `event`. With `skip_persist` (and for every `view` event)
    /// the sink may observe the event but must not store it.
    fn record(
        &self,
        event: &ChangeEvent,
        skip_persist: bool,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}

/// Goods catalog lookup.
pub trait GoodsCatalog: Send + Sync {
    /// Goods grouped by category.
    fn list_categorized(&self) -> impl Future<Output = Result<Catalog, BackendError>> + Send;
}

/// Warehouse directory lookup.
pub trait WarehouseDirectory: Send + Sync {
    /// Names of all warehouses.
    fn list_warehouses(&self) -> impl Future<Output = Result<Vec<String>, BackendError>> + Send;
}
