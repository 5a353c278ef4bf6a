//! Change-log events emitted by the board.
//!
//! Events are built with the `with_*` methods and handed to the change-log
//! collaborator. `View` events are telemetry only and never reach the
//! persisted history.

use serde::{Deserialize, Serialize};

use crate::task::TaskId;

/// What happened to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A task or its first order was created.
    Create,
    /// A field, quantity, placement or status changed.
    Edit,
    /// A task was deleted or an item dropped to zero.
    Delete,
    /// Something was looked at; never persisted.
    View,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Create => write!(f, "create"),
            Self::Edit => write!(f, "edit"),
            Self::Delete => write!(f, "delete"),
            Self::View => write!(f, "view"),
        }
    }
}

/// A single change-log record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// Event kind.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Task the event belongs to.
    pub task_id: TaskId,
    /// Value before the change, already formatted for display.
    #[serde(default)]
    pub old_value: Option<String>,
    /// Value after the change, already formatted for display.
    #[serde(default)]
    pub new_value: Option<String>,
    /// Order item concerned, if any.
    #[serde(default)]
    pub item_name: Option<String>,
    /// Warehouse concerned, if any.
    #[serde(default)]
    pub warehouse_name: Option<String>,
    /// Status color involved in a status toggle.
    #[serde(default)]
    pub color_value: Option<String>,
    /// Human readable description.
    #[serde(default)]
    pub comment: Option<String>,
    /// Who made the change.
    #[serde(default)]
    pub user: Option<String>,
    /// Milliseconds since epoch.
    pub timestamp: u64,
}

impl ChangeEvent {
    /// Creates an event of `kind` for `task_id` with no details.
    #[must_use]
    pub const fn new(kind: EventKind, task_id: TaskId, timestamp: u64) -> Self {
        Self {
            kind,
            task_id,
            old_value: None,
            new_value: None,
            item_name: None,
            warehouse_name: None,
            color_value: None,
            comment: None,
            user: None,
            timestamp,
        }
    }

    /// Sets the before/after values.
    #[must_use]
    pub fn with_values(mut self, old: impl Into<String>, new: impl Into<String>) -> Self {
        self.old_value = Some(old.into());
        self.new_value = Some(new.into());
        self
    }

    /// Sets the item name.
    #[must_use]
    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.item_name = Some(item.into());
        self
    }

    /// Sets the warehouse name.
    #[must_use]
    pub fn with_warehouse(mut self, warehouse: impl Into<String>) -> Self {
        self.warehouse_name = Some(warehouse.into());
        self
    }

    /// Sets the status color.
    #[must_use]
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color_value = Some(color.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Sets the acting user.
    #[must_use]
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Whether the event is view-only telemetry.
    #[must_use]
    pub fn is_view(&self) -> bool {
        self.kind == EventKind::View
    }
}

/// Body of a change-log submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRequest {
    /// The event itself.
    #[serde(flatten)]
    pub event: ChangeEvent,
    /// Telemetry only; the server must not store it.
    #[serde(default)]
    pub skip_persist: bool,
}

impl LogRequest {
    /// Whether the history should keep this event.
    #[must_use]
    pub fn is_persistable(&self) -> bool {
        !self.skip_persist && !self.event.is_view()
    }
}

/// A stored change-log entry, stamped by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// The recorded event.
    #[serde(flatten)]
    pub event: ChangeEvent,
    /// Local wall-clock time of receipt, `%Y.%m.%d %H:%M:%S`.
    pub date_time: String,
}
