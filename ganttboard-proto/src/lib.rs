//! Shared data model for Ganttboard.
//!
//! Everything that crosses a process boundary lives here: the board
//! [`task::Task`] record, change-log events, catalog entries, the status
//! palette and the binary snapshot codec.

pub mod catalog;
pub mod codec;
pub mod event;
pub mod palette;
pub mod task;
