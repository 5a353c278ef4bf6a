//! `Ganttboard` — order and warehouse reconciliation engine for a
//! Gantt-style scheduling board.

pub mod backend;
pub mod board;
pub mod config;
pub mod geometry;
pub mod interaction;
pub mod reconcile;
pub mod warehouse;
