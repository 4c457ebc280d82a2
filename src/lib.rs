//! Kanban board and client obligation tracker for accounting practices.
//!
//! The [`board`] module holds the engine; [`config`], [`errors`] and
//! [`logging`] are shared with the `ledgerboard` binary.

pub mod board;
pub mod config;
pub mod errors;
pub mod logging;
