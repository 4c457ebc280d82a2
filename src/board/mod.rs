//! Board engine: kanban of accounting obligations per client.
//!
//! ## Overview
//!
//! One board per user, seeded with the accounting pipeline columns. Tasks
//! carry a snapshot of the client they belong to, the obligation type, the
//! competence month and a due date. Each mutation goes through the
//! [`Gateway`](gateway::Gateway) and is followed by a full reload of the
//! board.
//!
//! ## Module Map
//!
//! ```text
//! ┌──────────┐          ┌─────────────────────────────────────────────────┐
//! │  CLI     │ ───────> │  drag.rs   (DragController, Idle/Dragging)      │
//! │ (cmd/*)  │          │     │                                           │
//! └──────────┘          │     v                                           │
//!                       │  state.rs  (BoardState, Session)  <── view.rs   │
//!                       │     ^  │                              (filters, │
//!                       │     │  │                               KPIs)    │
//!                       │  obligations.rs  clients.rs  notifications.rs   │
//!                       │        │                                        │
//!                       │        v                                        │
//!                       │  gateway.rs (Gateway trait)                     │
//!                       │     ├─ db.rs      (SQLite, DbHandle)            │
//!                       │     └─ remote.rs  (HTTP client) ──┐             │
//!                       │                                   │ HTTP        │
//!                       │  server.rs / api.rs (axum) <──────┘             │
//!                       └─────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod clients;
pub mod db;
pub mod drag;
pub mod gateway;
pub mod models;
pub mod notifications;
pub mod obligations;
pub mod remote;
pub mod server;
pub mod state;
#[cfg(test)]
pub(crate) mod testing;
pub mod view;
