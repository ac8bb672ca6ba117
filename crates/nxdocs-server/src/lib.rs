//! NetExec docs HTTP server.
//!
//! Wires the storage backend and HTTP routes into a running Axum server.
//! Serves the JSON API at `/api/*`.

pub mod config;
pub mod error;
pub mod normalize;
pub mod routes;
pub mod state;
