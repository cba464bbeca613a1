//! Suggestor API server library.
//!
//! Exposes the building blocks (config, state, sessions, the moderation
//! engine, routes) so integration tests and the binary entrypoint share
//! them.

pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod routes;
pub mod session;
pub mod state;
pub mod views;
