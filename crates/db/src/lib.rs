//! Key-value persistence for the moderation queue.
//!
//! The store itself is a capability ([`KvStore`]) with a Redis backend for
//! deployments and an in-memory backend for tests and local development.
//! [`repositories::EditQueue`] builds the edit queue on top of it.

use std::sync::Arc;

pub mod error;
pub mod kv;
pub mod memory;
pub mod models;
pub mod redis_store;
pub mod repositories;

pub use error::StoreError;
pub use kv::{CasOutcome, JoinedRow, KvStore, WriteOp};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Shared handle to whichever backend was configured.
pub type StoreHandle = Arc<dyn KvStore>;

/// URL selecting the in-memory backend.
pub const MEMORY_URL: &str = "memory://";

/// Connect to the store named by `url`.
///
/// `memory://` selects [`MemoryStore`]; anything else is handed to the
/// Redis client (`redis://`, `unix://`). No TLS backend is compiled in, so
/// `rediss://` URLs are rejected.
pub async fn connect(url: &str) -> Result<StoreHandle, StoreError> {
    if url == MEMORY_URL {
        tracing::warn!("Using in-memory key-value store; queued edits are lost on restart");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let store = RedisStore::connect(url).await?;
    Ok(Arc::new(store))
}

/// Verify the store answers a round-trip.
pub async fn health_check(store: &dyn KvStore) -> Result<(), StoreError> {
    store.ping().await
}
