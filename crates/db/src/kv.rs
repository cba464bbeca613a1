//! The key-value store capability.
//!
//! Only the handful of operations the queue needs are exposed, and each one
//! maps to a single atomic server-side operation. All cross-request
//! coordination happens here; callers take no locks of their own.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::StoreError;

/// One write inside an atomic batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Set the given fields of a hash, creating it if needed.
    HashSet {
        key: String,
        fields: Vec<(String, String)>,
    },
    /// Push a value onto the head of a list.
    ListPush { key: String, value: String },
}

/// Result of a conditional single-field update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// The field held the expected value and now holds the new one.
    Applied,
    /// The field held some other value; nothing was written.
    Mismatch,
    /// The hash does not exist; nothing was written.
    Missing,
}

/// A list member joined against the fields of its hash.
///
/// `values[i]` corresponds to the `i`-th requested field and is `None` when
/// the field (or the whole hash) is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRow {
    pub member: String,
    pub values: Vec<Option<String>>,
}

impl JoinedRow {
    /// True when none of the requested fields exist.
    pub fn is_orphan(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

#[async_trait]
pub trait KvStore: Send + Sync {
    /// Atomically increment a counter and return the new value.
    async fn incr(&self, key: &str) -> Result<i64, StoreError>;

    /// Apply every op or none of them. Readers never observe a partial batch.
    async fn exec_atomic(&self, ops: Vec<WriteOp>) -> Result<(), StoreError>;

    /// All fields of a hash. An absent hash yields an empty map.
    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    /// Read a list head-first and join each member against
    /// `hash_prefix + member`, fetching `fields`, in one round-trip.
    async fn list_join(
        &self,
        list_key: &str,
        hash_prefix: &str,
        fields: &[&str],
    ) -> Result<Vec<JoinedRow>, StoreError>;

    /// Set one field of an existing hash. Returns `false` and writes nothing
    /// when the hash does not exist.
    async fn hash_set_existing(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError>;

    /// Set one field only if it currently holds `expected`.
    async fn hash_compare_and_set(
        &self,
        key: &str,
        field: &str,
        expected: &str,
        new: &str,
    ) -> Result<CasOutcome, StoreError>;

    /// Round-trip check.
    async fn ping(&self) -> Result<(), StoreError>;
}
