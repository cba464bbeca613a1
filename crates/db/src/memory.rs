//! In-process [`KvStore`] backend.
//!
//! Every operation takes the same lock, which makes batches trivially
//! atomic. Used by the test suites and by `REDIS_URL=memory://`.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::kv::{CasOutcome, JoinedRow, KvStore, WriteOp};

#[derive(Default)]
struct Inner {
    counters: HashMap<String, i64>,
    hashes: HashMap<String, HashMap<String, String>>,
    lists: HashMap<String, VecDeque<String>>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with [`StoreError::Unavailable`]
    /// (or succeed again when `false`).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Remove a key of any type. Stands in for out-of-band expiry.
    pub async fn delete(&self, key: &str) {
        let mut inner = self.inner.lock().await;
        inner.counters.remove(key);
        inner.hashes.remove(key);
        inner.lists.remove(key);
    }

    /// Current contents of a list, head first.
    pub async fn list(&self, key: &str) -> Vec<String> {
        let inner = self.inner.lock().await;
        inner
            .lists
            .get(key)
            .map(|l| l.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.check()?;
        let mut inner = self.inner.lock().await;
        let counter = inner.counters.entry(key.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }

    async fn exec_atomic(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        self.check()?;
        let mut inner = self.inner.lock().await;
        for op in ops {
            match op {
                WriteOp::HashSet { key, fields } => {
                    inner.hashes.entry(key).or_default().extend(fields);
                }
                WriteOp::ListPush { key, value } => {
                    inner.lists.entry(key).or_default().push_front(value);
                }
            }
        }
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        self.check()?;
        let inner = self.inner.lock().await;
        Ok(inner.hashes.get(key).cloned().unwrap_or_default())
    }

    async fn list_join(
        &self,
        list_key: &str,
        hash_prefix: &str,
        fields: &[&str],
    ) -> Result<Vec<JoinedRow>, StoreError> {
        self.check()?;
        let inner = self.inner.lock().await;
        let Some(list) = inner.lists.get(list_key) else {
            return Ok(Vec::new());
        };
        let rows = list
            .iter()
            .map(|member| {
                let hash = inner.hashes.get(&format!("{hash_prefix}{member}"));
                let values = fields
                    .iter()
                    .map(|f| hash.and_then(|h| h.get(*f).cloned()))
                    .collect();
                JoinedRow {
                    member: member.clone(),
                    values,
                }
            })
            .collect();
        Ok(rows)
    }

    async fn hash_set_existing(
        &self,
        key: &str,
        field: &str,
        value: &str,
    ) -> Result<bool, StoreError> {
        self.check()?;
        let mut inner = self.inner.lock().await;
        match inner.hashes.get_mut(key) {
            Some(hash) => {
                hash.insert(field.to_string(), value.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn hash_compare_and_set(
        &self,
        key: &str,
        field: &str,
        expected: &str,
        new: &str,
    ) -> Result<CasOutcome, StoreError> {
        self.check()?;
        let mut inner = self.inner.lock().await;
        let Some(hash) = inner.hashes.get_mut(key) else {
            return Ok(CasOutcome::Missing);
        };
        if hash.get(field).map(String::as_str) != Some(expected) {
            return Ok(CasOutcome::Mismatch);
        }
        hash.insert(field.to_string(), new.to_string());
        Ok(CasOutcome::Applied)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }
}
