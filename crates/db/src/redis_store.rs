//! Redis [`KvStore`] backend.
//!
//! Batches go through `MULTI`/`EXEC`, the list join is a single
//! `SORT … BY nosort GET`, and conditional updates are Lua scripts so the
//! check and the write happen in one server-side step.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::error::StoreError;
use crate::kv::{CasOutcome, JoinedRow, KvStore, WriteOp};

/// Returns 1 if the hash existed and the field was set, 0 otherwise.
const SET_EXISTING_SCRIPT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 0 then
  return 0
end
redis.call('HSET', KEYS[1], ARGV[1], ARGV[2])
return 1
";

/// Returns 1 when applied, 0 on mismatch, -1 when the hash is missing.
const COMPARE_AND_SET_SCRIPT: &str = r"
if redis.call('EXISTS', KEYS[1]) == 0 then
  return -1
end
if redis.call('HGET', KEYS[1], ARGV[1]) ~= ARGV[2] then
  return 0
end
redis.call('HSET', KEYS[1], ARGV[1], ARGV[3])
return 1
";

/// Redis-backed store. Cheap to clone; the connection manager reconnects on
/// its own.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl KvStore for RedisStore {
    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        let value: i64 = conn.incr(key, 1).await?;
        Ok(value)
    }

    async fn exec_atomic(&self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in &ops {
            match op {
                WriteOp::HashSet { key, fields } => {
                    pipe.hset_multiple(key, fields).ignore();
                }
                WriteOp::ListPush { key, value } => {
                    pipe.lpush(key, value).ignore();
                }
            }
        }
        let mut conn = self.conn.clone();
        let () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let mut conn = self.conn.clone();
        let map: HashMap<String, String> = conn.hgetall(key).await?;
        Ok(map)
    }

    async fn list_join(
        &self,
        list_key: &str,
        hash_prefix: &str,
        fields: &[&str],
    ) -> Result<Vec<JoinedRow>, StoreError> {
        let mut cmd = redis::cmd("SORT");
        cmd.arg(list_key).arg("BY").arg("nosort").arg("GET").arg("#");
        for field in fields {
            cmd.arg("GET").arg(format!("{hash_prefix}*->{field}"));
        }

        let mut conn = self.conn.clone();
        let flat: Vec<Option<String>> = cmd.query_async(&mut conn).await?;

        let width = fields.len() + 1;
        let rows = flat
            .chunks(width)
            .filter(|chunk| chunk.len() == width)
            .map(|chunk| JoinedRow {
                member: chunk[0].clone().unwrap_or_default(),
                values: chunk[1..].to_vec(),
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
        let mut conn = self.conn.clone();
        let applied: i64 = redis::Script::new(SET_EXISTING_SCRIPT)
            .key(key)
            .arg(field)
            .arg(value)
            .invoke_async(&mut conn)
            .await?;
        Ok(applied == 1)
    }

    async fn hash_compare_and_set(
        &self,
        key: &str,
        field: &str,
        expected: &str,
        new: &str,
    ) -> Result<CasOutcome, StoreError> {
        let mut conn = self.conn.clone();
        let outcome: i64 = redis::Script::new(COMPARE_AND_SET_SCRIPT)
            .key(key)
            .arg(field)
            .arg(expected)
            .arg(new)
            .invoke_async(&mut conn)
            .await?;
        Ok(match outcome {
            1 => CasOutcome::Applied,
            -1 => CasOutcome::Missing,
            _ => CasOutcome::Mismatch,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
