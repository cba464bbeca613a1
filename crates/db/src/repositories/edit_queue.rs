//! The pending-edit queue.
//!
//! Layout under the configured prefix:
//!
//! ```text
//! <prefix>uids        counter, sole source of edit ids
//! <prefix>edit:<id>   hash of edit fields (see models::edit)
//! <prefix>edits       list of ids, newest at the head
//! ```

use suggestor_core::edit::{EditRecord, NewEdit, FLAG_APPROVED, FLAG_PENDING};
use suggestor_core::types::EditId;

use crate::error::StoreError;
use crate::kv::{CasOutcome, WriteOp};
use crate::models::edit::{self, ALL_FIELDS, FIELD_APPROVED};
use crate::StoreHandle;

/// Outcome of the guarded pending-to-approved transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalTransition {
    /// This call flipped the flag.
    Approved,
    /// The flag was already set; nothing was written.
    AlreadyApproved,
}

#[derive(Clone)]
pub struct EditQueue {
    store: StoreHandle,
    prefix: String,
}

impl EditQueue {
    pub fn new(store: StoreHandle, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    fn counter_key(&self) -> String {
        format!("{}uids", self.prefix)
    }

    fn index_key(&self) -> String {
        format!("{}edits", self.prefix)
    }

    fn record_prefix(&self) -> String {
        format!("{}edit:", self.prefix)
    }

    fn record_key(&self, id: EditId) -> String {
        format!("{}{id}", self.record_prefix())
    }

    /// Queue a new edit and return its id.
    ///
    /// The id comes from an atomic increment; the record and its index entry
    /// are written in one atomic batch. If the batch fails the id is simply
    /// skipped, never reused.
    pub async fn submit(&self, edit: &NewEdit) -> Result<EditId, StoreError> {
        let id = self.store.incr(&self.counter_key()).await?;

        self.store
            .exec_atomic(vec![
                WriteOp::HashSet {
                    key: self.record_key(id),
                    fields: edit::to_fields(edit),
                },
                WriteOp::ListPush {
                    key: self.index_key(),
                    value: id.to_string(),
                },
            ])
            .await?;

        tracing::debug!(edit_id = id, endpoint = %edit.endpoint, "Edit queued");
        Ok(id)
    }

    /// Every queued edit, most recent first.
    pub async fn list_pending(&self) -> Result<Vec<EditRecord>, StoreError> {
        let rows = self
            .store
            .list_join(&self.index_key(), &self.record_prefix(), &ALL_FIELDS)
            .await?;

        rows.into_iter()
            .map(|row| {
                if row.is_orphan() {
                    tracing::error!(edit_id = %row.member, "Queue index references a missing edit");
                    return Err(StoreError::Consistency { id: row.member });
                }
                edit::from_values(&row.member, &row.values)
            })
            .collect()
    }

    /// Load a single edit.
    pub async fn find_by_id(&self, id: EditId) -> Result<Option<EditRecord>, StoreError> {
        let map = self.store.hash_get_all(&self.record_key(id)).await?;
        if map.is_empty() {
            return Ok(None);
        }
        edit::from_map(id, &map).map(Some)
    }

    /// Set the approval flag unconditionally.
    ///
    /// Succeeds on an already approved edit too; the once-only guarantee is
    /// [`EditQueue::approve_if_pending`]'s job.
    pub async fn mark_approved(&self, id: EditId) -> Result<(), StoreError> {
        let applied = self
            .store
            .hash_set_existing(&self.record_key(id), FIELD_APPROVED, FLAG_APPROVED)
            .await?;
        if applied {
            Ok(())
        } else {
            Err(StoreError::NotFound(id))
        }
    }

    /// Flip the approval flag only if it is still pending, atomically.
    pub async fn approve_if_pending(&self, id: EditId) -> Result<ApprovalTransition, StoreError> {
        let outcome = self
            .store
            .hash_compare_and_set(&self.record_key(id), FIELD_APPROVED, FLAG_PENDING, FLAG_APPROVED)
            .await?;
        match outcome {
            CasOutcome::Applied => Ok(ApprovalTransition::Approved),
            CasOutcome::Mismatch => Ok(ApprovalTransition::AlreadyApproved),
            CasOutcome::Missing => Err(StoreError::NotFound(id)),
        }
    }
}
