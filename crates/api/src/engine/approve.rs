use suggestor_core::credential::CredentialPair;
use suggestor_core::edit::EditRecord;
use suggestor_core::types::EditId;
use suggestor_db::repositories::ApprovalTransition;

use super::{ModerationEngine, ModerationError};

impl ModerationEngine {
    /// Apply a pending edit upstream on behalf of the moderator and mark it
    /// approved.
    ///
    /// Nothing is written locally until the wiki has accepted the edit. An
    /// unknown or already approved edit is rejected before any outbound
    /// call. The final flip is a compare-and-set, so of two concurrent
    /// approvals exactly one records the transition.
    pub async fn approve(
        &self,
        access: &CredentialPair,
        id: EditId,
    ) -> Result<EditRecord, ModerationError> {
        let edit = self
            .queue
            .find_by_id(id)
            .await?
            .ok_or(ModerationError::NotFound(id))?;

        if edit.is_approved() {
            return Err(ModerationError::AlreadyApproved(id));
        }

        let csrf_token = self.wiki.fetch_csrf_token(access, &edit.endpoint).await?;
        let outcome = self.wiki.submit_edit(access, &edit, &csrf_token).await?;

        match self.queue.approve_if_pending(id).await {
            Ok(ApprovalTransition::Approved) => {
                tracing::info!(
                    edit_id = id,
                    endpoint = %edit.endpoint,
                    newrevid = ?outcome.newrevid,
                    "Edit approved"
                );
                Ok(edit)
            }
            Ok(ApprovalTransition::AlreadyApproved) => {
                tracing::warn!(
                    edit_id = id,
                    "Edit was approved concurrently while this approval was in flight"
                );
                Err(ModerationError::AlreadyApproved(id))
            }
            Err(source) => {
                tracing::error!(
                    edit_id = id,
                    endpoint = %edit.endpoint,
                    error = %source,
                    "Edit applied upstream but approval flag not set; reconcile manually"
                );
                Err(ModerationError::Unreconciled { id, source })
            }
        }
    }
}
