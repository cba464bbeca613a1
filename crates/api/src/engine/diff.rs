use suggestor_core::edit::EditRecord;
use suggestor_core::types::EditId;
use suggestor_wiki::RenderedDiff;

use super::{ModerationEngine, ModerationError};

impl ModerationEngine {
    /// Diff between the edit's base revision and its proposed text, as
    /// rendered by the wiki.
    ///
    /// A reply without the expected page and revision is an error, never an
    /// empty diff.
    pub async fn diff(&self, id: EditId) -> Result<(EditRecord, RenderedDiff), ModerationError> {
        let edit = self
            .queue
            .find_by_id(id)
            .await?
            .ok_or(ModerationError::NotFound(id))?;

        let revid = edit.base_revision.ok_or_else(|| {
            ModerationError::Validation(format!("Edit {id} has no base revision to diff against"))
        })?;

        let diff = self
            .wiki
            .compare_to_text(&edit.endpoint, edit.page_id, revid, &edit.content)
            .await?;

        tracing::debug!(edit_id = id, revid, "Diff rendered");
        Ok((edit, diff))
    }
}
