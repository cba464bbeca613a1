//! Handlers for queueing edits and listing the queue.

use axum::body::Bytes;
use axum::extract::State;
use axum::response::Html;
use axum::Json;
use serde::{Deserialize, Serialize};
use suggestor_core::edit::{endpoint_for_host, NewEdit, PendingEdit};
use suggestor_core::error::CoreError;

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::views;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /post`, as sent by the editor gadgets.
///
/// Both the gadgets' field names (`api`, `wikitext`, `revid`, ...) and the
/// descriptive ones (`endpoint`, `content`, `baseRevision`, ...) are accepted.
/// A page or revision id of `0` means "unknown".
#[derive(Debug, Deserialize)]
pub struct EditSubmission {
    #[serde(alias = "api")]
    pub endpoint: Option<String>,
    /// Wiki server name, expanded to `https://<host>/w/api.php`.
    pub host: Option<String>,
    #[serde(alias = "wikitext")]
    pub content: Option<String>,
    /// Absent when the gadget has no summary field; stored as empty.
    pub summary: Option<String>,
    #[serde(rename = "baseRevision", alias = "revid")]
    pub base_revision: Option<i64>,
    #[serde(rename = "pageId", alias = "pageid")]
    pub page_id: Option<i64>,
    #[serde(rename = "pageName", alias = "pagename", alias = "page")]
    pub page_name: Option<String>,
}

impl EditSubmission {
    /// Resolve the target endpoint and build a validated [`NewEdit`].
    pub fn into_new_edit(self, default_api_url: Option<&str>) -> Result<NewEdit, CoreError> {
        let endpoint = match (self.endpoint.filter(|e| !e.is_empty()), self.host) {
            (Some(endpoint), _) => endpoint,
            (None, Some(host)) if !host.is_empty() => endpoint_for_host(&host),
            _ => default_api_url
                .map(str::to_string)
                .ok_or_else(|| CoreError::Validation("no target api given".into()))?,
        };

        let content = self
            .content
            .ok_or_else(|| CoreError::Validation("content is required".into()))?;

        let edit = NewEdit {
            endpoint,
            content,
            summary: self.summary.unwrap_or_default(),
            base_revision: self.base_revision.filter(|&id| id != 0),
            page_id: self.page_id.filter(|&id| id != 0),
            page_name: self.page_name.filter(|name| !name.is_empty()),
        };
        edit.validate()?;
        Ok(edit)
    }
}

/// Response of `POST /post`.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    #[serde(rename = "Status")]
    pub status: &'static str,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /post
///
/// The body is decoded as JSON whatever the declared content type: the
/// gadgets post JSON as form data.
pub async fn submit(State(state): State<AppState>, body: Bytes) -> AppResult<Json<SubmitResponse>> {
    if body.is_empty() {
        return Err(AppError::BadRequest("No body posted.".into()));
    }
    let submission: EditSubmission = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Cannot decode posted json: {e}")))?;

    let edit = submission.into_new_edit(state.config.default_api_url.as_deref())?;
    let id = state.queue.submit(&edit).await?;

    tracing::info!(edit_id = id, endpoint = %edit.endpoint, "Edit submitted");
    Ok(Json(SubmitResponse { status: "success" }))
}

/// GET /pending
pub async fn pending(State(state): State<AppState>) -> AppResult<Html<String>> {
    let edits = state.queue.list_pending().await?;
    let rows: Vec<PendingEdit> = edits.iter().map(PendingEdit::from).collect();
    Ok(views::pending(&state.config, &rows))
}
