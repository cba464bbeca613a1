//! Edit records: the unit of moderation.
//!
//! A record is created once on submission and afterwards only its approval
//! flag may change, from pending to approved, exactly once.

use serde::Serialize;

use crate::error::CoreError;
use crate::types::EditId;

/// Stored value of the approval flag for a pending edit.
pub const FLAG_PENDING: &str = "0";

/// Stored value of the approval flag for an approved edit.
pub const FLAG_APPROVED: &str = "1";

/// Moderation state of an edit. `Approved` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditState {
    Pending,
    Approved,
}

impl EditState {
    /// Parse the stored flag. Anything other than [`FLAG_APPROVED`] is pending.
    pub fn from_flag(flag: &str) -> Self {
        if flag == FLAG_APPROVED {
            EditState::Approved
        } else {
            EditState::Pending
        }
    }

    pub fn as_flag(self) -> &'static str {
        match self {
            EditState::Pending => FLAG_PENDING,
            EditState::Approved => FLAG_APPROVED,
        }
    }
}

/// A queued edit as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditRecord {
    pub id: EditId,
    /// Write API this edit targets, e.g. `https://en.wikipedia.org/w/api.php`.
    pub endpoint: String,
    /// Full replacement text.
    pub content: String,
    pub summary: String,
    pub base_revision: Option<i64>,
    pub page_id: Option<i64>,
    pub page_name: Option<String>,
    pub state: EditState,
}

impl EditRecord {
    pub fn is_approved(&self) -> bool {
        self.state == EditState::Approved
    }
}

/// A validated submission, not yet assigned an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEdit {
    pub endpoint: String,
    pub content: String,
    pub summary: String,
    pub base_revision: Option<i64>,
    pub page_id: Option<i64>,
    pub page_name: Option<String>,
}

impl NewEdit {
    /// Check the invariants a submission must satisfy before it is queued.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_endpoint(&self.endpoint)?;

        if self.content.is_empty() {
            return Err(CoreError::Validation("content must not be empty".into()));
        }
        if let Some(page_id) = self.page_id {
            if page_id <= 0 {
                return Err(CoreError::Validation(format!(
                    "pageId must be positive, got {page_id}"
                )));
            }
        }
        if let Some(revid) = self.base_revision {
            if revid <= 0 {
                return Err(CoreError::Validation(format!(
                    "baseRevision must be positive, got {revid}"
                )));
            }
        }
        let has_name = self.page_name.as_deref().is_some_and(|n| !n.is_empty());
        if self.page_id.is_none() && !has_name {
            return Err(CoreError::Validation(
                "either pageId or pageName is required".into(),
            ));
        }
        Ok(())
    }
}

/// Row of the pending list view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingEdit {
    pub id: EditId,
    /// Host part of the endpoint, for display.
    pub host: String,
    pub summary: String,
    pub page_name: Option<String>,
    pub state: EditState,
}

impl From<&EditRecord> for PendingEdit {
    fn from(edit: &EditRecord) -> Self {
        Self {
            id: edit.id,
            host: endpoint_host(&edit.endpoint),
            summary: edit.summary.clone(),
            page_name: edit.page_name.clone(),
            state: edit.state,
        }
    }
}

/// Require an absolute `http`/`https` URL.
pub fn validate_endpoint(endpoint: &str) -> Result<(), CoreError> {
    let parsed = url::Url::parse(endpoint)
        .map_err(|e| CoreError::Validation(format!("invalid endpoint '{endpoint}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" if parsed.host_str().is_some() => Ok(()),
        _ => Err(CoreError::Validation(format!(
            "endpoint must be an http(s) URL, got '{endpoint}'"
        ))),
    }
}

/// Host part of an endpoint URL, or the endpoint unchanged if it does not parse.
pub fn endpoint_host(endpoint: &str) -> String {
    url::Url::parse(endpoint)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| endpoint.to_string())
}

/// Write API address for a wiki identified only by its server name.
pub fn endpoint_for_host(host: &str) -> String {
    format!("https://{host}/w/api.php")
}
