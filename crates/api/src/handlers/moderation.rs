//! Handlers for the moderator actions: approve and diff.

use axum::extract::{Query, State};
use axum::response::{Html, Redirect};
use serde::Deserialize;
use suggestor_core::types::EditId;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::ModeratorSession;
use crate::state::AppState;
use crate::views;

/// `?uid=<id>` on the moderation routes.
#[derive(Debug, Deserialize)]
pub struct UidParams {
    pub uid: Option<String>,
}

impl UidParams {
    fn edit_id(&self) -> AppResult<EditId> {
        let raw = self
            .uid
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("missing uid".into()))?;
        raw.parse()
            .map_err(|_| AppError::BadRequest(format!("invalid uid '{raw}'")))
    }
}

/// GET /approve?uid=<id>
///
/// Requires the `oauthtoken` session. Redirects to the pending list once
/// the edit is saved upstream and marked approved.
pub async fn approve(
    ModeratorSession(access): ModeratorSession,
    State(state): State<AppState>,
    Query(params): Query<UidParams>,
) -> AppResult<Redirect> {
    let id = params.edit_id()?;
    state.engine.approve(&access, id).await?;
    Ok(Redirect::to(&state.config.url_for("/pending")))
}

/// GET /diff?uid=<id>
pub async fn diff(
    State(state): State<AppState>,
    Query(params): Query<UidParams>,
) -> AppResult<Html<String>> {
    let id = params.edit_id()?;
    let (edit, diff) = state.engine.diff(id).await?;
    Ok(views::diff(&state.config, &edit, &diff))
}
