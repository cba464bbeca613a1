//! Handlers for the OAuth handshake (initiate, callback, logout).

use axum::extract::{Query, State};
use axum::response::Redirect;
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::session::{ACCESS_TOKEN_COOKIE, REQUEST_TOKEN_COOKIE};
use crate::state::AppState;

/// Query string of `GET /callback`.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub oauth_verifier: Option<String>,
}

/// GET /initiate
///
/// Obtain a request token, keep it in the short-lived `oauthreqtoken`
/// cookie, and send the user to the provider to authorize it.
pub async fn initiate(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Redirect)> {
    let handshake = state.wiki.consumer().begin_handshake().await?;

    let cookie = state.sessions.issue(
        REQUEST_TOKEN_COOKIE,
        &handshake.request_token,
        chrono::Duration::minutes(state.config.session.request_token_ttl_mins),
    )?;

    tracing::info!("Redirecting to OAuth provider for authorization");
    Ok((jar.add(cookie), Redirect::to(&handshake.authorize_url)))
}

/// GET /callback?oauth_verifier=...
///
/// Exchange the request token from `oauthreqtoken` and the verifier for an
/// access token, store it in `oauthtoken`, and return to the landing page.
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> AppResult<(CookieJar, Redirect)> {
    let request_token = state.sessions.resolve(&jar, REQUEST_TOKEN_COOKIE)?;

    let verifier = params
        .oauth_verifier
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::BadRequest("missing oauth_verifier".into()))?;

    let access = state
        .wiki
        .consumer()
        .complete_handshake(&request_token, &verifier)
        .await?;

    let cookie = state.sessions.issue(
        ACCESS_TOKEN_COOKIE,
        &access,
        chrono::Duration::days(state.config.session.access_token_ttl_days),
    )?;

    tracing::info!("Moderator logged in");
    let jar = jar
        .remove(state.sessions.removal(REQUEST_TOKEN_COOKIE))
        .add(cookie);
    Ok((jar, Redirect::to(&state.config.url_for("/"))))
}

/// GET /logout
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    let jar = jar.remove(state.sessions.removal(ACCESS_TOKEN_COOKIE));
    (jar, Redirect::to(&state.config.url_for("/")))
}
