//! Landing page.

use axum::extract::State;
use axum::response::Html;
use axum_extra::extract::cookie::CookieJar;

use crate::session::ACCESS_TOKEN_COOKIE;
use crate::state::AppState;
use crate::views;

/// GET /
///
/// Shows whether the browser holds a valid session. The username lookup is
/// best-effort: failures are logged and the page still renders.
pub async fn index(State(state): State<AppState>, jar: CookieJar) -> Html<String> {
    let access = state.sessions.resolve(&jar, ACCESS_TOKEN_COOKIE).ok();

    let username = match (&access, state.config.default_api_url.as_deref()) {
        (Some(access), Some(endpoint)) => match state.wiki.username(access, endpoint).await {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(error = %e, "Username lookup failed");
                None
            }
        },
        _ => None,
    };

    views::root(&state.config, access.is_some(), username.as_deref())
}
