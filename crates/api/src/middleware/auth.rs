//! Session-cookie extractor for moderator-only handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::CookieJar;
use suggestor_core::credential::CredentialPair;

use crate::error::AppError;
use crate::session::ACCESS_TOKEN_COOKIE;
use crate::state::AppState;

/// The moderator's access-phase pair, read from the `oauthtoken` cookie.
///
/// Rejects with 400 when the cookie is absent, tampered with, or expired:
///
/// ```ignore
/// async fn my_handler(ModeratorSession(access): ModeratorSession) -> AppResult<()> {
///     tracing::info!(token = %access.token, "handling request");
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ModeratorSession(pub CredentialPair);

impl FromRequestParts<AppState> for ModeratorSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let access = state.sessions.resolve(&jar, ACCESS_TOKEN_COOKIE)?;
        Ok(ModeratorSession(access))
    }
}
