pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{auth, edits, moderation, root};
use crate::state::AppState;

/// Build the route tree mounted under `BASE_PATH`.
///
/// ```text
/// GET    /            landing page (login state)
/// GET    /initiate    start the OAuth handshake
/// GET    /callback    finish the OAuth handshake
/// GET    /logout      drop the session cookie
///
/// POST   /post        queue an edit
/// GET    /pending     list queued edits
/// GET    /approve     apply a queued edit (moderator session required)
/// GET    /diff        diff a queued edit against its base revision
///
/// GET    /health      service and store health
/// ```
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root::index))
        .route("/initiate", get(auth::initiate))
        .route("/callback", get(auth::callback))
        .route("/logout", get(auth::logout))
        .route("/post", post(edits::submit))
        .route("/pending", get(edits::pending))
        .route("/approve", get(moderation::approve))
        .route("/diff", get(moderation::diff))
        .merge(health::router())
}
