//! Client for the external wiki.
//!
//! - [`oauth`] -- OAuth 1.0a consumer: the three-legged handshake and signed
//!   requests on behalf of a user.
//! - [`signing`] -- RFC 5849 HMAC-SHA1 signature primitives.
//! - [`api`] -- typed calls against a wiki's `api.php` (write token, edit,
//!   diff, user info).

pub mod api;
pub mod error;
pub mod oauth;
pub mod signing;

pub use api::{RenderedDiff, WikiApi};
pub use error::WikiError;
pub use oauth::{Handshake, OAuthConsumer};
