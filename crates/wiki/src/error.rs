/// Errors from the wiki client layer.
#[derive(Debug, thiserror::Error)]
pub enum WikiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote returned a non-2xx status code.
    #[error("Wiki responded with {status}: {body}")]
    Provider {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The verifier or request token was rejected during the handshake.
    #[error("Authorization grant rejected: {0}")]
    InvalidGrant(String),

    /// A signature cannot be computed without this value.
    #[error("Missing OAuth credential: {0}")]
    MissingCredential(&'static str),

    /// A URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The API answered with an `error` object.
    #[error("Wiki API error {code}: {info}")]
    Api { code: String, info: String },

    /// The API answered, but not in the shape this client expects.
    #[error("Unexpected wiki response: {0}")]
    UnexpectedResponse(String),

    /// The write token came back anonymous: the grant was revoked or expired.
    #[error("OAuth token no longer valid, please log in again")]
    LoggedOut,
}
