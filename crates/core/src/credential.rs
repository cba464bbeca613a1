//! OAuth credential pairs (token + secret).
//!
//! Both the request-phase and the access-phase grants of the authorization
//! handshake are a `(token, secret)` pair. The pair travels to the browser
//! inside a signed cookie as `token:secret`, so the token itself must never
//! contain the separator.

use std::fmt;

use crate::error::CoreError;

/// Separator between token and secret in the serialized form.
pub const SEPARATOR: char = ':';

/// A token and its signing secret.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialPair {
    pub token: String,
    pub secret: String,
}

impl CredentialPair {
    /// Build a pair, rejecting values that cannot round-trip through
    /// [`CredentialPair::encode`] / [`CredentialPair::decode`].
    pub fn new(token: impl Into<String>, secret: impl Into<String>) -> Result<Self, CoreError> {
        let pair = Self {
            token: token.into(),
            secret: secret.into(),
        };
        pair.validate()?;
        Ok(pair)
    }

    /// Check that the pair is complete and the token is separator-free.
    ///
    /// The secret may contain the separator: decoding splits on the first
    /// occurrence only.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.token.is_empty() {
            return Err(CoreError::Validation("credential token is empty".into()));
        }
        if self.secret.is_empty() {
            return Err(CoreError::Validation("credential secret is empty".into()));
        }
        if self.token.contains(SEPARATOR) {
            return Err(CoreError::Validation(format!(
                "credential token must not contain '{SEPARATOR}'"
            )));
        }
        Ok(())
    }

    /// Serialize as `token:secret`.
    pub fn encode(&self) -> String {
        format!("{}{SEPARATOR}{}", self.token, self.secret)
    }

    /// Parse a `token:secret` string produced by [`CredentialPair::encode`].
    pub fn decode(value: &str) -> Result<Self, CoreError> {
        let (token, secret) = value
            .split_once(SEPARATOR)
            .ok_or_else(|| CoreError::Validation("credential has no separator".into()))?;
        Self::new(token, secret)
    }
}

// Secrets stay out of logs.
impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("token", &self.token)
            .field("secret", &"<redacted>")
            .finish()
    }
}
