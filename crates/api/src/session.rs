//! Credential store: OAuth pairs held by the browser in signed cookies.
//!
//! Each cookie value is an HS256 JWT whose `cred` claim is `token:secret`
//! sealed with AES-256-GCM, so the pair is unreadable without
//! `SESSION_SECRET`. The cookie name is bound into the seal: a request-phase
//! value never opens as an access-phase one. Nothing is kept server-side,
//! so sessions survive restarts and work across instances sharing the
//! secret.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use suggestor_core::credential::CredentialPair;

/// Request-phase pair, set by `/initiate` and consumed by `/callback`.
pub const REQUEST_TOKEN_COOKIE: &str = "oauthreqtoken";

/// Access-phase pair, set by `/callback`.
pub const ACCESS_TOKEN_COOKIE: &str = "oauthtoken";

/// Mixed into the secret to derive the cipher key, so it differs from the
/// JWT signing key.
const CIPHER_KEY_LABEL: &[u8] = b"suggestor session cookie encryption";

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Absent, unsigned, tampered with, or not a credential pair.
    #[error("No valid {0} cookie; please log in")]
    NotFound(String),

    #[error("The {0} cookie has expired; please log in again")]
    Expired(String),

    /// The pair cannot be stored (empty part, or separator in the token).
    #[error("Invalid credential: {0}")]
    InvalidValue(String),

    #[error("Failed to sign session cookie: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),

    #[error("Failed to encrypt session cookie")]
    Encryption,
}

/// Claims carried in every session cookie.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Nonce followed by the sealed `token:secret`, base64url.
    cred: String,
    /// Expiration time (UTC Unix timestamp).
    exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    iat: i64,
}

/// Issues and resolves session cookies.
pub struct CredentialStore {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    cipher: Aes256Gcm,
    cookie_path: String,
    secure: bool,
}

impl CredentialStore {
    /// * `cookie_path` - the mount prefix, `/` when mounted at the root.
    /// * `secure` - add the `Secure` attribute (HTTPS deployments).
    pub fn new(secret: &str, cookie_path: impl Into<String>, secure: bool) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let cookie_path = cookie_path.into();
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            cipher: cipher_for(secret),
            cookie_path: if cookie_path.is_empty() {
                "/".to_string()
            } else {
                cookie_path
            },
            secure,
        }
    }

    /// Build the cookie `name` carrying `pair`, valid for `ttl`.
    ///
    /// The pair is validated here so that every cookie this store issues
    /// can be resolved back to exactly the same pair.
    pub fn issue(
        &self,
        name: &str,
        pair: &CredentialPair,
        ttl: chrono::Duration,
    ) -> Result<Cookie<'static>, SessionError> {
        pair.validate()
            .map_err(|e| SessionError::InvalidValue(e.to_string()))?;

        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            cred: self.seal(name, &pair.encode())?,
            exp: now + ttl.num_seconds(),
            iat: now,
        };
        let value = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;

        Ok(Cookie::build((name.to_string(), value))
            .path(self.cookie_path.clone())
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure)
            .max_age(time::Duration::seconds(ttl.num_seconds().max(0)))
            .build())
    }

    /// Read the pair stored in cookie `name`.
    pub fn resolve(&self, jar: &CookieJar, name: &str) -> Result<CredentialPair, SessionError> {
        let cookie = jar
            .get(name)
            .ok_or_else(|| SessionError::NotFound(name.to_string()))?;
        self.verify(name, cookie.value())
    }

    /// Verify a raw cookie value issued under `name`.
    pub fn verify(&self, name: &str, value: &str) -> Result<CredentialPair, SessionError> {
        let data = decode::<Claims>(value, &self.decoding_key, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => SessionError::Expired(name.to_string()),
                _ => {
                    tracing::debug!(cookie = name, error = %e, "Rejected session cookie");
                    SessionError::NotFound(name.to_string())
                }
            }
        })?;

        self.open(name, &data.claims.cred)
            .and_then(|cred| CredentialPair::decode(&cred).ok())
            .ok_or_else(|| SessionError::NotFound(name.to_string()))
    }

    /// A cookie that, added to a jar via `remove`, clears cookie `name`.
    pub fn removal(&self, name: &str) -> Cookie<'static> {
        Cookie::build((name.to_string(), String::new()))
            .path(self.cookie_path.clone())
            .build()
    }

    fn seal(&self, name: &str, plaintext: &str) -> Result<String, SessionError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let payload = Payload {
            msg: plaintext.as_bytes(),
            aad: name.as_bytes(),
        };
        let ciphertext = self
            .cipher
            .encrypt(&nonce, payload)
            .map_err(|_| SessionError::Encryption)?;

        let mut sealed = nonce.to_vec();
        sealed.extend_from_slice(&ciphertext);
        Ok(URL_SAFE_NO_PAD.encode(sealed))
    }

    fn open(&self, name: &str, sealed: &str) -> Option<String> {
        let bytes = URL_SAFE_NO_PAD.decode(sealed).ok()?;
        if bytes.len() <= NONCE_LEN {
            return None;
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let payload = Payload {
            msg: ciphertext,
            aad: name.as_bytes(),
        };
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), payload)
            .ok()?;
        String::from_utf8(plaintext).ok()
    }
}

/// AES-256 key derived from the session secret with HMAC-SHA256.
fn cipher_for(secret: &str) -> Aes256Gcm {
    let mut mac =
        <Hmac<Sha256> as Mac>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(CIPHER_KEY_LABEL);
    Aes256Gcm::new(&mac.finalize().into_bytes())
}
