//! OAuth 1.0a consumer for MediaWiki's `Special:OAuth`.
//!
//! Every call is stateless: the caller supplies the credential pair and the
//! request is signed from scratch. Nothing is cached between calls.

use reqwest::Method;
use serde::Deserialize;
use suggestor_core::credential::CredentialPair;
use url::Url;

use crate::error::WikiError;
use crate::signing;

const INITIATE_TITLE: &str = "Special:OAuth/initiate";
const AUTHORIZE_TITLE: &str = "Special:OAuth/authorize";
const TOKEN_TITLE: &str = "Special:OAuth/token";

/// Out-of-band callback: the provider redirects to the consumer's
/// registered callback URL with `oauth_verifier`.
const CALLBACK_OOB: &str = "oob";

/// Result of [`OAuthConsumer::begin_handshake`].
#[derive(Debug, Clone)]
pub struct Handshake {
    /// Request-phase pair, to be stored against the user's session.
    pub request_token: CredentialPair,
    /// Where to send the user to approve the grant.
    pub authorize_url: String,
}

/// Token reply in MediaWiki's JSON form (`format=json`).
#[derive(Debug, Deserialize)]
struct JsonTokenReply {
    key: Option<String>,
    secret: Option<String>,
    error: Option<String>,
}

/// Signs requests with the consumer credentials and, when given, a user's
/// token pair.
#[derive(Clone)]
pub struct OAuthConsumer {
    client: reqwest::Client,
    index_url: String,
    consumer_key: String,
    consumer_secret: String,
}

impl OAuthConsumer {
    /// * `index_url` - the provider's `index.php`, e.g.
    ///   `https://meta.wikimedia.org/w/index.php`.
    pub fn new(
        client: reqwest::Client,
        index_url: impl Into<String>,
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
    ) -> Self {
        Self {
            client,
            index_url: index_url.into(),
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
        }
    }

    /// The HTTP client shared by signed and unsigned calls.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Obtain a request-phase pair and the URL the user must visit.
    pub async fn begin_handshake(&self) -> Result<Handshake, WikiError> {
        let url = self.special_page_url(INITIATE_TITLE)?;
        let response = self
            .send_signed(
                Method::GET,
                &url,
                None,
                &[("oauth_callback", CALLBACK_OOB.to_string())],
                &[],
            )
            .await?;

        let body = ensure_success(response).await?.text().await?;
        let request_token = parse_token_reply(&body).map_err(|msg| WikiError::Provider {
            status: 200,
            body: msg,
        })?;

        let mut authorize = Url::parse(&self.index_url)?;
        authorize
            .query_pairs_mut()
            .append_pair("title", AUTHORIZE_TITLE)
            .append_pair("oauth_token", &request_token.token)
            .append_pair("oauth_consumer_key", &self.consumer_key);

        tracing::debug!(request_token = %request_token.token, "OAuth handshake started");
        Ok(Handshake {
            request_token,
            authorize_url: authorize.to_string(),
        })
    }

    /// Exchange the request-phase pair and the user's verifier for an
    /// access-phase pair.
    pub async fn complete_handshake(
        &self,
        request_token: &CredentialPair,
        verifier: &str,
    ) -> Result<CredentialPair, WikiError> {
        if verifier.is_empty() {
            return Err(WikiError::InvalidGrant("missing oauth_verifier".into()));
        }

        let url = self.special_page_url(TOKEN_TITLE)?;
        let response = self
            .send_signed(
                Method::GET,
                &url,
                Some(request_token),
                &[("oauth_verifier", verifier.to_string())],
                &[],
            )
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::UNAUTHORIZED
        {
            let body = response.text().await.unwrap_or_default();
            return Err(WikiError::InvalidGrant(body));
        }
        let body = ensure_success(response).await?.text().await?;
        let access = parse_token_reply(&body).map_err(WikiError::InvalidGrant)?;

        tracing::debug!("OAuth handshake completed");
        Ok(access)
    }

    /// Send `params` to `url`, signed with `access`.
    ///
    /// GET params go in the query string, POST params in a form body. The
    /// raw response is returned for the caller to decode.
    pub async fn signed_call(
        &self,
        access: &CredentialPair,
        method: Method,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<reqwest::Response, WikiError> {
        if access.token.is_empty() {
            return Err(WikiError::MissingCredential("oauth_token"));
        }
        if access.secret.is_empty() {
            return Err(WikiError::MissingCredential("oauth_token_secret"));
        }
        self.send_signed(method, url, Some(access), &[], params).await
    }

    fn special_page_url(&self, title: &str) -> Result<String, WikiError> {
        let mut url = Url::parse(&self.index_url)?;
        url.query_pairs_mut().append_pair("title", title);
        Ok(url.to_string())
    }

    async fn send_signed(
        &self,
        method: Method,
        url: &str,
        token: Option<&CredentialPair>,
        extra_oauth: &[(&str, String)],
        params: &[(&str, String)],
    ) -> Result<reqwest::Response, WikiError> {
        if self.consumer_key.is_empty() {
            return Err(WikiError::MissingCredential("oauth_consumer_key"));
        }
        if self.consumer_secret.is_empty() {
            return Err(WikiError::MissingCredential("consumer secret"));
        }

        let parsed = Url::parse(url)?;

        let mut oauth: Vec<(String, String)> = vec![
            ("oauth_consumer_key".into(), self.consumer_key.clone()),
            ("oauth_nonce".into(), signing::generate_nonce()),
            (
                "oauth_signature_method".into(),
                signing::SIGNATURE_METHOD.into(),
            ),
            ("oauth_timestamp".into(), signing::timestamp()),
            ("oauth_version".into(), signing::OAUTH_VERSION.into()),
        ];
        if let Some(token) = token {
            oauth.push(("oauth_token".into(), token.token.clone()));
        }
        oauth.extend(extra_oauth.iter().map(|(k, v)| (k.to_string(), v.clone())));

        let mut signed_params: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        signed_params.extend(params.iter().map(|(k, v)| (k.to_string(), v.clone())));
        signed_params.extend(oauth.iter().cloned());

        let base = signing::base_string(
            method.as_str(),
            &signing::base_url(&parsed),
            &signed_params,
        );
        let token_secret = token.map(|t| t.secret.as_str()).unwrap_or("");
        let signature = signing::sign(&base, &self.consumer_secret, token_secret);
        let authorization = signing::authorization_header(&oauth, &signature);

        let request = self
            .client
            .request(method.clone(), parsed)
            .header(reqwest::header::AUTHORIZATION, authorization);
        let request = if method == Method::GET {
            request.query(params)
        } else {
            request.form(params)
        };

        Ok(request.send().await?)
    }
}

/// Turn a non-2xx response into [`WikiError::Provider`].
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, WikiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(WikiError::Provider {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response)
}

/// Parse a token reply, either form-encoded
/// (`oauth_token=…&oauth_token_secret=…`) or JSON (`{"key":…,"secret":…}`).
fn parse_token_reply(body: &str) -> Result<CredentialPair, String> {
    let trimmed = body.trim();

    let (token, secret) = if trimmed.starts_with('{') {
        let reply: JsonTokenReply =
            serde_json::from_str(trimmed).map_err(|e| format!("undecodable token reply: {e}"))?;
        if let Some(error) = reply.error {
            return Err(error);
        }
        (reply.key, reply.secret)
    } else {
        let mut token = None;
        let mut secret = None;
        for (k, v) in url::form_urlencoded::parse(trimmed.as_bytes()) {
            match k.as_ref() {
                "oauth_token" => token = Some(v.into_owned()),
                "oauth_token_secret" => secret = Some(v.into_owned()),
                _ => {}
            }
        }
        (token, secret)
    };

    match (token, secret) {
        (Some(token), Some(secret)) => CredentialPair::new(token, secret).map_err(|e| e.to_string()),
        _ => Err(format!("token reply lacks token or secret: {trimmed}")),
    }
}
