//! Typed calls against a wiki's `api.php`.
//!
//! Write calls are signed with the moderator's access pair through
//! [`OAuthConsumer::signed_call`]; the diff call is an anonymous read.

use std::collections::HashMap;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use suggestor_core::credential::CredentialPair;
use suggestor_core::edit::EditRecord;

use crate::error::WikiError;
use crate::oauth::{ensure_success, OAuthConsumer};

/// Write token handed out to anonymous (logged out) sessions.
const ANONYMOUS_TOKEN: &str = "+\\";

/// `edit.result` of an accepted edit.
const EDIT_SUCCESS: &str = "Success";

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: String,
    #[serde(default)]
    info: String,
}

/// Envelope shared by every API reply: either `error` or the payload.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    error: Option<ApiErrorBody>,
    #[serde(flatten)]
    payload: T,
}

#[derive(Debug, Deserialize)]
struct TokensPayload {
    query: Option<TokensQuery>,
}

#[derive(Debug, Deserialize)]
struct TokensQuery {
    tokens: Tokens,
}

#[derive(Debug, Deserialize)]
struct Tokens {
    csrftoken: String,
}

#[derive(Debug, Deserialize)]
struct EditPayload {
    edit: Option<EditOutcome>,
}

/// The `edit` object of a successful `action=edit` reply.
#[derive(Debug, Clone, Deserialize)]
pub struct EditOutcome {
    pub result: String,
    pub title: Option<String>,
    pub newrevid: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct DiffPayload {
    query: Option<DiffQuery>,
}

#[derive(Debug, Deserialize)]
struct DiffQuery {
    #[serde(default)]
    pages: HashMap<String, DiffPage>,
    badrevids: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct DiffPage {
    #[serde(default)]
    title: String,
    #[serde(default)]
    revisions: Vec<DiffRevision>,
}

#[derive(Debug, Deserialize)]
struct DiffRevision {
    diff: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct UserInfoPayload {
    query: Option<UserInfoQuery>,
}

#[derive(Debug, Deserialize)]
struct UserInfoQuery {
    userinfo: UserInfo,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    name: String,
    anon: Option<serde_json::Value>,
}

/// Diff between a stored base revision and proposed text.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDiff {
    pub title: String,
    /// HTML table rows as rendered by the wiki.
    pub body: String,
}

#[derive(Clone)]
pub struct WikiApi {
    consumer: OAuthConsumer,
}

impl WikiApi {
    pub fn new(consumer: OAuthConsumer) -> Self {
        Self { consumer }
    }

    pub fn consumer(&self) -> &OAuthConsumer {
        &self.consumer
    }

    /// Fetch a fresh CSRF token on behalf of `access`.
    ///
    /// The anonymous token means the wiki no longer recognises the grant.
    pub async fn fetch_csrf_token(
        &self,
        access: &CredentialPair,
        endpoint: &str,
    ) -> Result<String, WikiError> {
        let params = [
            ("action", "query".to_string()),
            ("meta", "tokens".to_string()),
            ("type", "csrf".to_string()),
            ("format", "json".to_string()),
        ];
        let response = self
            .consumer
            .signed_call(access, Method::GET, endpoint, &params)
            .await?;
        let payload: TokensPayload = decode(response).await?;

        let token = payload
            .query
            .map(|q| q.tokens.csrftoken)
            .ok_or_else(|| WikiError::UnexpectedResponse("reply has no query.tokens".into()))?;
        if token == ANONYMOUS_TOKEN {
            return Err(WikiError::LoggedOut);
        }
        Ok(token)
    }

    /// Replace the target page's text with the edit's content.
    ///
    /// Anything short of `edit.result == "Success"` is an error, so the
    /// caller never records an approval the wiki did not accept.
    pub async fn submit_edit(
        &self,
        access: &CredentialPair,
        edit: &EditRecord,
        csrf_token: &str,
    ) -> Result<EditOutcome, WikiError> {
        let mut params = vec![
            ("action", "edit".to_string()),
            ("summary", edit.summary.clone()),
            ("text", edit.content.clone()),
            ("assert", "user".to_string()),
            ("format", "json".to_string()),
        ];
        match (edit.page_id, &edit.page_name) {
            (Some(page_id), _) => params.push(("pageid", page_id.to_string())),
            (None, Some(name)) => params.push(("title", name.clone())),
            (None, None) => {
                return Err(WikiError::UnexpectedResponse(format!(
                    "edit {} has neither page id nor page name",
                    edit.id
                )))
            }
        }
        if let Some(revid) = edit.base_revision {
            params.push(("baserevid", revid.to_string()));
        }
        // MediaWiki expects the token as the final parameter.
        params.push(("token", csrf_token.to_string()));

        let response = self
            .consumer
            .signed_call(access, Method::POST, &edit.endpoint, &params)
            .await?;
        let payload: EditPayload = decode(response).await?;

        let outcome = payload
            .edit
            .ok_or_else(|| WikiError::UnexpectedResponse("reply has no edit object".into()))?;
        if outcome.result != EDIT_SUCCESS {
            return Err(WikiError::UnexpectedResponse(format!(
                "edit result was '{}'",
                outcome.result
            )));
        }
        tracing::info!(
            edit_id = edit.id,
            endpoint = %edit.endpoint,
            newrevid = ?outcome.newrevid,
            "Edit accepted upstream"
        );
        Ok(outcome)
    }

    /// Render the diff from revision `revid` to `text`.
    ///
    /// The page is looked up by `page_id` when known, else the first page
    /// in the reply is used. A missing page, revision, or diff body is an
    /// error; it is never rendered as an empty diff.
    pub async fn compare_to_text(
        &self,
        endpoint: &str,
        page_id: Option<i64>,
        revid: i64,
        text: &str,
    ) -> Result<RenderedDiff, WikiError> {
        let params = [
            ("action", "query".to_string()),
            ("prop", "revisions".to_string()),
            ("revids", revid.to_string()),
            ("rvdifftotext", text.to_string()),
            ("format", "json".to_string()),
        ];
        let response = self
            .consumer
            .client()
            .post(endpoint)
            .form(&params)
            .send()
            .await?;
        let payload: DiffPayload = decode(response).await?;

        let mut query = payload
            .query
            .ok_or_else(|| WikiError::UnexpectedResponse("reply has no query".into()))?;
        if query.badrevids.is_some() {
            return Err(WikiError::UnexpectedResponse(format!(
                "base revision {revid} does not exist upstream"
            )));
        }

        let page = match page_id {
            Some(id) => query.pages.remove(&id.to_string()),
            None => query.pages.into_values().next(),
        }
        .ok_or_else(|| WikiError::UnexpectedResponse("reply has no matching page".into()))?;

        let body = page
            .revisions
            .into_iter()
            .next()
            .and_then(|rev| rev.diff)
            .and_then(|diff| diff.get("*").and_then(|v| v.as_str()).map(str::to_string))
            .ok_or_else(|| WikiError::UnexpectedResponse("reply has no revision diff".into()))?;

        Ok(RenderedDiff {
            title: page.title,
            body,
        })
    }

    /// Name of the user behind `access`, or `None` if the wiki treats the
    /// request as anonymous.
    pub async fn username(
        &self,
        access: &CredentialPair,
        endpoint: &str,
    ) -> Result<Option<String>, WikiError> {
        let params = [
            ("action", "query".to_string()),
            ("meta", "userinfo".to_string()),
            ("format", "json".to_string()),
        ];
        let response = self
            .consumer
            .signed_call(access, Method::GET, endpoint, &params)
            .await?;
        let payload: UserInfoPayload = decode(response).await?;

        Ok(payload
            .query
            .map(|q| q.userinfo)
            .filter(|info| info.anon.is_none())
            .map(|info| info.name))
    }
}

/// Check the status, decode the envelope, and surface an API `error`.
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, WikiError> {
    let body = ensure_success(response).await?.text().await?;
    let envelope: Envelope<T> = serde_json::from_str(&body)
        .map_err(|e| WikiError::UnexpectedResponse(format!("undecodable reply: {e}")))?;
    if let Some(error) = envelope.error {
        return Err(WikiError::Api {
            code: error.code,
            info: error.info,
        });
    }
    Ok(envelope.payload)
}
