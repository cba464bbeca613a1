//! Handshake and signed-call tests against a mock provider.

use assert_matches::assert_matches;
use reqwest::Method;
use suggestor_core::credential::CredentialPair;
use suggestor_wiki::{signing, OAuthConsumer, WikiError};
use wiremock::matchers::{body_string_contains, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn consumer(server: &MockServer) -> OAuthConsumer {
    OAuthConsumer::new(
        reqwest::Client::new(),
        format!("{}/w/index.php", server.uri()),
        "consumer-key",
        "consumer-secret",
    )
}

fn authorization(request: &Request) -> String {
    request
        .headers
        .get("authorization")
        .expect("signed request carries an Authorization header")
        .to_str()
        .unwrap()
        .to_string()
}

// ---------------------------------------------------------------------------
// Begin handshake
// ---------------------------------------------------------------------------

#[tokio::test]
async fn begin_handshake_returns_request_token_and_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/index.php"))
        .and(query_param("title", "Special:OAuth/initiate"))
        .and(header_exists("authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "oauth_token=req-token&oauth_token_secret=req-secret&oauth_callback_confirmed=true",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let handshake = consumer(&server).begin_handshake().await.unwrap();

    assert_eq!(handshake.request_token.token, "req-token");
    assert_eq!(handshake.request_token.secret, "req-secret");
    assert!(handshake
        .authorize_url
        .starts_with(&format!("{}/w/index.php?", server.uri())));
    assert!(handshake
        .authorize_url
        .contains("title=Special%3AOAuth%2Fauthorize"));
    assert!(handshake.authorize_url.contains("oauth_token=req-token"));
    assert!(handshake
        .authorize_url
        .contains("oauth_consumer_key=consumer-key"));

    let requests = server.received_requests().await.unwrap();
    let header = authorization(&requests[0]);
    assert!(header.starts_with("OAuth "));
    assert!(header.contains("oauth_consumer_key=\"consumer-key\""));
    assert!(header.contains("oauth_callback=\"oob\""));
    assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
    assert!(header.contains("oauth_signature=\""));
    assert!(!header.contains("oauth_token="));
}

#[tokio::test]
async fn begin_handshake_provider_rejection_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid consumer"))
        .mount(&server)
        .await;

    let result = consumer(&server).begin_handshake().await;
    assert_matches!(result, Err(WikiError::Provider { status: 401, .. }));
}

#[tokio::test]
async fn begin_handshake_without_tokens_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Error: mwoauth-invalid-consumer"))
        .mount(&server)
        .await;

    let result = consumer(&server).begin_handshake().await;
    assert_matches!(result, Err(WikiError::Provider { status: 200, .. }));
}

#[tokio::test]
async fn empty_consumer_secret_cannot_sign() {
    let server = MockServer::start().await;
    let consumer = OAuthConsumer::new(
        reqwest::Client::new(),
        format!("{}/w/index.php", server.uri()),
        "consumer-key",
        "",
    );

    let result = consumer.begin_handshake().await;
    assert_matches!(result, Err(WikiError::MissingCredential(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Complete handshake
// ---------------------------------------------------------------------------

#[tokio::test]
async fn complete_handshake_exchanges_verifier() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/index.php"))
        .and(query_param("title", "Special:OAuth/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("oauth_token=access-token&oauth_token_secret=access-secret"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = CredentialPair::new("req-token", "req-secret").unwrap();
    let access = consumer(&server)
        .complete_handshake(&request, "verifier-123")
        .await
        .unwrap();

    assert_eq!(access.token, "access-token");
    assert_eq!(access.secret, "access-secret");

    let requests = server.received_requests().await.unwrap();
    let header = authorization(&requests[0]);
    assert!(header.contains("oauth_token=\"req-token\""));
    assert!(header.contains("oauth_verifier=\"verifier-123\""));
}

#[tokio::test]
async fn mismatched_verifier_is_invalid_grant() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("Error: mwoauthdatastore-bad-verifier"),
        )
        .mount(&server)
        .await;

    let request = CredentialPair::new("req-token", "req-secret").unwrap();
    let result = consumer(&server).complete_handshake(&request, "wrong").await;
    assert_matches!(result, Err(WikiError::InvalidGrant(_)));
}

#[tokio::test]
async fn rejected_verifier_status_is_invalid_grant() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad verifier"))
        .mount(&server)
        .await;

    let request = CredentialPair::new("req-token", "req-secret").unwrap();
    let result = consumer(&server).complete_handshake(&request, "wrong").await;
    assert_matches!(result, Err(WikiError::InvalidGrant(msg)) if msg == "bad verifier");
}

#[tokio::test]
async fn provider_outage_during_exchange_is_upstream_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let request = CredentialPair::new("req-token", "req-secret").unwrap();
    let result = consumer(&server).complete_handshake(&request, "v").await;
    assert_matches!(result, Err(WikiError::Provider { status: 503, .. }));
}

#[tokio::test]
async fn empty_verifier_never_reaches_provider() {
    let server = MockServer::start().await;
    let request = CredentialPair::new("req-token", "req-secret").unwrap();

    let result = consumer(&server).complete_handshake(&request, "").await;
    assert_matches!(result, Err(WikiError::InvalidGrant(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Signed calls
// ---------------------------------------------------------------------------

#[tokio::test]
async fn signed_get_puts_params_in_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("action", "query"))
        .and(query_param("meta", "userinfo"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let access = CredentialPair::new("access-token", "access-secret").unwrap();
    let response = consumer(&server)
        .signed_call(
            &access,
            Method::GET,
            &format!("{}/w/api.php", server.uri()),
            &[("action", "query".into()), ("meta", "userinfo".into())],
        )
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let requests = server.received_requests().await.unwrap();
    assert!(authorization(&requests[0]).contains("oauth_token=\"access-token\""));
}

#[tokio::test]
async fn signed_post_puts_params_in_form_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/w/api.php"))
        .and(body_string_contains("action=edit"))
        .and(body_string_contains("summary=typo+fix"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&server)
        .await;

    let access = CredentialPair::new("access-token", "access-secret").unwrap();
    consumer(&server)
        .signed_call(
            &access,
            Method::POST,
            &format!("{}/w/api.php", server.uri()),
            &[("action", "edit".into()), ("summary", "typo fix".into())],
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn signed_call_with_incomplete_pair_is_auth_error() {
    let server = MockServer::start().await;
    let access = CredentialPair {
        token: "access-token".into(),
        secret: String::new(),
    };

    let result = consumer(&server)
        .signed_call(
            &access,
            Method::GET,
            &format!("{}/w/api.php", server.uri()),
            &[],
        )
        .await;
    assert_matches!(result, Err(WikiError::MissingCredential(_)));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn each_call_gets_a_fresh_nonce() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let consumer = consumer(&server);
    let access = CredentialPair::new("access-token", "access-secret").unwrap();
    let url = format!("{}/w/api.php", server.uri());
    for _ in 0..2 {
        consumer
            .signed_call(&access, Method::GET, &url, &[])
            .await
            .unwrap();
    }

    let requests = server.received_requests().await.unwrap();
    let nonce = |r: &Request| {
        let header = authorization(r);
        header
            .split(", ")
            .find(|p| p.contains("oauth_nonce="))
            .unwrap()
            .to_string()
    };
    assert_ne!(nonce(&requests[0]), nonce(&requests[1]));
}

// ---------------------------------------------------------------------------
// Signatures as received
// ---------------------------------------------------------------------------

/// Values that exercise the percent-encoding edge cases: space, `+`, `\`,
/// `*`, `'`, parentheses and non-ASCII.
const AWKWARD: &str = "a b+c\\d*e'f(g) Ünïcödé ✓";

/// Split the `Authorization` header into its decoded `oauth_*` parameters
/// and the signature.
fn oauth_header_params(request: &Request) -> (Vec<(String, String)>, String) {
    let header = authorization(request);
    let list = header.strip_prefix("OAuth ").unwrap();

    let mut params = Vec::new();
    let mut signature = None;
    for part in list.split(", ") {
        let (key, quoted) = part.split_once('=').unwrap();
        let key = urlencoding::decode(key).unwrap().into_owned();
        let value = urlencoding::decode(quoted.trim_matches('"'))
            .unwrap()
            .into_owned();
        if key == "oauth_signature" {
            signature = Some(value);
        } else {
            params.push((key, value));
        }
    }
    (params, signature.expect("header carries oauth_signature"))
}

/// Recompute the signature from the request exactly as the server saw it:
/// query pairs, form pairs and header parameters.
///
/// The recorded URL carries a placeholder host for origin-form requests, so
/// the base URL is rebuilt from the server address and the received path.
fn assert_signature_matches(server: &MockServer, request: &Request, token_secret: &str) {
    let (mut params, sent) = oauth_header_params(request);
    params.extend(request.url.query_pairs().into_owned());
    let is_form = request
        .headers
        .get("content-type")
        .is_some_and(|v| v.to_str().unwrap().starts_with("application/x-www-form-urlencoded"));
    if is_form {
        params.extend(url::form_urlencoded::parse(&request.body).into_owned());
    }

    let base_url = format!("{}{}", server.uri(), request.url.path());
    let base = signing::base_string(request.method.as_str(), &base_url, &params);
    let computed = signing::sign(&base, "consumer-secret", token_secret);
    assert_eq!(computed, sent, "{} {}", request.method, request.url);
}

#[tokio::test]
async fn signatures_verify_against_the_received_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/w/index.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("oauth_token=req-token&oauth_token_secret=req-secret"),
        )
        .mount(&server)
        .await;
    Mock::given(path("/w/api.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .mount(&server)
        .await;

    let consumer = consumer(&server);
    let api = format!("{}/w/api.php", server.uri());
    let access = CredentialPair::new("access token+", "secret/with&odd=chars").unwrap();

    consumer.begin_handshake().await.unwrap();
    consumer
        .signed_call(
            &access,
            Method::POST,
            &api,
            &[
                ("action", "edit".into()),
                ("summary", AWKWARD.into()),
                ("text", format!("{AWKWARD}\n== Heading ==")),
                ("token", "+\\".into()),
            ],
        )
        .await
        .unwrap();
    consumer
        .signed_call(
            &access,
            Method::GET,
            &api,
            &[("action", "query".into()), ("titles", AWKWARD.into())],
        )
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
    assert!(requests[0]
        .url
        .query_pairs()
        .any(|(k, v)| k == "title" && v == "Special:OAuth/initiate"));
    assert_signature_matches(&server, &requests[0], "");
    assert_signature_matches(&server, &requests[1], "secret/with&odd=chars");
    assert_signature_matches(&server, &requests[2], "secret/with&odd=chars");
}
