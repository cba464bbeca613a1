#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use suggestor_api::config::{OAuthConfig, ServerConfig, SessionConfig};
use suggestor_api::router::build_app_router;
use suggestor_api::session::ACCESS_TOKEN_COOKIE;
use suggestor_api::state::AppState;
use suggestor_core::credential::CredentialPair;
use suggestor_db::{MemoryStore, StoreHandle};
use tower::ServiceExt;

pub const SESSION_SECRET: &str = "test-session-secret";

/// Build a test `ServerConfig` whose OAuth provider and default write API
/// both live on `wiki_uri` (a wiremock server).
pub fn test_config(wiki_uri: &str) -> ServerConfig {
    ServerConfig {
        bind_address: "127.0.0.1:0".to_string(),
        base_path: String::new(),
        public_url: "http://localhost:3000".to_string(),
        cors_origins: vec!["*".to_string()],
        request_timeout_secs: 30,
        redis_url: "memory://".to_string(),
        redis_prefix: "test:".to_string(),
        default_api_url: Some(format!("{wiki_uri}/w/api.php")),
        user_agent: "suggestor-tests".to_string(),
        oauth: OAuthConfig {
            index_url: format!("{wiki_uri}/w/index.php"),
            consumer_key: "consumer-key".to_string(),
            consumer_secret: "consumer-secret".to_string(),
        },
        session: SessionConfig {
            secret: SESSION_SECRET.to_string(),
            request_token_ttl_mins: 60,
            access_token_ttl_days: 30,
        },
    }
}

/// The full application over an in-memory store.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    /// Same store the router uses, for fault injection.
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn api_url(&self) -> String {
        self.state
            .config
            .default_api_url
            .clone()
            .expect("test config sets a default api")
    }

    /// `Cookie` header value carrying a valid moderator session.
    pub fn moderator_cookie(&self) -> String {
        let access = CredentialPair::new("access-token", "access-secret").unwrap();
        let cookie = self
            .state
            .sessions
            .issue(ACCESS_TOKEN_COOKIE, &access, chrono::Duration::hours(1))
            .unwrap();
        format!("{}={}", cookie.name(), cookie.value())
    }
}

/// Build the full application router with all middleware layers.
///
/// Uses [`build_app_router`] so integration tests exercise the same
/// middleware stack (CORS, request ID, timeout, tracing, panic recovery)
/// that production uses.
pub fn build_test_app(config: ServerConfig) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let handle: StoreHandle = store.clone();
    let state = AppState::new(config, handle, reqwest::Client::new());
    let router = build_app_router(state.clone(), &state.config);

    TestApp {
        router,
        state,
        store,
    }
}

pub async fn get(app: &TestApp, uri: &str) -> Response {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn get_with_cookie(app: &TestApp, uri: &str, cookie: &str) -> Response {
    let request = Request::get(uri)
        .header("cookie", cookie)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// POST a JSON string. The gadgets send `application/x-www-form-urlencoded`
/// as content type, so that is what is declared here.
pub async fn post_json(app: &TestApp, uri: &str, json: &str) -> Response {
    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/x-www-form-urlencoded; charset=UTF-8")
        .body(Body::from(json.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn send(app: &TestApp, request: Request<Body>) -> Response {
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn location(response: &Response) -> String {
    response
        .headers()
        .get("location")
        .expect("redirect carries a Location header")
        .to_str()
        .unwrap()
        .to_string()
}

/// All `Set-Cookie` header values of a response.
pub fn set_cookies(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// Value of the cookie `name` set by a response, if any.
pub fn cookie_value(response: &Response, name: &str) -> Option<String> {
    set_cookies(response).into_iter().find_map(|header| {
        let first = header.split(';').next()?.trim().to_string();
        first
            .strip_prefix(&format!("{name}="))
            .map(str::to_string)
    })
}
