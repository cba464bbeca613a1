use std::sync::Arc;

use suggestor_db::repositories::EditQueue;
use suggestor_db::StoreHandle;
use suggestor_wiki::WikiApi;

use crate::config::ServerConfig;
use crate::engine::ModerationEngine;
use crate::session::CredentialStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Built once at startup; cheaply cloneable (inner data is behind `Arc` or
/// is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Key-value store backing the queue (also pinged by `/health`).
    pub store: StoreHandle,
    pub queue: EditQueue,
    /// OAuth consumer plus typed wiki calls.
    pub wiki: WikiApi,
    pub engine: ModerationEngine,
    /// Signed-cookie credential store.
    pub sessions: Arc<CredentialStore>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Wire the components together from a connected store and HTTP client.
    pub fn new(config: ServerConfig, store: StoreHandle, client: reqwest::Client) -> Self {
        let queue = EditQueue::new(store.clone(), config.redis_prefix.clone());
        let consumer = suggestor_wiki::OAuthConsumer::new(
            client,
            config.oauth.index_url.clone(),
            config.oauth.consumer_key.clone(),
            config.oauth.consumer_secret.clone(),
        );
        let wiki = WikiApi::new(consumer);
        let engine = ModerationEngine::new(queue.clone(), wiki.clone());
        let sessions = CredentialStore::new(
            &config.session.secret,
            config.base_path.clone(),
            config.secure_cookies(),
        );

        Self {
            store,
            queue,
            wiki,
            engine,
            sessions: Arc::new(sessions),
            config: Arc::new(config),
        }
    }
}
