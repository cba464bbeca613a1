/// Server configuration loaded from environment variables.
///
/// Required values have no default; startup aborts when they are missing.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind, after the `PORT` override is applied.
    pub bind_address: String,
    /// Mount prefix for every route, normalized to `""` or `/segment`.
    pub base_path: String,
    /// Externally visible origin, e.g. `https://suggestor.toolforge.org`.
    pub public_url: String,
    /// Origins allowed to call the API cross-site. `*` allows any.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Key-value store URL; `memory://` selects the in-memory backend.
    pub redis_url: String,
    /// Namespace prepended to every key.
    pub redis_prefix: String,
    /// Write API used when a submission names none.
    pub default_api_url: Option<String>,
    /// User agent sent on every outbound call.
    pub user_agent: String,
    pub oauth: OAuthConfig,
    pub session: SessionConfig,
}

/// Consumer registration with the OAuth provider.
#[derive(Clone)]
pub struct OAuthConfig {
    /// Provider `index.php`, under which the `Special:OAuth/*` pages live.
    pub index_url: String,
    pub consumer_key: String,
    pub consumer_secret: String,
}

/// Signing key and lifetimes of the session cookies.
#[derive(Clone)]
pub struct SessionConfig {
    pub secret: String,
    pub request_token_ttl_mins: i64,
    pub access_token_ttl_days: i64,
}

const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:3000";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";
const DEFAULT_REDIS_PREFIX: &str = "suggestor:";
const DEFAULT_REQUEST_TOKEN_TTL_MINS: i64 = 60;
const DEFAULT_ACCESS_TOKEN_TTL_DAYS: i64 = 30;

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Required | Default                 |
    /// |------------------------|----------|-------------------------|
    /// | `SERVER_ADDRESS`       | no       | `0.0.0.0:3000`          |
    /// | `PORT`                 | no       | overrides the port      |
    /// | `BASE_PATH`            | no       | empty                   |
    /// | `PUBLIC_URL`           | no       | `http://localhost:3000` |
    /// | `CORS_ORIGINS`         | no       | `*`                     |
    /// | `REQUEST_TIMEOUT_SECS` | no       | `30`                    |
    /// | `REDIS_URL`            | **yes**  | --                      |
    /// | `REDIS_PREFIX`         | no       | `suggestor:`            |
    /// | `DEFAULT_API_URL`      | no       | --                      |
    /// | `USER_AGENT`           | no       | `suggestor/<version>`   |
    ///
    /// See [`OAuthConfig::from_env`] and [`SessionConfig::from_env`] for the
    /// nested sections.
    ///
    /// # Panics
    ///
    /// Panics if a required variable is missing or a number does not parse.
    pub fn from_env() -> Self {
        let bind_address = resolve_bind_address(
            std::env::var("SERVER_ADDRESS").unwrap_or_else(|_| DEFAULT_SERVER_ADDRESS.into()),
            std::env::var("PORT").ok(),
        );

        let base_path = normalize_base_path(&std::env::var("BASE_PATH").unwrap_or_default());

        let public_url =
            std::env::var("PUBLIC_URL").unwrap_or_else(|_| DEFAULT_PUBLIC_URL.into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let redis_url = std::env::var("REDIS_URL").expect("REDIS_URL must be set");
        let redis_prefix =
            std::env::var("REDIS_PREFIX").unwrap_or_else(|_| DEFAULT_REDIS_PREFIX.into());

        let default_api_url = std::env::var("DEFAULT_API_URL")
            .ok()
            .filter(|s| !s.is_empty());

        let user_agent = std::env::var("USER_AGENT")
            .unwrap_or_else(|_| format!("suggestor/{}", env!("CARGO_PKG_VERSION")));

        Self {
            bind_address,
            base_path,
            public_url,
            cors_origins,
            request_timeout_secs,
            redis_url,
            redis_prefix,
            default_api_url,
            user_agent,
            oauth: OAuthConfig::from_env(),
            session: SessionConfig::from_env(),
        }
    }

    /// Absolute path of `path` under the mount prefix.
    ///
    /// `url_for("/")` is the mount root itself.
    pub fn url_for(&self, path: &str) -> String {
        match (self.base_path.as_str(), path) {
            ("", _) => path.to_string(),
            (base, "/") => base.to_string(),
            (base, _) => format!("{base}{path}"),
        }
    }

    /// Whether cookies must carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.public_url.starts_with("https://")
    }
}

impl OAuthConfig {
    /// | Env Var                 | Required |
    /// |-------------------------|----------|
    /// | `OAUTH_INDEX_URL`       | **yes**  |
    /// | `OAUTH_CONSUMER_KEY`    | **yes**  |
    /// | `OAUTH_CONSUMER_SECRET` | **yes**  |
    pub fn from_env() -> Self {
        let index_url = std::env::var("OAUTH_INDEX_URL").expect("OAUTH_INDEX_URL must be set");
        let consumer_key =
            std::env::var("OAUTH_CONSUMER_KEY").expect("OAUTH_CONSUMER_KEY must be set");
        let consumer_secret =
            std::env::var("OAUTH_CONSUMER_SECRET").expect("OAUTH_CONSUMER_SECRET must be set");
        assert!(!consumer_key.is_empty(), "OAUTH_CONSUMER_KEY must not be empty");
        assert!(
            !consumer_secret.is_empty(),
            "OAUTH_CONSUMER_SECRET must not be empty"
        );

        Self {
            index_url,
            consumer_key,
            consumer_secret,
        }
    }
}

impl SessionConfig {
    /// | Env Var                  | Required | Default |
    /// |--------------------------|----------|---------|
    /// | `SESSION_SECRET`         | **yes**  | --      |
    /// | `REQUEST_TOKEN_TTL_MINS` | no       | `60`    |
    /// | `ACCESS_TOKEN_TTL_DAYS`  | no       | `30`    |
    pub fn from_env() -> Self {
        let secret = std::env::var("SESSION_SECRET").expect("SESSION_SECRET must be set");
        assert!(!secret.is_empty(), "SESSION_SECRET must not be empty");

        let request_token_ttl_mins: i64 = std::env::var("REQUEST_TOKEN_TTL_MINS")
            .unwrap_or_else(|_| DEFAULT_REQUEST_TOKEN_TTL_MINS.to_string())
            .parse()
            .expect("REQUEST_TOKEN_TTL_MINS must be a valid i64");

        let access_token_ttl_days: i64 = std::env::var("ACCESS_TOKEN_TTL_DAYS")
            .unwrap_or_else(|_| DEFAULT_ACCESS_TOKEN_TTL_DAYS.to_string())
            .parse()
            .expect("ACCESS_TOKEN_TTL_DAYS must be a valid i64");

        Self {
            secret,
            request_token_ttl_mins,
            access_token_ttl_days,
        }
    }
}

// Secrets stay out of the startup log.
impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("index_url", &self.index_url)
            .field("consumer_key", &self.consumer_key)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("request_token_ttl_mins", &self.request_token_ttl_mins)
            .field("access_token_ttl_days", &self.access_token_ttl_days)
            .finish_non_exhaustive()
    }
}

/// Apply the `PORT` override: when set, bind every interface on that port.
pub fn resolve_bind_address(configured: String, port: Option<String>) -> String {
    match port.filter(|p| !p.trim().is_empty()) {
        Some(port) => format!("0.0.0.0:{}", port.trim()),
        None => configured,
    }
}

/// `"/suggestor/"` and `"suggestor"` become `"/suggestor"`; `"/"` becomes `""`.
pub fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
