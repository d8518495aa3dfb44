use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod admin;
pub mod database;
pub mod error;
pub mod gallery;
pub mod generate;
pub mod images;
pub mod photos;
pub mod startup_checks;
pub mod templating;

pub const DEFAULT_SESSION_SECRET: &str = "fallback-dev-secret-please-change-in-production!";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub templates: TemplateConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
    pub session_secret: String,
    /// Marks session cookies `Secure` and enables the strict startup checks.
    #[serde(default)]
    pub production: bool,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TemplateConfig {
    pub directory: PathBuf,
}

/// Outbound requests to image hosts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_secs: u64,
    pub max_attempts: u32,
    /// Delay before retry `n` is `n * retry_backoff_ms`.
    pub retry_backoff_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            timeout_secs: 10,
            max_attempts: 3,
            retry_backoff_ms: 1000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            max_tokens: 200,
            timeout_secs: 60,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            app: AppConfig {
                name: "Photofolio".to_string(),
                log_level: "info".to_string(),
                session_secret: DEFAULT_SESSION_SECRET.to_string(),
                production: false,
                base_url: None,
            },
            database: DatabaseConfig {
                url: "sqlite://photofolio.db".to_string(),
                max_connections: 5,
            },
            templates: TemplateConfig {
                directory: PathBuf::from("templates"),
            },
            fetch: FetchConfig::default(),
            generation: GenerationConfig::default(),
        }
    }
}

impl Config {
    /// Environment variables take precedence over the config file.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(secret) = lookup("SESSION_SECRET") {
            self.app.session_secret = secret;
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.generation.api_key = Some(key);
        }
        if let Some(model) = lookup("OPENAI_MODEL") {
            self.generation.model = model;
        }
        if let Some(base) = lookup("OPENAI_BASE_URL") {
            self.generation.api_base = base;
        }
        if let Some(env) = lookup("APP_ENV") {
            self.app.production = env.eq_ignore_ascii_case("production");
        }
    }
}

use axum::{Router, routing::get, routing::post, routing::put};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub template_engine: Arc<templating::TemplateEngine>,
    pub photos: photos::PhotoStore,
    pub admins: admin::AdminStore,
    pub sessions: admin::SessionCodec,
    pub images: images::ImageService,
    pub vision: generate::DynVisionProvider,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, pool: sqlx::SqlitePool) -> Result<Self, error::ApiError> {
        let template_engine = Arc::new(templating::TemplateEngine::new(
            config.templates.directory.clone(),
            config.app.name.clone(),
        ));
        let images = images::ImageService::new(&config.fetch)
            .map_err(|e| error::ApiError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        let vision = generate::create_provider(&config.generation)?;

        Ok(Self {
            template_engine,
            photos: photos::PhotoStore::new(pool.clone()),
            admins: admin::AdminStore::new(pool),
            sessions: admin::SessionCodec::new(&config.app.session_secret, config.app.production),
            images,
            vision,
            config,
        })
    }
}

pub fn create_app(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(gallery::gallery_handler))
        .route("/photo/{id}", get(gallery::photo_detail_handler))
        .route("/admin", get(admin::admin_root_handler))
        .route("/admin/login", get(admin::login_page))
        .route("/admin/dashboard", get(admin::dashboard_page))
        .route("/api/admin/login", post(admin::login_handler))
        .route("/api/admin/logout", post(admin::logout_handler))
        .route(
            "/api/admin/photos",
            get(photos::list_photos_handler).post(photos::create_photo_handler),
        )
        .route(
            "/api/admin/photos/{id}",
            put(photos::update_photo_handler).delete(photos::delete_photo_handler),
        )
        .route("/api/admin/generate", post(generate::generate_handler))
        .route("/api/image", get(images::image_proxy_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let method = request.method();
                    let uri = request.uri();
                    let matched_path = request
                        .extensions()
                        .get::<axum::extract::MatchedPath>()
                        .map(|matched_path| matched_path.as_str());

                    tracing::info_span!(
                        "http_request",
                        method = %method,
                        uri = %uri,
                        matched_path,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    let user_agent = request
                        .headers()
                        .get("user-agent")
                        .and_then(|h| h.to_str().ok())
                        .unwrap_or("-");

                    tracing::info!(
                        target: "access_log",
                        method = %request.method(),
                        path = %request.uri().path(),
                        user_agent = %user_agent,
                        "request"
                    );
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            target: "access_log",
                            status = %response.status(),
                            latency_ms = %latency.as_millis(),
                            "response"
                        );
                    },
                ),
        )
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_env_overrides_replace_file_values() {
        let mut config = Config::default();
        let env: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "sqlite::memory:"),
            ("SESSION_SECRET", "a-much-longer-secret-for-production-use"),
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("APP_ENV", "production"),
        ]);

        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.database.url, "sqlite::memory:");
        assert_eq!(
            config.app.session_secret,
            "a-much-longer-secret-for-production-use"
        );
        assert_eq!(config.generation.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.generation.model, "gpt-4o-mini");
        assert!(config.app.production);
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| (key == "OPENAI_API_KEY").then(|| "  ".to_string()));

        assert!(config.generation.api_key.is_none());
        assert_eq!(config.generation.model, "gpt-4o");
    }

    #[test]
    fn test_partial_toml_uses_section_defaults() {
        let toml = r#"
[server]
host = "0.0.0.0"
port = 8080

[app]
name = "Portfolio"
log_level = "debug"
session_secret = "secret"

[database]
url = "sqlite://test.db"
max_connections = 2

[templates]
directory = "templates"

[fetch]
timeout_secs = 5
"#;
        let config: Config = toml_edit::de::from_str(toml).unwrap();

        assert_eq!(config.server.port, 8080);
        assert!(!config.app.production);
        assert_eq!(config.fetch.timeout_secs, 5);
        assert_eq!(config.fetch.max_attempts, 3);
        assert_eq!(config.generation.max_tokens, 200);
    }
}
