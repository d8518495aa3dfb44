#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use axum_test::TestServer;
use photofolio::{AppState, Config, DatabaseConfig, admin::hash_password, create_app, database};
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};
use tempfile::TempDir;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

/// Bytes the mock image host serves for every successful image.
pub const IMAGE_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nfake-image";

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    _temp_dir: TempDir,
}

fn write_templates(dir: &std::path::Path) {
    std::fs::create_dir_all(dir).unwrap();
    let files = [
        ("_header.html.liquid", "<header>{{ site_name }}</header>"),
        ("_footer.html.liquid", "<footer></footer>"),
        (
            "index.html.liquid",
            "{{ header }}<ul>{% for photo in photos %}<li><a href=\"{{ photo.detail_url }}\"><img src=\"{{ photo.image_src }}\" alt=\"{{ photo.title }}\"></a></li>{% endfor %}</ul>{{ footer }}",
        ),
        (
            "photo.html.liquid",
            "{{ header }}<h1>{{ photo.title }}</h1><img src=\"{{ photo.image_src }}\"><p>{{ photo.description }}</p>{% for tag in photo.tags %}<span class=\"tag\">{{ tag }}</span>{% endfor %}{{ footer }}",
        ),
        ("admin_login.html.liquid", "<form id=\"login-form\"></form>"),
        (
            "admin_dashboard.html.liquid",
            "<p>Signed in as {{ username }}</p>{% for photo in photos %}<tr data-id=\"{{ photo.id }}\"></tr>{% endfor %}",
        ),
    ];
    for (name, content) in files {
        std::fs::write(dir.join(name), content).unwrap();
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Test app over an in-memory database with one admin account and
/// fast retries. `configure` runs before the state is built.
pub async fn spawn_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let template_dir = temp_dir.path().join("templates");
    write_templates(&template_dir);

    let mut config = Config::default();
    config.app.name = "Test Portfolio".to_string();
    config.templates.directory = template_dir;
    config.database = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    };
    config.fetch.retry_backoff_ms = 10;
    config.fetch.timeout_secs = 5;
    configure(&mut config);

    let pool = database::connect(&config.database).await.unwrap();
    let state = AppState::new(config, pool).unwrap();
    state
        .admins
        .upsert(ADMIN_USERNAME, &hash_password(ADMIN_PASSWORD).unwrap())
        .await
        .unwrap();

    let server = TestServer::new(create_app(state.clone())).unwrap();

    TestApp {
        server,
        state,
        _temp_dir: temp_dir,
    }
}

impl TestApp {
    /// Logs in as the seeded admin and returns a `Cookie` header value.
    pub async fn login(&self) -> HeaderValue {
        let response = self
            .server
            .post("/api/admin/login")
            .json(&json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }))
            .await;
        assert_eq!(response.status_code(), StatusCode::OK);

        let set_cookie = response.header(header::SET_COOKIE);
        let pair = set_cookie
            .to_str()
            .unwrap()
            .split(';')
            .next()
            .unwrap()
            .to_string();
        HeaderValue::from_str(&pair).unwrap()
    }

    pub async fn photo_count(&self) -> usize {
        self.state.photos.list().await.unwrap().len()
    }
}

async fn serve(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Request counters and captured values for the mock image host.
#[derive(Default)]
pub struct HostState {
    pub image_hits: AtomicUsize,
    pub flaky_hits: AtomicUsize,
    pub missing_hits: AtomicUsize,
    pub share_hits: AtomicUsize,
    pub last_accept: Mutex<Option<String>>,
    pub last_user_agent: Mutex<Option<String>>,
    pub last_query: Mutex<HashMap<String, String>>,
    addr: Mutex<Option<SocketAddr>>,
}

pub struct MockImageHost {
    pub addr: SocketAddr,
    pub state: Arc<HostState>,
}

impl MockImageHost {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

async fn serve_image(
    State(state): State<Arc<HostState>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    state.image_hits.fetch_add(1, Ordering::SeqCst);
    let read = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    *state.last_accept.lock().unwrap() = read(header::ACCEPT);
    *state.last_user_agent.lock().unwrap() = read(header::USER_AGENT);
    *state.last_query.lock().unwrap() = query;

    ([(header::CONTENT_TYPE, "image/png")], IMAGE_BYTES).into_response()
}

async fn serve_untyped_image(State(state): State<Arc<HostState>>) -> Response {
    state.image_hits.fetch_add(1, Ordering::SeqCst);
    let mut response = IMAGE_BYTES.into_response();
    response.headers_mut().remove(header::CONTENT_TYPE);
    response
}

async fn serve_flaky(State(state): State<Arc<HostState>>) -> StatusCode {
    state.flaky_hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::SERVICE_UNAVAILABLE
}

async fn serve_missing(State(state): State<Arc<HostState>>) -> StatusCode {
    state.missing_hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::NOT_FOUND
}

async fn serve_share_page(State(state): State<Arc<HostState>>) -> Html<String> {
    state.share_hits.fetch_add(1, Ordering::SeqCst);
    let addr = state.addr.lock().unwrap().expect("mock host address is set");
    Html(format!(
        r#"<html><head><meta property="og:image" content="http://{}/cdn/image.jpg?viewBox=640%2C480&size=large"></head></html>"#,
        addr
    ))
}

async fn serve_bare_share_page(State(state): State<Arc<HostState>>) -> Html<&'static str> {
    state.share_hits.fetch_add(1, Ordering::SeqCst);
    Html("<html><head><title>Shared album</title></head></html>")
}

async fn serve_broken_share_page(State(state): State<Arc<HostState>>) -> StatusCode {
    state.share_hits.fetch_add(1, Ordering::SeqCst);
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Local stand-in for image hosts and share pages.
///
/// - `/images/photo.png` and `/cdn/image.jpg` serve `IMAGE_BYTES`
/// - `/images/untyped` serves bytes without a content type
/// - `/images/flaky` always answers 503, `/images/missing` 404
/// - `/photos/share/good` links to `/cdn/image.jpg` via `og:image`
/// - `/photos/share/bare` has no image reference
/// - `/photos/share/broken` answers 500
pub async fn spawn_image_host() -> MockImageHost {
    let state = Arc::new(HostState::default());

    let router = Router::new()
        .route("/images/photo.png", get(serve_image))
        .route("/cdn/image.jpg", get(serve_image))
        .route("/images/untyped", get(serve_untyped_image))
        .route("/images/flaky", get(serve_flaky))
        .route("/images/missing", get(serve_missing))
        .route("/photos/share/good", get(serve_share_page))
        .route("/photos/share/bare", get(serve_bare_share_page))
        .route("/photos/share/broken", get(serve_broken_share_page))
        .with_state(state.clone());

    let addr = serve(router).await;
    *state.addr.lock().unwrap() = Some(addr);

    MockImageHost { addr, state }
}

/// What the mock chat endpoint answers and what it saw.
pub struct ChatState {
    pub status: StatusCode,
    pub reply: String,
    pub hits: AtomicUsize,
    pub last_request: Mutex<Option<Value>>,
    pub last_authorization: Mutex<Option<String>>,
}

pub struct MockChatApi {
    pub addr: SocketAddr,
    pub state: Arc<ChatState>,
}

impl MockChatApi {
    pub fn api_base(&self) -> String {
        format!("http://{}/v1", self.addr)
    }
}

async fn chat_completions(
    State(state): State<Arc<ChatState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    *state.last_request.lock().unwrap() = Some(body);
    *state.last_authorization.lock().unwrap() = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    if !state.status.is_success() {
        return (state.status, Json(json!({ "error": { "message": "upstream failure" } })))
            .into_response();
    }

    Json(json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": state.reply },
            "finish_reason": "stop",
        }],
    }))
    .into_response()
}

/// Local OpenAI-compatible `/v1/chat/completions` answering with `reply`.
pub async fn spawn_chat_api(status: StatusCode, reply: &str) -> MockChatApi {
    let state = Arc::new(ChatState {
        status,
        reply: reply.to_string(),
        hits: AtomicUsize::new(0),
        last_request: Mutex::new(None),
        last_authorization: Mutex::new(None),
    });

    let router = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(state.clone());

    MockChatApi {
        addr: serve(router).await,
        state,
    }
}
