#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use sitenet_api::auth::jwt::{generate_access_token, JwtConfig};
use sitenet_api::config::ServerConfig;
use sitenet_api::router::build_app_router;
use sitenet_api::state::AppState;
use sitenet_core::capability::RoleAuthorizer;
use sitenet_core::hooks::Hooks;
use sitenet_core::meta::MetaRegistry;
use sitenet_core::site::SiteData;
use sitenet_store::{MemoryMetaStore, MemoryStore, SiteStore};

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        public_url: "http://localhost:3000".to_string(),
        default_network: 1,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-secret".to_string(),
            access_token_expiry_mins: 15,
        },
    }
}

/// A fully wired application plus handles on its collaborators.
pub struct TestApp {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub meta: Arc<MemoryMetaStore>,
    pub config: ServerConfig,
}

/// Build the full application router with the in-memory collaborators.
///
/// Mirrors the construction in `main.rs` so integration tests exercise the
/// same middleware stack that production uses.
pub fn build_test_app(hooks: Hooks, meta_registry: MetaRegistry) -> TestApp {
    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let meta = Arc::new(MemoryMetaStore::new());

    let state = AppState {
        store: store.clone(),
        meta: meta.clone(),
        authorizer: Arc::new(RoleAuthorizer),
        hooks: Arc::new(hooks),
        meta_registry: Arc::new(meta_registry),
        config: Arc::new(config.clone()),
    };

    TestApp {
        app: build_app_router(state, &config),
        store,
        meta,
        config,
    }
}

/// Plain app with no hooks and no registered metadata.
pub fn default_test_app() -> TestApp {
    build_test_app(Hooks::new(), MetaRegistry::new())
}

/// Insert `count` sites named `site00.example.test`, `site01...`, ...
pub async fn seed_sites(store: &MemoryStore, count: usize) {
    for i in 0..count {
        let data = SiteData {
            domain: Some(format!("site{i:02}.example.test")),
            path: Some("/".to_string()),
            ..SiteData::default()
        };
        store.insert_site(&data).await.expect("seed insert");
    }
}

/// Mint an access token for user 1 with the given role.
pub fn token_for(config: &ServerConfig, role: &str) -> String {
    generate_access_token(1, role, &config.jwt).expect("token generation")
}

/// Send one request through the router.
pub async fn request(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request construction");

    app.clone().oneshot(request).await.expect("infallible")
}

/// Collect a response body as JSON. Empty bodies yield `Value::Null`.
pub async fn json_body(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body collect")
        .to_bytes();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    }
}

/// All `Link` header values of a response.
pub fn link_headers(response: &Response) -> Vec<String> {
    response
        .headers()
        .get_all(header::LINK)
        .iter()
        .filter_map(|v| v.to_str().ok().map(ToString::to_string))
        .collect()
}

/// A named header as a string, or empty when absent.
pub fn header_str(response: &Response, name: &str) -> String {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
