#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use scriptgate_core::config::GatewayConfig;
use scriptgate_core::registry::{AuthorizationRegistry, MemoryRegistry};
use scriptgate_core::scripting::interpreter::InterpreterExecutor;
use scriptgate_core::scripting::Gateway;
use scriptgate_core::store::TenantScriptStore;
use scriptgate_core::types::PrincipalId;
use tempfile::TempDir;
use tower::ServiceExt;

use scriptgate_api::config::ServerConfig;
use scriptgate_api::router::build_app_router;
use scriptgate_api::state::AppState;

pub const ADMIN: i64 = 1;
pub const MEMBER: i64 = 2;
pub const STRANGER: i64 = 99;

pub fn id(raw: i64) -> PrincipalId {
    PrincipalId::new(raw).unwrap()
}

/// A running test app plus handles to seed it.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<TenantScriptStore>,
    pub registry: Arc<dyn AuthorizationRegistry>,
    _dir: TempDir,
}

/// Build a test `ServerConfig` that runs `.sh` scripts with `/bin/sh`.
pub fn test_config(scripts_dir: PathBuf, timeout: Duration) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: timeout.as_secs() + 5,
        gateway: GatewayConfig {
            interpreter_path: "/bin/sh".to_string(),
            script_extension: ".sh".to_string(),
            timeout,
            output_cap_bytes: 4000,
            admin_principal_id: id(ADMIN),
            scripts_dir,
            registry_path: None,
            public_base_url: "http://localhost:8000".to_string(),
        },
    }
}

/// Build the full application router with all middleware layers, with the
/// admin and [`MEMBER`] registered.
pub async fn build_test_app() -> TestApp {
    build_test_app_with_timeout(Duration::from_secs(5)).await
}

pub async fn build_test_app_with_timeout(timeout: Duration) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path().join("uploads"), timeout);

    let registry: Arc<dyn AuthorizationRegistry> = Arc::new(MemoryRegistry::new(id(ADMIN)));
    registry.add(id(ADMIN), MEMBER).await.unwrap();

    let store = Arc::new(TenantScriptStore::new(
        config.gateway.scripts_dir.clone(),
        config.gateway.script_extension.clone(),
    ));
    let gateway = Arc::new(Gateway::new(
        Arc::clone(&store),
        InterpreterExecutor::new(config.gateway.interpreter_path.clone()),
        config.gateway.timeout,
    ));

    let state = AppState {
        config: Arc::new(config.clone()),
        registry: Arc::clone(&registry),
        gateway,
    };

    TestApp {
        router: build_app_router(state, &config),
        store,
        registry,
        _dir: dir,
    }
}

pub async fn send(app: &TestApp, method: Method, uri: &str, body: &[u8]) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::from(body.to_vec()))
        .unwrap();
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &TestApp, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, b"").await
}

pub async fn post(app: &TestApp, uri: &str, body: &[u8]) -> Response<Body> {
    send(app, Method::POST, uri, body).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
