//! Upload through the control plane, then call the live link over HTTP.

use std::sync::Arc;
use std::time::Duration;

use scriptgate_api::config::ServerConfig;
use scriptgate_api::router::build_app_router;
use scriptgate_api::state::AppState;
use scriptgate_control::{Command, CommandHandler, ControlPlane, ControlSettings, HttpGatewayClient};
use scriptgate_core::config::GatewayConfig;
use scriptgate_core::registry::{AuthorizationRegistry, MemoryRegistry};
use scriptgate_core::scripting::interpreter::InterpreterExecutor;
use scriptgate_core::scripting::Gateway;
use scriptgate_core::store::TenantScriptStore;
use scriptgate_core::types::PrincipalId;

fn id(raw: i64) -> PrincipalId {
    PrincipalId::new(raw).unwrap()
}

#[tokio::test]
async fn uploaded_script_is_test_run_and_served() {
    let dir = tempfile::tempdir().unwrap();
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let config = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 10,
        gateway: GatewayConfig {
            interpreter_path: "/bin/sh".to_string(),
            script_extension: ".sh".to_string(),
            timeout: Duration::from_secs(5),
            output_cap_bytes: 4000,
            admin_principal_id: id(1),
            scripts_dir: dir.path().join("uploads"),
            registry_path: None,
            public_base_url: base_url.clone(),
        },
    };

    let registry: Arc<dyn AuthorizationRegistry> = Arc::new(MemoryRegistry::new(id(1)));
    let store = Arc::new(TenantScriptStore::new(
        config.gateway.scripts_dir.clone(),
        config.gateway.script_extension.clone(),
    ));
    let gateway = Arc::new(Gateway::new(
        Arc::clone(&store),
        InterpreterExecutor::new("/bin/sh"),
        config.gateway.timeout,
    ));
    let stats = Arc::clone(gateway.stats());

    let app = build_app_router(
        AppState {
            config: Arc::new(config.clone()),
            registry: Arc::clone(&registry),
            gateway,
        },
        &config,
    );
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = HttpGatewayClient::new(base_url.clone(), Duration::from_secs(10)).unwrap();
    let plane = ControlPlane::new(
        Arc::clone(&registry),
        store,
        Arc::clone(&stats),
        Arc::new(client),
        ControlSettings::from(&config.gateway),
    );

    plane
        .handle(id(1), Command::AddPrincipal { target: "7".into() })
        .await
        .unwrap();
    let reply = plane
        .handle(
            id(7),
            Command::UploadFile {
                file_name: "hello.sh".to_string(),
                content: b"printf 'hi from 7'".to_vec(),
            },
        )
        .await
        .unwrap();

    assert!(reply.text.contains("Test run succeeded:\nhi from 7"), "{}", reply.text);
    let link = format!("{base_url}/run/7/hello.sh");
    assert!(reply.text.contains(&link));

    let body = reqwest::get(&link).await.unwrap().text().await.unwrap();
    assert_eq!(body, "hi from 7");
    assert_eq!(stats.snapshot().success, 2);
}
