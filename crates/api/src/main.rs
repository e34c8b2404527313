use std::net::SocketAddr;
use std::sync::Arc;

use scriptgate_core::registry::{AuthorizationRegistry, FileRegistry, MemoryRegistry};
use scriptgate_core::scripting::interpreter::InterpreterExecutor;
use scriptgate_core::scripting::Gateway;
use scriptgate_core::store::TenantScriptStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scriptgate_api::config::ServerConfig;
use scriptgate_api::router::build_app_router;
use scriptgate_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "scriptgate_api=debug,scriptgate_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid configuration");
    tracing::info!(
        host = %config.host,
        port = %config.port,
        interpreter = %config.gateway.interpreter_path,
        extension = %config.gateway.script_extension,
        timeout_secs = config.gateway.timeout.as_secs(),
        "Loaded server configuration"
    );

    // --- Registry ---
    let admin = config.gateway.admin_principal_id;
    let registry: Arc<dyn AuthorizationRegistry> = match &config.gateway.registry_path {
        Some(path) => {
            let registry = FileRegistry::open(path.clone(), admin)
                .await
                .expect("Failed to open registry file");
            tracing::info!(path = %path.display(), "Durable registry opened");
            Arc::new(registry)
        }
        None => {
            tracing::warn!("REGISTRY_PATH not set; added principals are lost on restart");
            Arc::new(MemoryRegistry::new(admin))
        }
    };

    // --- Store and gateway ---
    let store = Arc::new(TenantScriptStore::new(
        config.gateway.scripts_dir.clone(),
        config.gateway.script_extension.clone(),
    ));
    tokio::fs::create_dir_all(store.root())
        .await
        .expect("Failed to create scripts directory");

    let gateway = Arc::new(Gateway::new(
        store,
        InterpreterExecutor::new(config.gateway.interpreter_path.clone()),
        config.gateway.timeout,
    ));

    // --- App state ---
    let state = AppState {
        config: Arc::new(config.clone()),
        registry,
        gateway,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, public_base_url = %config.gateway.public_base_url, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
