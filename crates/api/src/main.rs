use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitenet_api::config::ServerConfig;
use sitenet_api::router::build_app_router;
use sitenet_api::state::AppState;
use sitenet_core::capability::RoleAuthorizer;
use sitenet_core::hooks::Hooks;
use sitenet_core::meta::MetaRegistry;
use sitenet_core::site::SiteData;
use sitenet_store::{MemoryMetaStore, MemoryStore, SiteMetaStore, SiteStore};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sitenet_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Storage collaborators ---
    let store: Arc<dyn SiteStore> = Arc::new(MemoryStore::new());
    let meta: Arc<dyn SiteMetaStore> = Arc::new(MemoryMetaStore::new());
    seed_primary_site(store.as_ref(), &config).await;

    // --- Extension points ---
    // Storage teardown on uninitializing delete: drop the site's metadata.
    let hooks = {
        let meta = Arc::clone(&meta);
        Hooks::new().on_uninitialize(move |site| {
            let meta = Arc::clone(&meta);
            let site_id = site.id;
            tokio::spawn(async move {
                if let Err(err) = meta.purge(site_id).await {
                    tracing::warn!(site_id, error = %err, "metadata teardown failed");
                }
            });
        })
    };

    // --- App state ---
    let state = AppState {
        store,
        meta,
        authorizer: Arc::new(RoleAuthorizer),
        hooks: Arc::new(hooks),
        meta_registry: Arc::new(MetaRegistry::new()),
        config: Arc::new(config.clone()),
    };

    // --- Router ---
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Create the network's primary site if the store is empty.
///
/// The domain comes from `PUBLIC_URL`, matching how the platform would
/// address the main site of a fresh network.
async fn seed_primary_site(store: &dyn SiteStore, config: &ServerConfig) {
    let domain = url::Url::parse(&config.public_url)
        .ok()
        .and_then(|u| u.host_str().map(ToString::to_string))
        .unwrap_or_else(|| "localhost".to_string());

    let data = SiteData {
        domain: Some(domain),
        path: Some("/".to_string()),
        network_id: Some(config.default_network),
        ..SiteData::default()
    };

    match store.insert_site(&data).await {
        Ok(site) => {
            tracing::info!(site_id = site.id, domain = %site.domain, "Seeded primary site");
        }
        Err(err) => {
            tracing::warn!(error = %err, "Primary site not seeded");
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
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
