use pmobackend::{MemoryBackend, RestBackend, SignageBackend};
use pmoconfig::get_config;
use pmodisplay::{DisplayState, SessionOptions, SessionRegistry, create_router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = get_config();

    // RUST_LOG wins over the configured level.
    let min_level = config.get_log_min_level().unwrap_or_else(|_| "INFO".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(min_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // ========== PHASE 1 : Backend ==========

    let backend: Arc<dyn SignageBackend> = if config.get_backend_offline()? {
        info!("📴 Offline mode: no hosted backend, demo content only");
        Arc::new(MemoryBackend::new())
    } else {
        let rest = RestBackend::builder()
            .base_url(config.get_backend_base_url()?)
            .api_key(config.get_backend_api_key()?)
            .bucket(config.get_backend_storage_bucket())
            .timeout(Duration::from_secs(config.get_backend_request_timeout_secs()?))
            .build()?;
        info!("🔗 Hosted backend at {}", rest.base_url());
        Arc::new(rest)
    };

    // ========== PHASE 2 : Display service ==========

    let ttl_secs = config.get_display_session_ttl_secs()?;
    let registry = SessionRegistry::new((ttl_secs > 0).then(|| Duration::from_secs(ttl_secs)));

    let refresh_secs = config.get_display_refresh_secs()?;
    let options = SessionOptions {
        refresh_interval: (refresh_secs > 0).then(|| Duration::from_secs(refresh_secs)),
        signed_url_expiry_secs: config.get_display_signed_url_expiry_secs()? as u32,
    };

    let router = create_router(DisplayState {
        backend,
        registry: registry.clone(),
        options,
    });

    // ========== PHASE 3 : HTTP server ==========

    let port = config.get_http_port();
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let base = config.get_base_url();
    info!("🖥️  PMOSign display service at http://{}:{}/", base, port);
    info!("    API document: http://{}:{}/api/openapi.json", base, port);
    info!("Press Ctrl+C to stop...");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down, closing live display sessions");
    registry.close_all().await;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to listen for ctrl_c");
    info!("Ctrl+C reçu, arrêt gracieux");
}
