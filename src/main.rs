//! Keywarden license key server.
//!
//! Usage:
//!   keywarden --port 8080 --database database.db
//!
//! Every flag also reads from the environment (`PORT`, `ADMIN_PASSWORD`,
//! `DATABASE_PATH`, `STATIC_DIR`, `KEYWARDEN_HOST`).

use clap::Parser;
use keywarden::{
    build_router, telemetry, AppState, KeyRegistry, KeywardenError, ServerConfig, SqliteStore,
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), KeywardenError> {
    let config = ServerConfig::parse();
    telemetry::init(config.verbose)?;
    config.validate()?;

    if config.admin_password == keywarden::config::DEFAULT_ADMIN_PASSWORD {
        warn!("using the default admin password, set ADMIN_PASSWORD");
    }

    let store = Arc::new(SqliteStore::open(&config.database)?);
    info!(database = %config.database.display(), "key store opened");

    let registry = KeyRegistry::new(store);
    let state = AppState::new(registry, &config.admin_password);

    let static_dir = config
        .static_dir
        .is_dir()
        .then_some(config.static_dir.as_path());
    if static_dir.is_none() {
        warn!(
            dir = %config.static_dir.display(),
            "static directory not found, admin panel disabled"
        );
    }
    let app = build_router(state, static_dir);

    let listener = tokio::net::TcpListener::bind(config.listen_addr()).await?;
    info!(addr = %listener.local_addr()?, "keywarden listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("keywarden stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
