//! HTTP API for clients and the admin panel.

pub mod dto;
pub mod error;
pub mod handlers;

use crate::crypto::secret::AdminSecret;
use crate::registry::KeyRegistry;
use axum::routing::{delete, get, post};
use axum::Router;
use std::path::Path;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key registry.
    pub registry: KeyRegistry,
    /// Admin shared secret.
    pub admin: AdminSecret,
}

impl AppState {
    /// Bundle a registry with the admin password.
    pub fn new(registry: KeyRegistry, admin_password: &str) -> Self {
        Self {
            registry,
            admin: AdminSecret::new(admin_password),
        }
    }
}

/// Build the HTTP router.
///
/// When `static_dir` is given, files under it are served for any path the
/// API does not claim.
pub fn build_router(state: AppState, static_dir: Option<&Path>) -> Router {
    let api = Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/authenticate", post(handlers::authenticate))
        .route("/api/admin/login", post(handlers::admin_login))
        .route(
            "/api/admin/keys",
            get(handlers::list_keys).post(handlers::create_key),
        )
        .route("/api/admin/keys/{id}", delete(handlers::delete_key))
        .route("/api/admin/keys/{id}/ban", post(handlers::ban_key))
        .with_state(state);

    let app = match static_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    };

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
