//! Application setup and server configuration.

use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::kernel::ServerDeps;
use crate::server::routes::{
    check_groq_handler, get_archive_handler, get_article_handler, health_handler,
    mark_read_handler, read_articles_handler, rewrite_handler, rewritten_articles_handler,
    test_generate_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: ServerDeps,
}

/// Build the Axum application router
pub fn build_app(config: &Config, pool: PgPool) -> Router {
    let deps = ServerDeps::new(config, pool);
    build_app_with_deps(deps)
}

pub fn build_app_with_deps(deps: ServerDeps) -> Router {
    let state = AppState { deps };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .allow_origin(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/article", get(get_article_handler))
        .route("/api/archive", get(get_archive_handler))
        .route("/api/rewrite", post(rewrite_handler))
        .route("/api/articles/mark-read", post(mark_read_handler))
        .route("/api/articles/read", get(read_articles_handler))
        .route("/api/articles/rewritten", get(rewritten_articles_handler))
        .route("/api/check-groq", get(check_groq_handler))
        .route("/api/test-generate", post(test_generate_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
