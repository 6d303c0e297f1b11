//! Catalog server library logic.

pub mod config;
pub mod flash;
pub mod pages;
pub mod views;

use axum::{extract::DefaultBodyLimit, routing::get, Extension, Router};
use catalog_db::DbPool;
use flash::FlashSigner;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
///
/// Built once in `main` and handed to the router; handlers never reach for
/// a global database handle.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Signs and verifies the flash-notice cookie.
    pub flash: FlashSigner,
}

impl AppState {
    pub fn new(pool: DbPool, session_secret: &str) -> Self {
        Self {
            pool,
            flash: FlashSigner::new(session_secret),
        }
    }
}

/// Maximum request body size (64 KiB). A product form is two short fields.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::index_handler))
        .route(
            "/new",
            get(pages::new_product_form_handler).post(pages::create_product_handler),
        )
        .route("/{id}/", get(pages::view_product_handler))
        .route(
            "/{id}/edit",
            get(pages::edit_product_form_handler).post(pages::update_product_handler),
        )
        .route("/{id}/delete", get(pages::delete_product_handler))
        .fallback(pages::not_found_handler)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
