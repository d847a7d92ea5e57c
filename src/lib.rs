pub mod api;
pub mod config;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, header},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::AppConfig;
use crate::services::converter::ImageConverter;
use crate::services::storage::StorageService;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub storage: Arc<StorageService>,
    pub converter: Arc<dyn ImageConverter>,
}

pub fn create_app(state: AppState) -> Router {
    // Converted artifacts are immutable until reaped, so clients may cache
    // them for the retention window
    let downloads = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=3600"),
        ))
        .service(ServeDir::new(state.storage.converted_dir()));

    Router::new()
        .route("/convert", post(api::handlers::convert::convert_files))
        .route("/health", get(api::handlers::health::health_check))
        .route("/check-files", get(api::handlers::files::check_files))
        .nest_service("/downloads", downloads)
        .layer(cors_layer(&state.config))
        .layer(DefaultBodyLimit::max(state.config.body_limit()))
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.is_development() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}
