use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn service_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::create_service))
        .route("/", get(handlers::search_services))
        .route("/{service_id}", get(handlers::get_service))
        .route("/{service_id}", put(handlers::update_service))
        .route("/{service_id}", delete(handlers::delete_service))
        .with_state(state)
}
