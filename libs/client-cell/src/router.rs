use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn client_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::create_client))
        .route("/", get(handlers::search_clients))
        .route("/{client_id}", get(handlers::get_client))
        .route("/{client_id}", put(handlers::update_client))
        .route("/{client_id}", delete(handlers::delete_client))
        .with_state(state)
}
