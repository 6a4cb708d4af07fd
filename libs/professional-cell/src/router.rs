use std::sync::Arc;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn professional_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::create_professional))
        .route("/", get(handlers::search_professionals))
        .route("/{professional_id}", get(handlers::get_professional))
        .route("/{professional_id}", put(handlers::update_professional))
        .route("/{professional_id}", delete(handlers::delete_professional))
        .with_state(state)
}
