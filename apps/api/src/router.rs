use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::appointment_routes;
use client_cell::router::client_routes;
use professional_cell::router::professional_routes;
use service_cell::router::service_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "Agenda API is running!" }))
        .nest("/clients", client_routes(state.clone()))
        .nest("/professionals", professional_routes(state.clone()))
        .nest("/services", service_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
}
