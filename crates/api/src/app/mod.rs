//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: the role catalog backing the endpoints
//! - `routes/`: HTTP routes + handlers
//! - `errors.rs`: consistent `{ "error": .. }` responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api/ajustes/roles", routes::roles::router())
        .layer(ServiceBuilder::new().layer(Extension(services)))
}
