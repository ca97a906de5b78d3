//! Application wiring: router, shared services, and response mapping.
//!
//! - `services.rs`: backend selection and the handles handlers share
//! - `routes/`: handlers, one file per catalog area
//! - `views/`: HTML rendering
//! - `dto.rs`: form bodies and their mapping to validation inputs
//! - `errors.rs`: HTML and JSON error responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;
pub mod views;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: services::AppServices) -> Router {
    Router::new()
        .route("/", get(routes::system::root))
        .route("/health", get(routes::system::health))
        .route("/catalog", get(routes::home::home))
        .route("/catalog/", get(routes::home::home))
        .nest("/catalog", routes::router())
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn(middleware::request_logging))
                .layer(Extension(Arc::new(services))),
        )
}
