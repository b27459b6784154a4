//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store selection and the shared inventory mutator
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses and notices

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;

use stockpile_infra::StoreError;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &ApiConfig) -> Result<Router, StoreError> {
    let services = services::build_services(config).await?;
    Ok(build_app_with(services))
}

/// Build the router around already-wired services.
pub fn build_app_with(services: services::AppServices) -> Router {
    routes::router()
        .layer(Extension(Arc::new(services)))
        .layer(ServiceBuilder::new().layer(axum::middleware::from_fn(middleware::request_id)))
}
