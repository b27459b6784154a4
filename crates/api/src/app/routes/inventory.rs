use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use stockpile_infra::{MutationError, MutationReport};
use stockpile_inventory::{MutationKind, Notice, Quantity};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items))
        .route("/clear", post(clear_inventory))
        .route("/items", post(add_item))
        .route("/items/:name", axum::routing::delete(delete_item))
        .route("/items/:name/increment", post(increment_item))
        .route("/items/:name/decrement", post(decrement_item))
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::ListQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", rejection.body_text(), None);
        }
    };

    let mutator = services.mutator();
    let listing = if query.reconcile {
        mutator.reconcile().await
    } else {
        mutator.list().await
    };

    match listing {
        Ok(items) => (
            StatusCode::OK,
            Json(dto::ListingResponse {
                items: dto::items_to_json(&items),
            }),
        )
            .into_response(),
        Err(e) => errors::listing_error_to_response(e, services.notice_dismiss_ms()),
    }
}

pub async fn add_item(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<dto::AddItemRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(body) = match body {
        Ok(b) => b,
        Err(rejection) => {
            return errors::mutation_error_to_response(
                MutationKind::Add,
                MutationError::Validation(rejection.body_text()),
                services.notice_dismiss_ms(),
            );
        }
    };

    let initial = match body.quantity.map(Quantity::from_signed).transpose() {
        Ok(q) => q.unwrap_or(Quantity::ONE),
        Err(e) => {
            return errors::mutation_error_to_response(
                MutationKind::Add,
                MutationError::from(e),
                services.notice_dismiss_ms(),
            );
        }
    };

    let result = services.mutator().add(&body.name, initial).await;
    mutation_response(&services, MutationKind::Add, result)
}

pub async fn increment_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
) -> axum::response::Response {
    let result = services.mutator().add(&name, Quantity::ONE).await;
    mutation_response(&services, MutationKind::Add, result)
}

pub async fn decrement_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
) -> axum::response::Response {
    let result = services.mutator().remove(&name).await;
    mutation_response(&services, MutationKind::Remove, result)
}

pub async fn delete_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(name): Path<String>,
) -> axum::response::Response {
    let result = services.mutator().delete(&name).await;
    mutation_response(&services, MutationKind::Delete, result)
}

/// Bulk clear is not offered: the confirmation is answered without touching
/// the store.
pub async fn clear_inventory() -> axum::response::Response {
    errors::json_error(
        StatusCode::NOT_IMPLEMENTED,
        "clear_not_supported",
        "clearing the whole inventory is not supported",
        None,
    )
}

fn mutation_response(
    services: &AppServices,
    kind: MutationKind,
    result: Result<MutationReport, MutationError>,
) -> axum::response::Response {
    let dismiss_after_ms = services.notice_dismiss_ms();
    match result {
        Ok(report) => {
            let notice = dto::NoticeResponse::new(Notice::success(kind), dismiss_after_ms);
            (StatusCode::OK, Json(dto::report_to_json(&report, notice))).into_response()
        }
        Err(e) => errors::mutation_error_to_response(kind, e, dismiss_after_ms),
    }
}
