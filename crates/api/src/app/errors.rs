use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockpile_infra::{MutationError, StoreError};
use stockpile_inventory::{EMPTY_NAME, MutationKind, Notice};

use crate::app::dto::NoticeResponse;

/// Map a failed mutation to a status code, an error code and its notice.
pub fn mutation_error_to_response(
    kind: MutationKind,
    err: MutationError,
    dismiss_after_ms: u64,
) -> axum::response::Response {
    let (status, code, notice) = match &err {
        MutationError::Validation(msg) if msg == EMPTY_NAME => {
            (StatusCode::BAD_REQUEST, "validation_error", Notice::empty_name())
        }
        MutationError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error", Notice::failure(kind)),
        MutationError::Busy(_) => (StatusCode::CONFLICT, "busy", Notice::failure(kind)),
        MutationError::Store(StoreError::Conflict(_)) => (StatusCode::CONFLICT, "conflict", Notice::failure(kind)),
        MutationError::Store(_) => (StatusCode::SERVICE_UNAVAILABLE, "store_error", Notice::failure(kind)),
    };
    json_error(status, code, err.to_string(), Some(NoticeResponse::new(notice, dismiss_after_ms)))
}

/// Map a failed listing read.
pub fn listing_error_to_response(err: MutationError, dismiss_after_ms: u64) -> axum::response::Response {
    json_error(
        StatusCode::SERVICE_UNAVAILABLE,
        "store_error",
        err.to_string(),
        Some(NoticeResponse::new(Notice::fetch_failed(), dismiss_after_ms)),
    )
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
    notice: Option<NoticeResponse>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
            "notice": notice,
        })),
    )
        .into_response()
}
