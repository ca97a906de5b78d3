use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use stockroom_catalog::ValidationErrors;
use stockroom_core::DomainError;
use stockroom_infra::store::StoreError;

use crate::app::views;

/// Failure of an HTML handler.
///
/// Validation failures and blocked deletes are not errors here: handlers
/// render those as ordinary pages.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(what) => not_found(what),
            AppError::Store(StoreError::Domain(DomainError::NotFound)) => not_found("Record"),
            AppError::Store(e) => {
                tracing::error!(error = %e, "store failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    views::error_page(
                        "Something went wrong",
                        "The request could not be completed. Please try again later.",
                    ),
                )
                    .into_response()
            }
        }
    }
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        views::error_page("Not found", &format!("{what} not found.")),
    )
        .into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// `400` body listing every failed field.
pub fn json_validation_error(errors: ValidationErrors) -> Response {
    (
        StatusCode::BAD_REQUEST,
        axum::Json(json!({
            "error": "validation_error",
            "errors": errors.into_vec(),
        })),
    )
        .into_response()
}

/// JSON mapping used by the stock-transfer endpoint.
pub fn store_error_to_json(err: StoreError) -> Response {
    match err {
        StoreError::Domain(DomainError::NotFound) => {
            json_error(StatusCode::NOT_FOUND, "not_found", "Article not found")
        }
        StoreError::Domain(DomainError::InsufficientStock { .. }) => json_error(
            StatusCode::BAD_REQUEST,
            "insufficient_stock",
            "Insufficient stock",
        ),
        StoreError::Domain(DomainError::Conflict(msg)) => {
            json_error(StatusCode::CONFLICT, "conflict", msg)
        }
        other => {
            tracing::error!(error = %other, "stock transfer failed");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "Internal error",
            )
        }
    }
}
