use std::str::FromStr;

use axum::response::Response;
use axum::Router;

use stockroom_core::DomainError;
use stockroom_infra::store::StoreError;

use crate::app::errors::AppError;

pub mod articles;
pub mod categories;
pub mod home;
pub mod inventories;
pub mod system;

pub type HandlerResult = Result<Response, AppError>;

/// Router for the catalog areas, nested under `/catalog`.
pub fn router() -> Router {
    Router::new()
        .nest("/category", categories::router())
        .nest("/article", articles::router())
        .nest("/inventory", inventories::router())
}

/// Parse a path id; malformed ids read as a missing record.
pub(crate) fn parse_id<T: FromStr>(raw: &str, what: &'static str) -> Result<T, AppError> {
    raw.trim().parse().map_err(|_| AppError::NotFound(what))
}

pub(crate) fn is_conflict(err: &StoreError) -> bool {
    matches!(err, StoreError::Domain(DomainError::Conflict(_)))
}

pub(crate) fn is_not_found(err: &StoreError) -> bool {
    matches!(err, StoreError::Domain(DomainError::NotFound))
}
