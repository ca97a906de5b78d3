use axum::{http::StatusCode, response::Redirect};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn root() -> Redirect {
    Redirect::to("/catalog/")
}
