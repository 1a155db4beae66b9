use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Every way a request can fail. All of them end at the request boundary as a
/// status code plus `{"error": <message>}`, except 405 which has no body.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Body was not JSON, had a wrongly typed field, or lacked a required one.
    #[error("Missing required fields")]
    Validation,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Route not found")]
    RouteNotFound,

    /// The collection's largest id leaves no successor.
    #[error("Failed to assign id")]
    IdsExhausted,

    #[error("Failed to load data")]
    Load(#[source] StoreError),

    #[error("Failed to save data")]
    Save(#[source] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::IdsExhausted | ApiError::Load(_) | ApiError::Save(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED.into_response(),
            other => (other.status(), Json(json!({ "error": other.to_string() }))).into_response(),
        }
    }
}
