//! Error types for the server

use crate::error::CardioError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("No model is loaded: {0}")]
    ModelUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CardioError> for ServerError {
    fn from(e: CardioError) -> Self {
        match e {
            CardioError::ValidationError(msg) => ServerError::BadRequest(msg),
            CardioError::ArtifactNotFound { .. } | CardioError::InferenceError(_) => {
                ServerError::ModelUnavailable(e.to_string())
            }
            other => ServerError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ServerError::ModelUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            ServerError::Internal(msg) => {
                tracing::error!(detail = %msg, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": true,
            "message": message,
        }));

        (status, body).into_response()
    }
}
