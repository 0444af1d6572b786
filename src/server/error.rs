// src/server/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::deals::DealError;
use crate::sheets::SheetError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing x-user-email header")]
    Unauthenticated,
    #[error("{0} is not an admin")]
    NotAdmin(String),
    #[error(transparent)]
    Deal(#[from] DealError),
}

impl From<SheetError> for AppError {
    fn from(e: SheetError) -> Self {
        AppError::Deal(DealError::Sheet(e))
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::NotAdmin(_) => StatusCode::FORBIDDEN,
            AppError::Deal(e) => match e {
                DealError::NotFound { .. } => StatusCode::NOT_FOUND,
                DealError::AlreadyDecided { .. } | DealError::Duplicate(_) => StatusCode::CONFLICT,
                DealError::Invalid(_) => StatusCode::BAD_REQUEST,
                DealError::Forbidden(_) => StatusCode::FORBIDDEN,
                DealError::Sheet(SheetError::Api { .. } | SheetError::Http(_)) => StatusCode::BAD_GATEWAY,
                DealError::Sheet(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Message safe to hand to the browser; storage failures stay in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::Deal(DealError::Sheet(e)) => {
                error!("Deal registry storage failure: {}", e);
                "The deal registry is unavailable, please try again".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.public_message() }))).into_response()
    }
}
