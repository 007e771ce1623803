use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::external::StoreError;
use crate::services::benchmark_service::BenchmarkError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("No mutual funds available. Please load sample data first.")]
    NoFundsAvailable,
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Database error: {0}")]
    Db(sqlx::Error),
    #[error("External error: {0}")]
    External(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NoFundsAvailable => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::External(_) => StatusCode::BAD_GATEWAY,
        };

        let message = match &self {
            AppError::Db(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let code = match &self {
            AppError::NoFundsAvailable => "no_funds_available",
            AppError::Validation(_) => "validation",
            AppError::NotFound(_) => "not_found",
            AppError::Db(_) => "internal",
            AppError::External(_) => "external",
        };

        (status, Json(json!({ "code": code, "message": message }))).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Database(e) => AppError::Db(e),
            other => AppError::External(other.to_string()),
        }
    }
}

impl From<BenchmarkError> for AppError {
    fn from(value: BenchmarkError) -> Self {
        match value {
            BenchmarkError::EmptyBasket => AppError::Validation(value.to_string()),
            BenchmarkError::NoUsablePeriods => AppError::NotFound(value.to_string()),
            BenchmarkError::Source(e) => e.into(),
        }
    }
}
