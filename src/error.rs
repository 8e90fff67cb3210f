use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::server::CalcResponse;

/// 計算リクエストで発生しうるエラー。どれも 500 として返される。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalcError {
    #[error("Invalid number format")]
    InvalidNumberFormat,
    #[error("Invalid operation")]
    InvalidOperation,
    #[error("Division by zero is not allowed")]
    DivisionByZero,
}

impl IntoResponse for CalcError {
    fn into_response(self) -> Response {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        (status, Json(CalcResponse::failure(status, self.to_string()))).into_response()
    }
}
