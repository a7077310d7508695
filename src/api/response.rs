use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::ApiError;

/// `{ message, result }` wrapper for every successful response.
#[derive(Debug, Serialize)]
pub struct SuccessBody<T> {
    pub message: String,
    pub result: T,
}

/// `{ message, errorInfo }` wrapper for every failed response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub message: String,
    pub error_info: Option<serde_json::Value>,
}

#[derive(Debug)]
pub struct ApiResponse<T> {
    pub status: StatusCode,
    pub body: SuccessBody<T>,
}

impl<T> ApiResponse<T> {
    pub fn new(status: StatusCode, message: &str, result: T) -> Self {
        Self {
            status,
            body: SuccessBody {
                message: message.to_string(),
                result,
            },
        }
    }

    pub fn ok(message: &str, result: T) -> Self {
        Self::new(StatusCode::OK, message, result)
    }

    pub fn created(message: &str, result: T) -> Self {
        Self::new(StatusCode::CREATED, message, result)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingFields
            | ApiError::MissingName
            | ApiError::InvalidInput
            | ApiError::InvalidRange => StatusCode::BAD_REQUEST,
            ApiError::DeviceNotFound | ApiError::LocationNotFound | ApiError::RouteNotFound => {
                StatusCode::NOT_FOUND
            }
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Store(err) = &self {
            log::error!("request failed: {:#}", err);
        }

        let body = ErrorBody {
            message: self.to_string(),
            error_info: None,
        };
        (self.status(), Json(body)).into_response()
    }
}
