use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Uuid>,
}

/// Error surface for the webhook endpoints. Processor failures do not travel
/// through this type where a session result is expected; handlers translate
/// those into `*_FAILURE` results instead.
#[derive(Debug)]
pub enum ApiError {
    BadRequest { code: &'static str, message: Option<String>, trace_id: Option<Uuid> },
    Unauthorized { code: &'static str },
    NotFound { code: &'static str },
    Internal { message: Option<String>, trace_id: Option<Uuid> },
}

impl ApiError {
    pub fn bad_request(code: &'static str) -> Self {
        Self::BadRequest { code, message: None, trace_id: None }
    }

    pub fn bad_request_msg(code: &'static str, message: impl Into<String>) -> Self {
        Self::BadRequest { code, message: Some(message.into()), trace_id: None }
    }

    pub fn unauthorized(code: &'static str) -> Self {
        Self::Unauthorized { code }
    }

    pub fn not_found(code: &'static str) -> Self {
        Self::NotFound { code }
    }

    pub fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal { message: Some(e.to_string()), trace_id: Some(Uuid::new_v4()) }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body, error_code) = match self {
            ApiError::BadRequest { code, message, trace_id } => (
                StatusCode::BAD_REQUEST,
                ErrorBody { code: code.into(), message, trace_id },
                code,
            ),
            ApiError::Unauthorized { code } => (
                StatusCode::UNAUTHORIZED,
                ErrorBody { code: code.into(), message: None, trace_id: None },
                code,
            ),
            ApiError::NotFound { code } => (
                StatusCode::NOT_FOUND,
                ErrorBody { code: code.into(), message: None, trace_id: None },
                code,
            ),
            ApiError::Internal { message, trace_id } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody { code: "internal_error".into(), message, trace_id },
                "internal_error",
            ),
        };
        let mut resp = (status, Json(body)).into_response();
        if let Ok(val) = HeaderValue::from_str(error_code) {
            resp.headers_mut().insert("X-Error-Code", val);
        }
        resp
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
