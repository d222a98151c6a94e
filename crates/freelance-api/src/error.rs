//! 도메인 핸들러 에러 응답.
//!
//! 모든 에러는 `{"message": "..."}` 형식의 JSON으로 응답하며,
//! 입력 검증 실패는 필드별 메시지를 `errors` 배열로 추가합니다.
//! 내부 에러의 상세 내용은 로그에만 남습니다.
//!
//! ```json
//! {
//!   "message": "Validation failed",
//!   "errors": ["Please provide a valid email address"]
//! }
//! ```

use axum::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use freelance_core::crypto::{PasswordError, TotpError};
use freelance_core::{CoreError, StoreError};
use serde::{Deserialize, Serialize};
use tracing::error;
use validator::ValidationErrors;

use crate::auth::{AuthError, JwtError};

/// 에러 응답 본문.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 필드별 검증 에러 (선택적)
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub errors: Option<Vec<String>>,
}

impl ApiErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: None,
        }
    }
}

/// 도메인 핸들러 에러.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Validation failed")]
    Validation(Vec<String>),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// 게이트 거부와 동일한 응답
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Service temporarily unavailable, please retry")]
    Unavailable,

    /// 상세 내용은 응답에 포함되지 않음
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Auth(e) => e.status(),
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Auth(e) => e.into_response(),
            ApiError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                Json(ApiErrorResponse {
                    message: "Validation failed".to_string(),
                    errors: Some(errors),
                }),
            )
                .into_response(),
            ApiError::Unavailable => {
                let mut response = (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(ApiErrorResponse::new(ApiError::Unavailable.to_string())),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(RETRY_AFTER, HeaderValue::from_static("1"));
                response
            }
            ApiError::Internal(ref detail) => {
                error!(error = %detail, "Request failed");
                (self.status(), Json(ApiErrorResponse::new(self.to_string()))).into_response()
            }
            other => (other.status(), Json(ApiErrorResponse::new(other.to_string()))).into_response(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound("Resource not found".to_string()),
            StoreError::Conflict(_) => ApiError::Conflict("Resource already exists".to_string()),
            StoreError::Unavailable(detail) => {
                tracing::warn!(error = %detail, "Store unavailable");
                ApiError::Unavailable
            }
            StoreError::Internal(detail) => ApiError::Internal(detail),
            StoreError::Rejected(err) => err.into(),
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Config(detail) => ApiError::Internal(detail),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooShort(_) => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<TotpError> for ApiError {
    fn from(err: TotpError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{}: invalid value", field))
                })
            })
            .collect();
        messages.sort();
        ApiError::Validation(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_store_errors_map_to_status() {
        let (status, _) = body_json(StoreError::Conflict("users_email_key".into()).into()).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = body_json(StoreError::NotFound("x".into()).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = body_json(StoreError::Unavailable("pool".into()).into()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_internal_detail_is_hidden() {
        let err: ApiError = StoreError::Internal("syntax error at or near SELECT".into()).into();
        let (status, json) = body_json(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], "Internal server error");
        assert!(!json.to_string().contains("SELECT"));
    }

    #[tokio::test]
    async fn test_validation_errors_listed() {
        let (status, json) = body_json(ApiError::Validation(vec![
            "Please provide a valid email address".to_string(),
        ]))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Validation failed");
        assert_eq!(json["errors"][0], "Please provide a valid email address");
    }

    #[tokio::test]
    async fn test_core_error_is_bad_request() {
        let err: ApiError = CoreError::Validation("Title is required".into()).into();
        let (status, json) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Title is required");
        assert!(json.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_auth_error_passes_through() {
        let (status, json) = body_json(AuthError::Forbidden.into()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["message"], "Access denied");
    }
}
