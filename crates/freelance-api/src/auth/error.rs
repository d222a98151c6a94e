//! 인증 게이트 거부 사유.
//!
//! 모든 거부는 요청을 종료시키며 자동 재시도되지 않습니다.
//! `StoreUnavailable`만 호출자가 백오프 후 재시도할 수 있습니다.

use axum::{
    http::{
        header::{RETRY_AFTER, WWW_AUTHENTICATE},
        HeaderValue, StatusCode,
    },
    response::{IntoResponse, Response},
    Json,
};
use freelance_core::StoreError;
use serde_json::json;

use super::jwt::JwtError;

/// 인증/인가 에러.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Authorization token is required")]
    MissingToken,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token has expired")]
    ExpiredToken,
    #[error("Access denied")]
    Forbidden,
    #[error("Account not found")]
    AccountNotFound,
    #[error("Account role has changed, please sign in again")]
    RoleMismatch,
    #[error("Service temporarily unavailable, please retry")]
    StoreUnavailable,
}

impl AuthError {
    /// HTTP 상태 코드.
    ///
    /// 계정 없음은 자격 증명 실패로 간주하여 401로 응답합니다.
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingToken
            | AuthError::InvalidToken
            | AuthError::ExpiredToken
            | AuthError::AccountNotFound
            | AuthError::RoleMismatch => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// 로그와 메트릭 라벨용 사유.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::InvalidToken => "invalid_token",
            AuthError::ExpiredToken => "expired_token",
            AuthError::Forbidden => "forbidden",
            AuthError::AccountNotFound => "account_not_found",
            AuthError::RoleMismatch => "role_mismatch",
            AuthError::StoreUnavailable => "store_unavailable",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::StoreUnavailable)
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::ExpiredToken,
            JwtError::Invalid | JwtError::Encoding(_) => AuthError::InvalidToken,
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => AuthError::AccountNotFound,
            // 일시 장애 외의 저장소 오류도 세부 정보 없이 같은 응답으로
            StoreError::Unavailable(_)
            | StoreError::Conflict(_)
            | StoreError::Internal(_)
            | StoreError::Rejected(_) => AuthError::StoreUnavailable,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = (status, Json(json!({ "message": self.to_string() }))).into_response();

        let headers = response.headers_mut();
        if status == StatusCode::UNAUTHORIZED {
            headers.insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        if self.is_retryable() {
            headers.insert(RETRY_AFTER, HeaderValue::from_static("1"));
        }
        response
    }
}
