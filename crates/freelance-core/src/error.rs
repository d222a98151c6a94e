//! 마켓플레이스 도메인 에러 타입.
//!
//! 도메인 규칙 위반과 설정 오류를 나타냅니다. 저장소 에러는
//! [`crate::store::StoreError`]에서 별도로 다룹니다.

use thiserror::Error;

/// 핵심 도메인 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 입력 값 검증 실패
    #[error("{0}")]
    Validation(String),

    /// 허용되지 않은 상태 전이
    #[error("Cannot move project from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),
}

/// 도메인 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// 클라이언트 입력 문제인지 확인합니다.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CoreError::Validation(_) | CoreError::InvalidTransition { .. }
        )
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::InvalidTransition {
            from: "open".to_string(),
            to: "completed".to_string(),
        };
        assert_eq!(err.to_string(), "Cannot move project from open to completed");
        assert!(err.is_client_error());

        let err = CoreError::Config("missing secret".to_string());
        assert!(!err.is_client_error());
    }
}
