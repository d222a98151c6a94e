//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 `Arc`로 래핑되어 요청 간에 공유됩니다.
//! 서명 시크릿은 설정에서 생성자로 전달되며 전역 상태로 보관하지 않습니다.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use freelance_core::crypto::TotpSettings;
use freelance_core::{AuthConfig, Store};

use crate::auth::{TokenIssuer, TokenVerifier};

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 저장소 협력자 (인메모리 또는 PostgreSQL)
    pub store: Arc<dyn Store>,

    /// 로그인 토큰 발급자
    pub issuer: Arc<TokenIssuer>,

    /// 보호된 요청의 토큰 검증자
    pub verifier: Arc<TokenVerifier>,

    /// 2단계 인증 파라미터
    pub totp: TotpSettings,

    /// 서버 시작 시간
    pub started_at: DateTime<Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 저장소와 인증 설정으로 상태 생성.
    ///
    /// 발급자와 검증자는 같은 시크릿을 공유합니다.
    pub fn new(store: Arc<dyn Store>, auth: &AuthConfig) -> Self {
        let secret = auth.signing_secret();
        Self {
            store,
            issuer: Arc::new(TokenIssuer::new(&secret, auth.token_ttl_minutes)),
            verifier: Arc::new(TokenVerifier::new(&secret, auth.leeway_secs)),
            totp: auth.totp.clone(),
            started_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 서버 업타임 (초).
    pub fn uptime_secs(&self) -> i64 {
        Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }

    /// 저장소 연결 상태 확인.
    pub async fn is_store_healthy(&self) -> bool {
        self.store.ping().await.is_ok()
    }
}

/// 테스트용 서명 시크릿
#[cfg(any(test, feature = "test-utils"))]
pub const TEST_JWT_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

/// 인메모리 저장소와 고정 시크릿을 사용하는 테스트용 AppState 생성.
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    use freelance_core::MemoryStore;
    use secrecy::SecretString;

    let auth = AuthConfig {
        jwt_secret: Some(SecretString::from(TEST_JWT_SECRET.to_string())),
        ..Default::default()
    };
    AppState::new(Arc::new(MemoryStore::new()), &auth)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_issuer_and_verifier_share_secret() {
        let state = create_test_state();
        let token = state
            .issuer
            .issue_for(&freelance_core::AccountId::new("u1"), freelance_core::Role::Admin)
            .unwrap();

        let claims = state.verifier.verify(&token.access_token).unwrap();
        assert_eq!(claims.sub, "u1");
        assert!(state.is_store_healthy().await);
        assert!(state.uptime_secs() >= 0);
    }
}
