//! 인증 및 권한 부여.
//!
//! JWT 기반 인증과 역할 기반 접근 제어를 제공합니다.
//!
//! # 구성 요소
//!
//! - [`TokenIssuer`] / [`TokenVerifier`]: 토큰 발급과 검증 (Credential Verifier)
//! - [`RoleSet`]: 라우트별 허용 역할 집합
//! - [`role_gate`]: 토큰 검증 및 역할 확인 미들웨어 (Role Gate)
//! - [`load_identity`]: 저장된 계정 조회 미들웨어 (Identity Loader)
//! - [`CurrentAccount`]: 핸들러용 계정 추출기
//! - [`AuthError`]: 거부 사유와 HTTP 상태 매핑
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! let router = gated(
//!     Router::new().route("/clients/profile", get(get_profile)),
//!     &state,
//!     CLIENTS,
//! );
//!
//! async fn get_profile(CurrentAccount(account): CurrentAccount) -> impl IntoResponse {
//!     Json(account)
//! }
//! ```

mod error;
mod jwt;
mod middleware;
mod roles;

pub use error::AuthError;
pub use jwt::{Claims, IssuedToken, JwtError, TokenIssuer, TokenVerifier};
pub use middleware::{
    bearer_token, gated, load_identity, role_gate, CurrentAccount, GateStage, IdentityLoader,
    RoleGate,
};
pub use roles::{RoleSet, ADMINS, ANY_ROLE, CLIENTS, FREELANCERS, MEMBERS};
