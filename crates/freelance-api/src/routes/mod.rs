//! API 라우트.
//!
//! 모든 REST API 엔드포인트를 정의하고 라우터를 구성합니다.
//! 보호된 라우트는 [`crate::auth::gated`]로 역할 게이트와 계정 로더를 거칩니다.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/api/v1/users` - 가입, 로그인, 계정 관리, 2FA
//! - `/api/v1/freelancers` - 프리랜서 조회 및 프로필
//! - `/api/v1/clients` - 클라이언트 프로필 및 프로젝트
//! - `/api/v1/projects` - 프로젝트, 관심 표시, 제안 수락/거절
//! - `/api/v1/reviews` - 프리랜서 리뷰
//! - `/api/v1/messages` - 메시지
//! - `/api/v1/admin` - 관리자 집계
//! - `/api/v1/dashboard` - 계정별 대시보드
//! - `/api/v1/billing` - 청구 기록
//! - `/api/v1/legal` - 약관 동의, 개인정보 설정
//! - `/api/v1/notifications` - 알림

pub mod admin;
pub mod billing;
pub mod clients;
pub mod dashboard;
pub mod freelancers;
pub mod health;
pub mod legal;
pub mod messages;
pub mod notifications;
pub mod projects;
pub mod reviews;
pub mod users;

pub use admin::{admin_router, AdminDashboard};
pub use billing::billing_router;
pub use clients::clients_router;
pub use dashboard::{dashboard_router, DashboardResponse};
pub use freelancers::freelancers_router;
pub use health::{health_router, ComponentHealth, ComponentStatus, HealthResponse};
pub use legal::legal_router;
pub use messages::messages_router;
pub use notifications::notifications_router;
pub use projects::projects_router;
pub use reviews::reviews_router;
pub use users::{users_router, LoginResponse, TwoFactorResult, TwoFactorSetup};

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
///
/// 모든 서브 라우터를 조합하여 하나의 라우터로 반환합니다.
/// 게이트 미들웨어가 상태의 검증자와 저장소를 공유하도록 상태를 받습니다.
pub fn create_api_router(state: &AppState) -> Router<Arc<AppState>> {
    Router::new()
        // 헬스 체크 엔드포인트
        .nest("/health", health_router())
        // API v1 엔드포인트
        .nest("/api/v1/users", users_router(state))
        .nest("/api/v1/freelancers", freelancers_router(state))
        .nest("/api/v1/clients", clients_router(state))
        .nest("/api/v1/projects", projects_router(state))
        .nest("/api/v1/reviews", reviews_router(state))
        .nest("/api/v1/messages", messages_router(state))
        .nest("/api/v1/admin", admin_router(state))
        .nest("/api/v1/dashboard", dashboard_router(state))
        .nest("/api/v1/billing", billing_router(state))
        .nest("/api/v1/legal", legal_router(state))
        .nest("/api/v1/notifications", notifications_router(state))
}
