//! # Freelance Core
//!
//! 프리랜서 마켓플레이스의 핵심 도메인 모델과 공용 인프라를 제공합니다:
//! - 계정, 역할, 프로젝트, 리뷰, 메시지, 청구, 알림 타입
//! - 저장소 협력자 트레이트와 인메모리/PostgreSQL 구현
//! - 비밀번호 해싱과 TOTP
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod crypto;
pub mod domain;
pub mod error;
pub mod logging;
pub mod store;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use store::{
    AccountStore, BillingStore, MemoryStore, MessageStore, NotificationStore, ProjectStore,
    ReviewStore, Store, StoreError, StoreHealth, StoreResult,
};
#[cfg(feature = "sqlx-support")]
pub use store::PgStore;
