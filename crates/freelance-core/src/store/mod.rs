//! 저장소 협력자 인터페이스.
//!
//! 모든 조회는 쓰기 직후 읽기 일관성(read-after-write)을 보장해야 합니다.
//! 역할 불일치 검사가 저장된 최신 역할을 기준으로 하기 때문입니다.
//!
//! - [`MemoryStore`]: 테스트 및 데이터베이스 없는 실행용
//! - `PgStore`: PostgreSQL 구현 (`sqlx-support` feature)

mod memory;
#[cfg(feature = "sqlx-support")]
mod postgres;

pub use memory::MemoryStore;
#[cfg(feature = "sqlx-support")]
pub use postgres::PgStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::error::CoreError;

use crate::domain::{
    Account, AccountChange, AccountId, BillingRecord, Message, MessageFilter, Notification,
    Project, ProjectFilter, Review, Role,
};

/// 저장소 에러.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 레코드를 찾을 수 없음
    #[error("Record not found: {0}")]
    NotFound(String),

    /// 유일성 제약 위반
    #[error("Duplicate record: {0}")]
    Conflict(String),

    /// 일시적인 백엔드 장애 (연결 실패, 풀 고갈 등)
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// 그 밖의 내부 에러
    #[error("Store error: {0}")]
    Internal(String),

    /// 변경이 도메인 검증에서 거부됨. 레코드는 바뀌지 않습니다.
    #[error(transparent)]
    Rejected(#[from] CoreError),
}

impl StoreError {
    /// 호출자가 재시도할 수 있는 에러인지 확인합니다.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

/// 저장소 작업을 위한 Result 타입.
pub type StoreResult<T> = Result<T, StoreError>;

/// 계정 저장소.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// ID로 계정 조회.
    async fn find_account(&self, id: &AccountId) -> StoreResult<Option<Account>>;

    /// 이메일로 계정 조회 (정규화된 이메일 기준).
    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    /// 계정 저장. 이메일이 중복되면 `Conflict`.
    async fn insert_account(&self, account: Account) -> StoreResult<Account>;

    /// 최신 레코드에 변경을 원자적으로 적용하고 결과를 반환.
    ///
    /// 없으면 `NotFound`, 검증 실패는 `Rejected`, 이메일 중복이면 `Conflict`.
    async fn modify_account(&self, id: &AccountId, change: AccountChange)
        -> StoreResult<Account>;

    /// 계정 삭제. 삭제 여부 반환.
    async fn delete_account(&self, id: &AccountId) -> StoreResult<bool>;

    /// 계정 목록 (생성 순).
    async fn list_accounts(&self, role: Option<Role>) -> StoreResult<Vec<Account>>;

    /// 역할별 계정 수.
    async fn count_accounts(&self, role: Role) -> StoreResult<u64>;
}

/// 프로젝트 저장소.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>>;

    async fn insert_project(&self, project: Project) -> StoreResult<Project>;

    /// 없으면 `NotFound`.
    async fn update_project(&self, project: Project) -> StoreResult<Project>;

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool>;

    /// 필터와 일치하는 프로젝트 (최신 등록 순).
    async fn list_projects(&self, filter: &ProjectFilter) -> StoreResult<Vec<Project>>;

    async fn count_projects(&self, filter: &ProjectFilter) -> StoreResult<u64>;
}

/// 리뷰 저장소.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn find_review(&self, id: Uuid) -> StoreResult<Option<Review>>;

    async fn insert_review(&self, review: Review) -> StoreResult<Review>;

    async fn update_review(&self, review: Review) -> StoreResult<Review>;

    async fn delete_review(&self, id: Uuid) -> StoreResult<bool>;

    /// 프리랜서가 받은 리뷰 (최신 순).
    async fn reviews_for_freelancer(&self, freelancer: &AccountId) -> StoreResult<Vec<Review>>;
}

/// 메시지 저장소.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn find_message(&self, id: Uuid) -> StoreResult<Option<Message>>;

    async fn insert_message(&self, message: Message) -> StoreResult<Message>;

    async fn update_message(&self, message: Message) -> StoreResult<Message>;

    async fn delete_message(&self, id: Uuid) -> StoreResult<bool>;

    /// 필터와 일치하는 메시지.
    ///
    /// `filter.latest`가 없으면 보낸 시각 오름차순 전체,
    /// 있으면 최신 N개를 내림차순으로 반환합니다.
    async fn list_messages(&self, filter: &MessageFilter) -> StoreResult<Vec<Message>>;
}

/// 청구 기록 저장소.
#[async_trait]
pub trait BillingStore: Send + Sync {
    /// 청구서 번호가 중복되면 `Conflict`.
    async fn insert_billing(&self, record: BillingRecord) -> StoreResult<BillingRecord>;

    /// 계정의 청구 기록 (거래일 최신 순).
    async fn billing_for_account(&self, account: &AccountId) -> StoreResult<Vec<BillingRecord>>;
}

/// 알림 저장소.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_notification(&self, notification: Notification) -> StoreResult<Notification>;

    /// 계정의 알림 (최신 순, `limit`개까지).
    async fn notifications_for(
        &self,
        account: &AccountId,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Notification>>;
}

/// 저장소 연결 상태 확인.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;
}

/// 마켓플레이스 전체 저장소.
pub trait Store:
    AccountStore
    + ProjectStore
    + ReviewStore
    + MessageStore
    + BillingStore
    + NotificationStore
    + StoreHealth
{
}

impl<T> Store for T where
    T: AccountStore
        + ProjectStore
        + ReviewStore
        + MessageStore
        + BillingStore
        + NotificationStore
        + StoreHealth
{
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unavailable_is_retryable() {
        assert!(StoreError::Unavailable("pool timed out".to_string()).is_retryable());
        assert!(!StoreError::NotFound("x".to_string()).is_retryable());
        assert!(!StoreError::Conflict("x".to_string()).is_retryable());
        assert!(!StoreError::Internal("x".to_string()).is_retryable());
    }
}
