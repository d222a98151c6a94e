//! 계정별 알림.
//!
//! 프로젝트 등록, 제안 수락/거절 시 대상 계정에 기록됩니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AccountId;

/// 알림 레코드.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub account_id: AccountId,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl Notification {
    pub fn new(account_id: AccountId, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            account_id,
            message: message.into(),
            created_at: Utc::now(),
            read: false,
        }
    }
}
