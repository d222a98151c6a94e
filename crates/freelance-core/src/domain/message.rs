//! 클라이언트와 프리랜서 간 메시지.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AccountId;
use crate::error::{CoreError, CoreResult};

/// 메시지 본문 최대 길이
pub const MAX_MESSAGE_LEN: usize = 5000;

/// 메시지 레코드.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    /// 관련 프로젝트 (선택)
    #[serde(default)]
    pub project_id: Option<Uuid>,
    pub content: String,
    pub sender: AccountId,
    pub receiver: AccountId,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
}

impl Message {
    pub fn new(
        sender: AccountId,
        receiver: AccountId,
        project_id: Option<Uuid>,
        content: &str,
    ) -> CoreResult<Self> {
        let content = content.trim();
        if content.is_empty() {
            return Err(CoreError::Validation("Message content is required".to_string()));
        }
        if content.chars().count() > MAX_MESSAGE_LEN {
            return Err(CoreError::Validation(format!(
                "Message content exceeds {} characters",
                MAX_MESSAGE_LEN
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            project_id,
            content: content.to_string(),
            sender,
            receiver,
            sent_at: Utc::now(),
            read: false,
        })
    }

    /// 송신자 또는 수신자인지 확인.
    pub fn is_participant(&self, account: &AccountId) -> bool {
        &self.sender == account || &self.receiver == account
    }
}

/// 메시지 조회 필터.
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    pub project_id: Option<Uuid>,
    /// 송신자 또는 수신자
    pub participant: Option<AccountId>,
    /// 수신자만
    pub receiver: Option<AccountId>,
    /// 최신 N개 (None이면 전체)
    pub latest: Option<usize>,
}

impl MessageFilter {
    pub fn matches(&self, message: &Message) -> bool {
        if let Some(project) = self.project_id {
            if message.project_id != Some(project) {
                return false;
            }
        }
        if let Some(ref participant) = self.participant {
            if !message.is_participant(participant) {
                return false;
            }
        }
        if let Some(ref receiver) = self.receiver {
            if &message.receiver != receiver {
                return false;
            }
        }
        true
    }
}
