//! 알림 endpoint와 알림 생성 헬퍼.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use freelance_core::{AccountId, Notification, Store};
use serde::Deserialize;
use tracing::warn;

use crate::auth::{gated, CurrentAccount, ANY_ROLE};
use crate::error::ApiResult;
use crate::extract::QueryParams;
use crate::metrics::record_notifications;
use crate::state::AppState;

/// 한 번에 조회할 수 있는 최대 알림 수
const MAX_LIMIT: usize = 100;

/// 알림 조회 파라미터.
#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// 내 알림 목록 (최신 순).
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    CurrentAccount(account): CurrentAccount,
    QueryParams(query): QueryParams<NotificationQuery>,
) -> ApiResult<Json<Vec<Notification>>> {
    let limit = query.limit.map(|l| l.min(MAX_LIMIT));
    Ok(Json(state.store.notifications_for(&account.id, limit).await?))
}

/// 여러 계정에 같은 알림 기록.
///
/// 알림 실패는 요청을 실패시키지 않고 로그만 남깁니다.
/// 기록된 알림 수를 반환합니다.
pub(crate) async fn notify_all<'a, I>(
    store: &dyn Store,
    kind: &'static str,
    recipients: I,
    message: &str,
) -> u64
where
    I: IntoIterator<Item = &'a AccountId>,
{
    let mut sent = 0;
    for account_id in recipients {
        match store
            .insert_notification(Notification::new(account_id.clone(), message))
            .await
        {
            Ok(_) => sent += 1,
            Err(e) => {
                warn!(account_id = %account_id, kind, error = %e, "Failed to record notification");
            }
        }
    }
    if sent > 0 {
        record_notifications(kind, sent);
    }
    sent
}

/// 한 계정에 알림 기록.
pub(crate) async fn notify(
    store: &dyn Store,
    kind: &'static str,
    account_id: &AccountId,
    message: &str,
) -> bool {
    notify_all(store, kind, std::iter::once(account_id), message).await == 1
}

/// 알림 라우터 생성.
pub fn notifications_router(state: &AppState) -> Router<Arc<AppState>> {
    gated(
        Router::new().route("/", get(list_notifications)),
        state,
        ANY_ROLE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use freelance_core::{MemoryStore, NotificationStore};

    #[tokio::test]
    async fn test_notify_all_counts_recorded() {
        let store = MemoryStore::new();
        let ids = [AccountId::new("f1"), AccountId::new("f2")];

        let sent = notify_all(&store, "project_posted", ids.iter(), "New project").await;
        assert_eq!(sent, 2);

        let list = store.notifications_for(&ids[0], None).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].message, "New project");
    }

    #[tokio::test]
    async fn test_notify_failure_is_not_fatal() {
        let store = MemoryStore::new();
        store.set_available(false);

        assert!(!notify(&store, "proposal", &AccountId::new("f1"), "hello").await);
    }
}
