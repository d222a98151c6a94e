//! 약관 동의와 개인정보 설정 endpoint.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{post, put},
    Json, Router,
};
use freelance_core::{AccountChange, PrivacySettings, PrivacyUpdate};
use serde::Serialize;
use tracing::info;

use crate::auth::{gated, CurrentAccount, ANY_ROLE};
use crate::error::ApiResult;
use crate::extract::JsonBody;
use crate::state::AppState;

/// 개인정보 설정 변경 응답.
#[derive(Debug, Serialize)]
pub struct PrivacySettingsResponse {
    pub message: String,
    pub privacy: PrivacySettings,
}

/// 이용약관 동의.
pub async fn agree_to_terms(
    State(state): State<Arc<AppState>>,
    CurrentAccount(account): CurrentAccount,
) -> ApiResult<Json<serde_json::Value>> {
    let account = state
        .store
        .modify_account(&account.id, AccountChange::AgreeToTerms)
        .await?;

    info!(account_id = %account.id, "Terms accepted");
    Ok(Json(
        serde_json::json!({ "message": "User agreed to terms successfully" }),
    ))
}

/// 개인정보 처리방침 동의.
pub async fn agree_to_privacy_policy(
    State(state): State<Arc<AppState>>,
    CurrentAccount(account): CurrentAccount,
) -> ApiResult<Json<serde_json::Value>> {
    let account = state
        .store
        .modify_account(&account.id, AccountChange::AgreeToPrivacyPolicy)
        .await?;

    info!(account_id = %account.id, "Privacy policy accepted");
    Ok(Json(
        serde_json::json!({ "message": "User agreed to privacy policy successfully" }),
    ))
}

/// 개인정보 설정 변경.
pub async fn update_privacy_settings(
    State(state): State<Arc<AppState>>,
    CurrentAccount(account): CurrentAccount,
    JsonBody(update): JsonBody<PrivacyUpdate>,
) -> ApiResult<Json<PrivacySettingsResponse>> {
    let account = state
        .store
        .modify_account(&account.id, AccountChange::Privacy(update))
        .await?;

    Ok(Json(PrivacySettingsResponse {
        message: "Privacy settings updated successfully".to_string(),
        privacy: account.privacy,
    }))
}

/// 약관 라우터 생성.
pub fn legal_router(state: &AppState) -> Router<Arc<AppState>> {
    gated(
        Router::new()
            .route("/terms", post(agree_to_terms))
            .route("/privacy-policy", post(agree_to_privacy_policy))
            .route("/privacy-settings", put(update_privacy_settings)),
        state,
        ANY_ROLE,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_test_state;
    use freelance_core::{Account, AccountStore, AccountUpdate, NewAccount, Role};

    #[tokio::test]
    async fn test_privacy_update_is_partial_and_keeps_current_role() {
        let state = Arc::new(create_test_state());
        let snapshot = state
            .store
            .insert_account(Account::new(NewAccount {
                email: "alice@example.com".to_string(),
                password_hash: "hash".to_string(),
                role: Role::Freelancer,
                name: "Alice".to_string(),
                business_name: None,
                business_type: None,
                skills: None,
            }))
            .await
            .unwrap();
        let change_role = AccountChange::Admin(AccountUpdate {
            role: Some(Role::Client),
            ..Default::default()
        });
        state
            .store
            .modify_account(&snapshot.id, change_role)
            .await
            .unwrap();

        let update = PrivacyUpdate {
            allow_direct_messages: Some(false),
            ..Default::default()
        };
        let Json(response) = update_privacy_settings(
            State(state.clone()),
            CurrentAccount(snapshot.clone()),
            JsonBody(update),
        )
        .await
        .unwrap();
        assert!(!response.privacy.allow_direct_messages);
        assert!(response.privacy.show_profile_publicly);

        agree_to_terms(State(state.clone()), CurrentAccount(snapshot.clone()))
            .await
            .unwrap();

        let stored = state.store.find_account(&snapshot.id).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Client);
        assert!(stored.agreed_to_terms);
        assert!(!stored.privacy.allow_direct_messages);
    }
}
