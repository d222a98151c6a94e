//! 클라이언트 본인 프로필과 프로젝트 endpoint.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use freelance_core::{Account, AccountChange, Project, ProjectFilter, ProfileUpdate};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{gated, CurrentAccount, CLIENTS};
use crate::error::ApiResult;
use crate::extract::JsonBody;
use crate::state::AppState;

/// 클라이언트 프로필 수정 요청.
#[derive(Debug, Default, Deserialize)]
pub struct ClientProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub business_type: Option<String>,
}

/// 프로필 수정 응답.
#[derive(Debug, Serialize)]
pub struct ClientProfileResponse {
    pub message: String,
    pub client: Account,
}

/// 내 프로필.
pub async fn get_client_profile(CurrentAccount(client): CurrentAccount) -> Json<Account> {
    Json(client)
}

/// 내 프로필 수정.
pub async fn update_client_profile(
    State(state): State<Arc<AppState>>,
    CurrentAccount(client): CurrentAccount,
    JsonBody(req): JsonBody<ClientProfileRequest>,
) -> ApiResult<Json<ClientProfileResponse>> {
    let update = ProfileUpdate {
        name: req.name,
        business_name: req.business_name,
        business_type: req.business_type,
        ..Default::default()
    };
    let client = state
        .store
        .modify_account(&client.id, AccountChange::Profile(update))
        .await?;

    info!(account_id = %client.id, "Client profile updated");
    Ok(Json(ClientProfileResponse {
        message: "Profile updated successfully".to_string(),
        client,
    }))
}

/// 내가 등록한 프로젝트 (최신 순).
pub async fn list_client_projects(
    State(state): State<Arc<AppState>>,
    CurrentAccount(client): CurrentAccount,
) -> ApiResult<Json<Vec<Project>>> {
    let filter = ProjectFilter::for_client(client.id);
    Ok(Json(state.store.list_projects(&filter).await?))
}

/// 클라이언트 라우터 생성.
pub fn clients_router(state: &AppState) -> Router<Arc<AppState>> {
    gated(
        Router::new()
            .route(
                "/profile",
                get(get_client_profile).put(update_client_profile),
            )
            .route("/projects", get(list_client_projects)),
        state,
        CLIENTS,
    )
}
