//! 관리자 endpoint (admin 전용).

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use freelance_core::{Account, AccountId, Project, ProjectFilter, ProjectStatus, Role};
use serde::{Deserialize, Serialize};

use crate::auth::{gated, ADMINS};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// 관리자 대시보드 집계.
#[derive(Debug, Serialize, Deserialize)]
pub struct AdminDashboard {
    pub total_projects: u64,
    pub open_projects: u64,
    pub total_freelancers: u64,
    pub total_clients: u64,
}

/// 관리자 대시보드.
pub async fn admin_dashboard(State(state): State<Arc<AppState>>) -> ApiResult<Json<AdminDashboard>> {
    let store = &state.store;
    Ok(Json(AdminDashboard {
        total_projects: store.count_projects(&ProjectFilter::default()).await?,
        open_projects: store
            .count_projects(&ProjectFilter::default().with_status(ProjectStatus::Open))
            .await?,
        total_freelancers: store.count_accounts(Role::Freelancer).await?,
        total_clients: store.count_accounts(Role::Client).await?,
    }))
}

/// 전체 프로젝트.
pub async fn all_projects(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(
        state.store.list_projects(&ProjectFilter::default()).await?,
    ))
}

/// 전체 프리랜서.
pub async fn all_freelancers(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Account>>> {
    Ok(Json(
        state.store.list_accounts(Some(Role::Freelancer)).await?,
    ))
}

/// 클라이언트 프로필 조회.
pub async fn client_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Account>> {
    match state.store.find_account(&AccountId::new(id)).await? {
        Some(account) if account.role == Role::Client => Ok(Json(account)),
        _ => Err(ApiError::not_found("Client profile not found")),
    }
}

/// 관리자 라우터 생성.
pub fn admin_router(state: &AppState) -> Router<Arc<AppState>> {
    gated(
        Router::new()
            .route("/dashboard", get(admin_dashboard))
            .route("/projects", get(all_projects))
            .route("/freelancers", get(all_freelancers))
            .route("/clients/{id}", get(client_profile)),
        state,
        ADMINS,
    )
}
