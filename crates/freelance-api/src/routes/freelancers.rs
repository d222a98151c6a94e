//! 프리랜서 조회 및 프로필 endpoint.
//!
//! # 엔드포인트
//!
//! - `GET /api/v1/freelancers` - 프리랜서 목록 (client, admin)
//! - `GET /api/v1/freelancers/{id}` - 프리랜서 조회
//! - `PUT /api/v1/freelancers/{id}/profile` - 본인 프로필 수정 (freelancer)

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use freelance_core::{Account, AccountChange, AccountId, ProfileUpdate, Role};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{gated, CurrentAccount, RoleSet, ADMINS, ANY_ROLE, CLIENTS, FREELANCERS};
use crate::error::{ApiError, ApiResult};
use crate::extract::{JsonBody, QueryParams};
use crate::state::AppState;

/// 프리랜서 목록을 볼 수 있는 역할
const FREELANCER_BROWSERS: RoleSet = CLIENTS.union(ADMINS);

/// 프리랜서 목록 필터.
#[derive(Debug, Default, Deserialize)]
pub struct FreelancerQuery {
    /// 보유 기술 (대소문자 무시)
    #[serde(default)]
    pub skill: Option<String>,
}

/// 프리랜서 프로필 수정 요청.
#[derive(Debug, Default, Deserialize)]
pub struct FreelancerProfileRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub price_min: Option<Decimal>,
    #[serde(default)]
    pub price_max: Option<Decimal>,
}

impl From<FreelancerProfileRequest> for ProfileUpdate {
    fn from(req: FreelancerProfileRequest) -> Self {
        ProfileUpdate {
            name: req.name,
            bio: req.bio,
            skills: req.skills,
            price_min: req.price_min,
            price_max: req.price_max,
            ..Default::default()
        }
    }
}

/// 프로필 수정 응답.
#[derive(Debug, Serialize)]
pub struct FreelancerProfileResponse {
    pub message: String,
    pub freelancer: Account,
}

/// 프리랜서 목록.
pub async fn list_freelancers(
    State(state): State<Arc<AppState>>,
    QueryParams(query): QueryParams<FreelancerQuery>,
) -> ApiResult<Json<Vec<Account>>> {
    let mut freelancers = state.store.list_accounts(Some(Role::Freelancer)).await?;

    if let Some(skill) = query.skill.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let wanted = [skill.to_string()];
        freelancers.retain(|f| f.has_any_skill(&wanted));
    }

    Ok(Json(freelancers))
}

/// 프리랜서 조회. 프리랜서가 아닌 계정은 404.
pub async fn get_freelancer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Account>> {
    Ok(Json(find_freelancer(&state, &AccountId::new(id)).await?))
}

/// 본인 프로필 수정.
pub async fn update_freelancer_profile(
    State(state): State<Arc<AppState>>,
    CurrentAccount(me): CurrentAccount,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<FreelancerProfileRequest>,
) -> ApiResult<Json<FreelancerProfileResponse>> {
    let id = AccountId::new(id);
    if id != me.id {
        return Err(ApiError::forbidden("Unauthorized to update this profile"));
    }

    let freelancer = state
        .store
        .modify_account(&me.id, AccountChange::Profile(req.into()))
        .await?;

    info!(account_id = %freelancer.id, "Freelancer profile updated");
    Ok(Json(FreelancerProfileResponse {
        message: "Profile updated successfully".to_string(),
        freelancer,
    }))
}

pub(crate) async fn find_freelancer(state: &AppState, id: &AccountId) -> ApiResult<Account> {
    match state.store.find_account(id).await? {
        Some(account) if account.role == Role::Freelancer => Ok(account),
        _ => Err(ApiError::not_found("Freelancer not found")),
    }
}

/// 프리랜서 라우터 생성.
pub fn freelancers_router(state: &AppState) -> Router<Arc<AppState>> {
    let browse = gated(
        Router::new().route("/", get(list_freelancers)),
        state,
        FREELANCER_BROWSERS,
    );

    let view = gated(
        Router::new().route("/{id}", get(get_freelancer)),
        state,
        ANY_ROLE,
    );

    let own = gated(
        Router::new().route("/{id}/profile", put(update_freelancer_profile)),
        state,
        FREELANCERS,
    );

    browse.merge(view).merge(own)
}
