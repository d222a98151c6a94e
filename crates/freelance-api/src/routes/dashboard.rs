//! 계정별 대시보드.
//!
//! 모든 역할에 공통 섹션(개요, 프로필, 알림, 최근 메시지, 프로젝트 이력)을 제공하고,
//! 프리랜서와 클라이언트에게는 역할별 섹션을 추가로 제공합니다.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use freelance_core::{
    Account, BillingRecord, Message, MessageFilter, Notification, Project, ProjectFilter,
    ProjectStatus, PublicProfile, Role, Store,
};
use serde::Serialize;

use crate::auth::{gated, CurrentAccount, ANY_ROLE};
use crate::error::ApiResult;
use crate::state::AppState;

/// 대시보드에 표시할 최근 알림 수
const RECENT_NOTIFICATIONS: usize = 10;
/// 대시보드에 표시할 최근 수신 메시지 수
const RECENT_MESSAGES: usize = 5;

/// 대시보드 응답.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub overview: Overview,
    pub profile: ProfileSection,
    pub notifications: Vec<Notification>,
    pub recent_messages: Vec<Message>,
    pub project_history: Vec<Project>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freelancer: Option<FreelancerSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientSection>,
}

/// 마켓플레이스 전체 프로젝트 현황.
#[derive(Debug, Serialize)]
pub struct Overview {
    pub total_projects: u64,
    pub in_progress_projects: u64,
    pub completed_projects: u64,
    pub available_projects: u64,
}

/// 프로필 요약.
#[derive(Debug, Serialize)]
pub struct ProfileSection {
    pub name: String,
    pub role: Role,
    pub profile_completed: bool,
    pub skills: Vec<String>,
    pub business_name: String,
    pub average_rating: f64,
    pub two_factor_enabled: bool,
}

impl From<&Account> for ProfileSection {
    fn from(account: &Account) -> Self {
        Self {
            name: account.name.clone(),
            role: account.role,
            profile_completed: account.profile_completed,
            skills: account.skills.clone(),
            business_name: account.business_name.clone(),
            average_rating: account.average_rating,
            two_factor_enabled: account.two_factor_enabled(),
        }
    }
}

/// 프리랜서 섹션.
#[derive(Debug, Serialize)]
pub struct FreelancerSection {
    /// 보유 기술과 맞는 open 프로젝트
    pub available_projects: Vec<Project>,
    /// 완료한 프로젝트
    pub portfolio: Vec<Project>,
    pub billing: Vec<BillingRecord>,
}

/// 클라이언트 섹션.
#[derive(Debug, Serialize)]
pub struct ClientSection {
    pub freelancers: Vec<PublicProfile>,
    /// 내 open 프로젝트와 관심 표시 수
    pub open_projects: Vec<ProjectInterest>,
    pub billing: Vec<BillingRecord>,
}

/// 프로젝트별 관심 표시 수.
#[derive(Debug, Serialize)]
pub struct ProjectInterest {
    pub project: Project,
    pub interest_count: usize,
}

/// 내 대시보드.
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
    CurrentAccount(account): CurrentAccount,
) -> ApiResult<Json<DashboardResponse>> {
    let store = state.store.as_ref();

    let history_filter = match account.role {
        Role::Freelancer => ProjectFilter::for_freelancer(account.id.clone()),
        _ => ProjectFilter::for_client(account.id.clone()),
    };

    let recent_messages = store
        .list_messages(&MessageFilter {
            receiver: Some(account.id.clone()),
            latest: Some(RECENT_MESSAGES),
            ..Default::default()
        })
        .await?;

    let (freelancer, client) = match account.role {
        Role::Freelancer => (Some(freelancer_section(store, &account).await?), None),
        Role::Client => (None, Some(client_section(store, &account).await?)),
        Role::Admin => (None, None),
    };

    Ok(Json(DashboardResponse {
        overview: overview(store).await?,
        profile: ProfileSection::from(&account),
        notifications: store
            .notifications_for(&account.id, Some(RECENT_NOTIFICATIONS))
            .await?,
        recent_messages,
        project_history: store.list_projects(&history_filter).await?,
        freelancer,
        client,
    }))
}

async fn overview(store: &dyn Store) -> ApiResult<Overview> {
    let by_status = |status| ProjectFilter::default().with_status(status);
    Ok(Overview {
        total_projects: store.count_projects(&ProjectFilter::default()).await?,
        in_progress_projects: store
            .count_projects(&by_status(ProjectStatus::InProgress))
            .await?,
        completed_projects: store
            .count_projects(&by_status(ProjectStatus::Completed))
            .await?,
        available_projects: store.count_projects(&by_status(ProjectStatus::Open)).await?,
    })
}

async fn freelancer_section(store: &dyn Store, account: &Account) -> ApiResult<FreelancerSection> {
    // 기술이 없으면 필터가 전체와 일치하므로 빈 목록
    let available_projects = if account.skills.is_empty() {
        Vec::new()
    } else {
        store
            .list_projects(
                &ProjectFilter::default()
                    .with_status(ProjectStatus::Open)
                    .with_skills(account.skills.clone()),
            )
            .await?
    };

    let portfolio = store
        .list_projects(
            &ProjectFilter::for_freelancer(account.id.clone()).with_status(ProjectStatus::Completed),
        )
        .await?;

    Ok(FreelancerSection {
        available_projects,
        portfolio,
        billing: store.billing_for_account(&account.id).await?,
    })
}

async fn client_section(store: &dyn Store, account: &Account) -> ApiResult<ClientSection> {
    let freelancers = store
        .list_accounts(Some(Role::Freelancer))
        .await?
        .iter()
        .filter(|f| f.privacy.show_profile_publicly)
        .map(PublicProfile::from)
        .collect();

    let open_projects = store
        .list_projects(
            &ProjectFilter::for_client(account.id.clone()).with_status(ProjectStatus::Open),
        )
        .await?
        .into_iter()
        .map(|project| ProjectInterest {
            interest_count: project.interested.len(),
            project,
        })
        .collect();

    Ok(ClientSection {
        freelancers,
        open_projects,
        billing: store.billing_for_account(&account.id).await?,
    })
}

/// 대시보드 라우터 생성.
pub fn dashboard_router(state: &AppState) -> Router<Arc<AppState>> {
    gated(Router::new().route("/", get(get_dashboard)), state, ANY_ROLE)
}
