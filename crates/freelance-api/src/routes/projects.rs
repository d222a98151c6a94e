//! 프로젝트 endpoint.
//!
//! # 엔드포인트
//!
//! - `POST /api/v1/projects` - 프로젝트 등록 (client)
//! - `GET /api/v1/projects` - 프로젝트 목록 (client, freelancer)
//! - `GET /api/v1/projects/{id}` - 프로젝트 조회
//! - `PUT|DELETE /api/v1/projects/{id}` - 수정/삭제 (소유 client)
//! - `POST /api/v1/projects/{id}/interest` - 관심 표시 (freelancer)
//! - `POST /api/v1/projects/{id}/proposals/accept` - 제안 수락 (소유 client)
//! - `POST /api/v1/projects/{id}/proposals/reject` - 제안 거절 (소유 client)
//! - `PUT /api/v1/projects/{id}/status` - 상태 변경 (소유 client)

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use freelance_core::{
    Account, AccountId, NewProject, Project, ProjectFilter, ProjectStatus, ProjectUpdate, Role,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::freelancers::find_freelancer;
use super::notifications::{notify, notify_all};
use crate::auth::{gated, CurrentAccount, ANY_ROLE, CLIENTS, FREELANCERS, MEMBERS};
use crate::error::{ApiError, ApiResult};
use crate::extract::{parse_uuid, JsonBody, QueryParams, ValidatedJson};
use crate::state::AppState;

const PROJECT_NOT_FOUND: &str = "Project not found";

// ==================== 요청/응답 타입 ====================

/// 프로젝트 목록 파라미터 (프리랜서용 필터).
#[derive(Debug, Default, Deserialize)]
pub struct ProjectQuery {
    /// 쉼표로 구분된 기술 목록
    #[serde(default)]
    pub skills: Option<String>,
    #[serde(default, alias = "budgetMin")]
    pub budget_min: Option<Decimal>,
    #[serde(default, alias = "budgetMax")]
    pub budget_max: Option<Decimal>,
}

impl ProjectQuery {
    fn skill_list(&self) -> Vec<String> {
        self.skills
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// 제안 수락/거절 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct ProposalRequest {
    #[serde(alias = "freelancerId")]
    #[validate(length(min = 1, message = "Freelancer id is required"))]
    pub freelancer_id: String,
}

/// 상태 변경 요청.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// 프로젝트 변경 응답.
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub message: String,
    pub project: Project,
}

impl ProjectResponse {
    fn new(message: &str, project: Project) -> Self {
        Self {
            message: message.to_string(),
            project,
        }
    }
}

// ==================== 핸들러 ====================

/// 프로젝트 등록.
///
/// 요구 기술이 겹치는 프리랜서에게 알림을 보냅니다.
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    CurrentAccount(client): CurrentAccount,
    JsonBody(input): JsonBody<NewProject>,
) -> ApiResult<impl IntoResponse> {
    let project = Project::new(client.id.clone(), input)?;
    let project = state.store.insert_project(project).await?;

    let mut notified = 0;
    if !project.skills_required.is_empty() {
        let freelancers = state.store.list_accounts(Some(Role::Freelancer)).await?;
        let matching: Vec<AccountId> = freelancers
            .into_iter()
            .filter(|f| f.has_any_skill(&project.skills_required))
            .map(|f| f.id)
            .collect();
        notified = notify_all(
            state.store.as_ref(),
            "project_posted",
            matching.iter(),
            &format!("New project available: {}", project.title),
        )
        .await;
    }

    info!(
        project_id = %project.id,
        client_id = %client.id,
        notified,
        "Project created"
    );

    Ok((
        StatusCode::CREATED,
        Json(ProjectResponse::new("Project created successfully", project)),
    ))
}

/// 프로젝트 목록.
///
/// 클라이언트는 자신의 프로젝트를, 프리랜서는 조건에 맞는 프로젝트를 봅니다.
pub async fn list_projects(
    State(state): State<Arc<AppState>>,
    CurrentAccount(account): CurrentAccount,
    QueryParams(query): QueryParams<ProjectQuery>,
) -> ApiResult<Json<Vec<Project>>> {
    let filter = match account.role {
        Role::Client => ProjectFilter::for_client(account.id),
        _ => ProjectFilter {
            skills_any: query.skill_list(),
            budget_min: query.budget_min,
            budget_max: query.budget_max,
            ..Default::default()
        },
    };
    Ok(Json(state.store.list_projects(&filter).await?))
}

/// 프로젝트 조회.
pub async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Project>> {
    Ok(Json(find_project(&state, &id).await?))
}

/// 프로젝트 수정 (소유자만).
pub async fn update_project(
    State(state): State<Arc<AppState>>,
    CurrentAccount(client): CurrentAccount,
    Path(id): Path<String>,
    JsonBody(update): JsonBody<ProjectUpdate>,
) -> ApiResult<Json<ProjectResponse>> {
    let mut project = find_owned_project(&state, &id, &client).await?;
    project.apply_update(update)?;
    let project = state.store.update_project(project).await?;

    Ok(Json(ProjectResponse::new(
        "Project updated successfully",
        project,
    )))
}

/// 프로젝트 삭제 (소유자만).
pub async fn delete_project(
    State(state): State<Arc<AppState>>,
    CurrentAccount(client): CurrentAccount,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let project = find_owned_project(&state, &id, &client).await?;
    if !state.store.delete_project(project.id).await? {
        return Err(ApiError::not_found(PROJECT_NOT_FOUND));
    }

    info!(project_id = %project.id, client_id = %client.id, "Project deleted");
    Ok(Json(serde_json::json!({ "message": "Project deleted successfully" })))
}

/// 관심 표시. 이미 표시했으면 변경 없이 성공합니다.
pub async fn express_interest(
    State(state): State<Arc<AppState>>,
    CurrentAccount(freelancer): CurrentAccount,
    Path(id): Path<String>,
) -> ApiResult<Json<ProjectResponse>> {
    let mut project = find_project(&state, &id).await?;

    if !project.register_interest(&freelancer.id)? {
        return Ok(Json(ProjectResponse::new(
            "Interest already registered",
            project,
        )));
    }

    let project = state.store.update_project(project).await?;
    notify(
        state.store.as_ref(),
        "interest",
        &project.client_id,
        &format!(
            "{} is interested in your project \"{}\"",
            freelancer.name, project.title
        ),
    )
    .await;

    Ok(Json(ProjectResponse::new("Interest registered", project)))
}

/// 제안 수락. 프리랜서를 배정하고 상태를 `assigned`로 바꿉니다.
pub async fn accept_proposal(
    State(state): State<Arc<AppState>>,
    CurrentAccount(client): CurrentAccount,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<ProposalRequest>,
) -> ApiResult<Json<ProjectResponse>> {
    let (mut project, freelancer) = proposal_target(&state, &id, &client, &req).await?;

    project.assign(freelancer.id.clone())?;
    let project = state.store.update_project(project).await?;

    notify(
        state.store.as_ref(),
        "proposal_accepted",
        &freelancer.id,
        &format!(
            "Your proposal for project \"{}\" has been accepted",
            project.title
        ),
    )
    .await;

    info!(
        project_id = %project.id,
        freelancer_id = %freelancer.id,
        "Proposal accepted"
    );
    Ok(Json(ProjectResponse::new("Proposal accepted", project)))
}

/// 제안 거절. 프리랜서의 관심 표시를 철회합니다.
pub async fn reject_proposal(
    State(state): State<Arc<AppState>>,
    CurrentAccount(client): CurrentAccount,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<ProposalRequest>,
) -> ApiResult<Json<ProjectResponse>> {
    let (mut project, freelancer) = proposal_target(&state, &id, &client, &req).await?;

    let project = if project.withdraw_interest(&freelancer.id) {
        state.store.update_project(project).await?
    } else {
        project
    };

    notify(
        state.store.as_ref(),
        "proposal_rejected",
        &freelancer.id,
        &format!(
            "Your proposal for project \"{}\" has been rejected",
            project.title
        ),
    )
    .await;

    info!(
        project_id = %project.id,
        freelancer_id = %freelancer.id,
        "Proposal rejected"
    );
    Ok(Json(ProjectResponse::new("Proposal rejected", project)))
}

/// 상태 변경 (`in_progress`, `completed`, `closed`).
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    CurrentAccount(client): CurrentAccount,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<StatusRequest>,
) -> ApiResult<Json<ProjectResponse>> {
    let next = ProjectStatus::parse(&req.status)
        .ok_or_else(|| ApiError::bad_request(format!("Unknown project status: {}", req.status)))?;

    let mut project = find_owned_project(&state, &id, &client).await?;
    let previous = project.status;
    project.transition(next)?;
    let project = state.store.update_project(project).await?;

    info!(
        project_id = %project.id,
        from = %previous,
        to = %project.status,
        "Project status changed"
    );
    Ok(Json(ProjectResponse::new("Project status updated", project)))
}

// ==================== 헬퍼 ====================

async fn find_project(state: &AppState, raw_id: &str) -> ApiResult<Project> {
    let id = parse_uuid(raw_id, PROJECT_NOT_FOUND)?;
    state
        .store
        .find_project(id)
        .await?
        .ok_or_else(|| ApiError::not_found(PROJECT_NOT_FOUND))
}

async fn find_owned_project(state: &AppState, raw_id: &str, client: &Account) -> ApiResult<Project> {
    let project = find_project(state, raw_id).await?;
    if !project.is_owned_by(&client.id) {
        return Err(ApiError::forbidden("You do not own this project"));
    }
    Ok(project)
}

/// 제안 처리 대상 확인: 프로젝트 존재, 소유, open 상태, 프리랜서 존재 순.
async fn proposal_target(
    state: &AppState,
    raw_id: &str,
    client: &Account,
    req: &ProposalRequest,
) -> ApiResult<(Project, Account)> {
    let project = find_owned_project(state, raw_id, client).await?;
    if project.status != ProjectStatus::Open {
        return Err(ApiError::bad_request(
            "Invalid project or project not open for proposals",
        ));
    }
    let freelancer = find_freelancer(state, &AccountId::new(req.freelancer_id.trim())).await?;
    Ok((project, freelancer))
}

/// 프로젝트 라우터 생성.
pub fn projects_router(state: &AppState) -> Router<Arc<AppState>> {
    let owner = gated(
        Router::new()
            .route("/", post(create_project))
            .route("/{id}", put(update_project).delete(delete_project))
            .route("/{id}/proposals/accept", post(accept_proposal))
            .route("/{id}/proposals/reject", post(reject_proposal))
            .route("/{id}/status", put(update_status)),
        state,
        CLIENTS,
    );

    let members = gated(
        Router::new().route("/", get(list_projects)),
        state,
        MEMBERS,
    );

    let any = gated(
        Router::new().route("/{id}", get(get_project)),
        state,
        ANY_ROLE,
    );

    let freelancers = gated(
        Router::new().route("/{id}/interest", post(express_interest)),
        state,
        FREELANCERS,
    );

    owner.merge(members).merge(any).merge(freelancers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_test_state;
    use axum::body::Body;
    use axum::http::{header, Request};
    use freelance_core::{AccountStore, NewAccount, NotificationStore};
    use tower::ServiceExt;

    async fn seed(state: &AppState, email: &str, role: Role, skills: &[&str]) -> Account {
        let account = Account::new(NewAccount {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role,
            name: email.to_string(),
            business_name: None,
            business_type: None,
            skills: Some(skills.iter().map(|s| s.to_string()).collect()),
        });
        state.store.insert_account(account).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_project_notifies_matching_freelancers() {
        let state = create_test_state();
        let client = seed(&state, "lara@example.com", Role::Client, &[]).await;
        let alice = seed(&state, "alice@example.com", Role::Freelancer, &["Web Security"]).await;
        let bob = seed(&state, "bob@example.com", Role::Freelancer, &["Security Auditing"]).await;
        let token = state
            .issuer
            .issue_for(&client.id, Role::Client)
            .unwrap()
            .access_token;

        let app = projects_router(&state).with_state(Arc::new(state.clone()));
        let body = serde_json::json!({
            "title": "Web app pentest",
            "description": "Assess the customer portal",
            "skills_required": ["Web Security"],
        });
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let alice_inbox = state.store.notifications_for(&alice.id, None).await.unwrap();
        let bob_inbox = state.store.notifications_for(&bob.id, None).await.unwrap();
        assert_eq!(alice_inbox.len(), 1);
        assert!(bob_inbox.is_empty());
    }

    #[test]
    fn test_skill_list_parsing() {
        let query = ProjectQuery {
            skills: Some(" Web Security, ,Incident Response ".to_string()),
            ..Default::default()
        };
        assert_eq!(
            query.skill_list(),
            vec!["Web Security".to_string(), "Incident Response".to_string()]
        );
        assert!(ProjectQuery::default().skill_list().is_empty());
    }
}
