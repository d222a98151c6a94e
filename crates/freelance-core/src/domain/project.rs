//! 프로젝트 도메인 모델.
//!
//! 클라이언트가 등록하고 프리랜서가 관심을 표시하는 프로젝트와
//! 상태 전이 규칙을 정의합니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AccountId;
use crate::error::{CoreError, CoreResult};

/// 프로젝트 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// 제안을 받는 중
    Open,
    /// 프리랜서 배정됨
    Assigned,
    /// 진행 중
    InProgress,
    /// 완료
    Completed,
    /// 종료 (취소 포함)
    Closed,
}

impl ProjectStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProjectStatus::Open => "open",
            ProjectStatus::Assigned => "assigned",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(' ', "_").as_str() {
            "open" => Some(ProjectStatus::Open),
            "assigned" => Some(ProjectStatus::Assigned),
            "in_progress" => Some(ProjectStatus::InProgress),
            "completed" => Some(ProjectStatus::Completed),
            "closed" => Some(ProjectStatus::Closed),
            _ => None,
        }
    }

    /// 클라이언트가 요청할 수 있는 상태 전이인지 확인.
    ///
    /// `Open → Assigned`는 제안 수락으로만 일어나므로 여기서는 허용하지 않습니다.
    pub fn can_transition_to(&self, next: ProjectStatus) -> bool {
        use ProjectStatus::*;
        matches!(
            (self, next),
            (Open, Closed)
                | (Assigned, InProgress)
                | (Assigned, Closed)
                | (InProgress, Completed)
                | (InProgress, Closed)
        )
    }

    /// 더 이상 변경되지 않는 상태인지 확인.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProjectStatus::Completed | ProjectStatus::Closed)
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 프리랜서의 관심 표시 기록.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interest {
    pub freelancer_id: AccountId,
    pub at: DateTime<Utc>,
}

/// 프로젝트 레코드.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    /// 등록한 클라이언트
    pub client_id: AccountId,
    pub title: String,
    pub description: String,
    pub status: ProjectStatus,
    #[serde(default)]
    pub skills_required: Vec<String>,
    #[serde(default)]
    pub budget: Option<Decimal>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
    pub posted_at: DateTime<Utc>,
    /// 배정된 프리랜서
    #[serde(default)]
    pub assigned_to: Option<AccountId>,
    /// 관심을 표시한 프리랜서
    #[serde(default)]
    pub interested: Vec<Interest>,
}

impl Project {
    /// 새 프로젝트 생성 (상태: open).
    pub fn new(client_id: AccountId, input: NewProject) -> CoreResult<Self> {
        input.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            client_id,
            title: input.title.trim().to_string(),
            description: input.description.trim().to_string(),
            status: ProjectStatus::Open,
            skills_required: input.skills_required,
            budget: input.budget,
            deadline: input.deadline,
            posted_at: Utc::now(),
            assigned_to: None,
            interested: Vec::new(),
        })
    }

    /// 소유 클라이언트인지 확인.
    pub fn is_owned_by(&self, account: &AccountId) -> bool {
        &self.client_id == account
    }

    /// 프리랜서의 관심 등록.
    ///
    /// 이미 등록된 경우 false를 반환합니다.
    pub fn register_interest(&mut self, freelancer: &AccountId) -> CoreResult<bool> {
        if self.status != ProjectStatus::Open {
            return Err(CoreError::Validation(
                "Project is not open for proposals".to_string(),
            ));
        }
        if self.interested.iter().any(|i| &i.freelancer_id == freelancer) {
            return Ok(false);
        }
        self.interested.push(Interest {
            freelancer_id: freelancer.clone(),
            at: Utc::now(),
        });
        Ok(true)
    }

    /// 관심 표시 철회 (제안 거절). 기록이 없었으면 false.
    pub fn withdraw_interest(&mut self, freelancer: &AccountId) -> bool {
        let before = self.interested.len();
        self.interested.retain(|i| &i.freelancer_id != freelancer);
        self.interested.len() != before
    }

    /// 프리랜서 배정 (제안 수락).
    pub fn assign(&mut self, freelancer: AccountId) -> CoreResult<()> {
        if self.status != ProjectStatus::Open {
            return Err(CoreError::Validation(
                "Invalid project or project not open for proposals".to_string(),
            ));
        }
        self.assigned_to = Some(freelancer);
        self.status = ProjectStatus::Assigned;
        Ok(())
    }

    /// 상태 변경.
    pub fn transition(&mut self, next: ProjectStatus) -> CoreResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(CoreError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// 세부 정보 갱신.
    pub fn apply_update(&mut self, update: ProjectUpdate) -> CoreResult<()> {
        if self.status.is_terminal() {
            return Err(CoreError::Validation(format!(
                "Project is {} and can no longer be edited",
                self.status
            )));
        }
        if let Some(title) = update.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(CoreError::Validation("Title cannot be empty".to_string()));
            }
            self.title = title.to_string();
        }
        if let Some(description) = update.description {
            let description = description.trim();
            if description.is_empty() {
                return Err(CoreError::Validation(
                    "Description cannot be empty".to_string(),
                ));
            }
            self.description = description.to_string();
        }
        if let Some(skills) = update.skills_required {
            self.skills_required = skills;
        }
        if let Some(budget) = update.budget {
            validate_budget(budget)?;
            self.budget = Some(budget);
        }
        if let Some(deadline) = update.deadline {
            self.deadline = Some(deadline);
        }
        Ok(())
    }

    /// 요구 기술 중 하나라도 포함되는지 확인 (대소문자 무시).
    pub fn requires_any(&self, skills: &[String]) -> bool {
        self.skills_required
            .iter()
            .any(|r| skills.iter().any(|s| s.eq_ignore_ascii_case(r)))
    }
}

/// 프로젝트 생성 입력.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub skills_required: Vec<String>,
    #[serde(default)]
    pub budget: Option<Decimal>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

impl NewProject {
    pub fn validate(&self) -> CoreResult<()> {
        if self.title.trim().is_empty() {
            return Err(CoreError::Validation("Title is required".to_string()));
        }
        if self.description.trim().is_empty() {
            return Err(CoreError::Validation("Description is required".to_string()));
        }
        if let Some(budget) = self.budget {
            validate_budget(budget)?;
        }
        Ok(())
    }
}

/// 프로젝트 갱신 입력.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub skills_required: Option<Vec<String>>,
    #[serde(default)]
    pub budget: Option<Decimal>,
    #[serde(default)]
    pub deadline: Option<DateTime<Utc>>,
}

fn validate_budget(budget: Decimal) -> CoreResult<()> {
    if budget.is_sign_negative() {
        return Err(CoreError::Validation("Budget cannot be negative".to_string()));
    }
    Ok(())
}

/// 프로젝트 조회 필터. 모든 조건은 AND로 결합됩니다.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub client_id: Option<AccountId>,
    pub assigned_to: Option<AccountId>,
    pub status: Option<ProjectStatus>,
    /// 비어 있지 않으면 요구 기술 중 하나 이상 일치
    pub skills_any: Vec<String>,
    pub budget_min: Option<Decimal>,
    pub budget_max: Option<Decimal>,
}

impl ProjectFilter {
    pub fn for_client(client_id: AccountId) -> Self {
        Self {
            client_id: Some(client_id),
            ..Default::default()
        }
    }

    pub fn for_freelancer(freelancer_id: AccountId) -> Self {
        Self {
            assigned_to: Some(freelancer_id),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: ProjectStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn with_skills(mut self, skills: Vec<String>) -> Self {
        self.skills_any = skills;
        self
    }

    /// 프로젝트가 필터 조건을 만족하는지 확인.
    pub fn matches(&self, project: &Project) -> bool {
        if let Some(ref client) = self.client_id {
            if &project.client_id != client {
                return false;
            }
        }
        if let Some(ref assignee) = self.assigned_to {
            if project.assigned_to.as_ref() != Some(assignee) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if project.status != status {
                return false;
            }
        }
        if !self.skills_any.is_empty() && !project.requires_any(&self.skills_any) {
            return false;
        }
        // 예산 조건이 있으면 예산 미정 프로젝트는 제외
        if let Some(min) = self.budget_min {
            if project.budget.map_or(true, |b| b < min) {
                return false;
            }
        }
        if let Some(max) = self.budget_max {
            if project.budget.map_or(true, |b| b > max) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn project() -> Project {
        Project::new(
            AccountId::new("c1"),
            NewProject {
                title: " Pentest ".to_string(),
                description: "Audit our web app".to_string(),
                skills_required: vec!["Web Security".to_string()],
                budget: Some(dec!(500)),
                deadline: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_new_project_is_open() {
        let p = project();
        assert_eq!(p.status, ProjectStatus::Open);
        assert_eq!(p.title, "Pentest");
        assert!(p.is_owned_by(&AccountId::new("c1")));
    }

    #[test]
    fn test_withdraw_interest() {
        let mut p = project();
        let f = AccountId::new("f1");
        p.register_interest(&f).unwrap();

        assert!(p.withdraw_interest(&f));
        assert!(!p.withdraw_interest(&f));
        assert!(p.interested.is_empty());
    }

    #[test]
    fn test_new_project_requires_title() {
        let result = Project::new(
            AccountId::new("c1"),
            NewProject {
                title: "  ".to_string(),
                description: "x".to_string(),
                skills_required: vec![],
                budget: None,
                deadline: None,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_interest_is_idempotent() {
        let mut p = project();
        let f = AccountId::new("f1");
        assert!(p.register_interest(&f).unwrap());
        assert!(!p.register_interest(&f).unwrap());
        assert_eq!(p.interested.len(), 1);
    }

    #[test]
    fn test_assign_only_when_open() {
        let mut p = project();
        p.assign(AccountId::new("f1")).unwrap();
        assert_eq!(p.status, ProjectStatus::Assigned);
        assert!(p.assign(AccountId::new("f2")).is_err());
        assert!(p.register_interest(&AccountId::new("f3")).is_err());
    }

    #[test]
    fn test_status_transitions() {
        assert!(ProjectStatus::Assigned.can_transition_to(ProjectStatus::InProgress));
        assert!(ProjectStatus::InProgress.can_transition_to(ProjectStatus::Completed));
        assert!(!ProjectStatus::Open.can_transition_to(ProjectStatus::Completed));
        assert!(!ProjectStatus::Completed.can_transition_to(ProjectStatus::Open));

        let mut p = project();
        assert!(p.transition(ProjectStatus::Completed).is_err());
        p.transition(ProjectStatus::Closed).unwrap();
        assert!(p.apply_update(ProjectUpdate::default()).is_err());
    }

    #[test]
    fn test_filter_matches() {
        let p = project();
        let filter = ProjectFilter::default().with_skills(vec!["web security".to_string()]);
        assert!(filter.matches(&p));

        let filter = ProjectFilter {
            budget_min: Some(dec!(600)),
            ..Default::default()
        };
        assert!(!filter.matches(&p));

        let filter = ProjectFilter::for_client(AccountId::new("c2"));
        assert!(!filter.matches(&p));

        let filter = ProjectFilter::default().with_status(ProjectStatus::Open);
        assert!(filter.matches(&p));
    }

    #[test]
    fn test_status_parse_accepts_spaces() {
        assert_eq!(
            ProjectStatus::parse("in progress"),
            Some(ProjectStatus::InProgress)
        );
        assert_eq!(ProjectStatus::parse("done"), None);
    }
}
