//! PostgreSQL 저장소 구현.
//!
//! 스키마는 워크스페이스 루트의 `migrations/`에 있습니다. 동적 필터는
//! `QueryBuilder`로 조립하고, 행은 `FromRow` 레코드를 거쳐 도메인 타입으로 변환합니다.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, Postgres, QueryBuilder};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    AccountStore, BillingStore, MessageStore, NotificationStore, ProjectStore, ReviewStore,
    StoreError, StoreHealth, StoreResult,
};
use crate::config::DatabaseConfig;
use crate::domain::{
    Account, AccountChange, AccountId, BillingRecord, BillingStatus, Interest, Message,
    MessageFilter, Notification, PaymentMethod, PriceRange, PrivacySettings, Project,
    ProjectFilter, ProjectStatus, Review, Role,
};

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("Row not found".to_string()),
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => StoreError::Unavailable(err.to_string()),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().unwrap_or_default();
                if code == "23505" {
                    // PostgreSQL 고유 제약 조건 위반
                    StoreError::Conflict(db_err.message().to_string())
                } else {
                    StoreError::Internal(db_err.message().to_string())
                }
            }
            _ => StoreError::Internal(err.to_string()),
        }
    }
}

/// PostgreSQL 저장소.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// 연결 풀을 생성합니다.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let url = config
            .url
            .as_ref()
            .ok_or_else(|| StoreError::Internal("database.url is not configured".to_string()))?;

        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .connect(url.expose_secret())
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        info!("Database connection established");
        Ok(Self { pool })
    }

    /// 기존 연결 풀을 재사용합니다.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// 마이그레이션을 실행합니다.
    pub async fn migrate(&self) -> StoreResult<()> {
        info!("Running database migrations...");

        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Internal(e.to_string()))?;

        info!("Migrations completed successfully");
        Ok(())
    }
}

fn corrupt(what: &str, value: &str) -> StoreError {
    StoreError::Internal(format!("invalid {} in database: {}", what, value))
}

// =============================================================================
// Accounts
// =============================================================================

#[derive(Debug, FromRow)]
struct AccountRow {
    id: String,
    email: String,
    password_hash: String,
    role: String,
    name: String,
    business_name: String,
    business_type: String,
    bio: String,
    skills: Vec<String>,
    price_min: Decimal,
    price_max: Option<Decimal>,
    profile_completed: bool,
    average_rating: f64,
    agreed_to_terms: bool,
    agreed_to_privacy_policy: bool,
    show_profile_publicly: bool,
    allow_direct_messages: bool,
    email_notifications: bool,
    two_factor_secret: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let role = Role::parse(&row.role).ok_or_else(|| corrupt("role", &row.role))?;
        Ok(Account {
            id: AccountId::new(row.id),
            email: row.email,
            password_hash: row.password_hash,
            role,
            name: row.name,
            business_name: row.business_name,
            business_type: row.business_type,
            bio: row.bio,
            skills: row.skills,
            price_range: PriceRange {
                min: row.price_min,
                max: row.price_max,
            },
            profile_completed: row.profile_completed,
            average_rating: row.average_rating,
            agreed_to_terms: row.agreed_to_terms,
            agreed_to_privacy_policy: row.agreed_to_privacy_policy,
            privacy: PrivacySettings {
                show_profile_publicly: row.show_profile_publicly,
                allow_direct_messages: row.allow_direct_messages,
                email_notifications: row.email_notifications,
            },
            two_factor_secret: row.two_factor_secret,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// 변경 종류별로 기록하는 컬럼 묶음.
#[derive(Debug, Clone, Copy)]
enum ChangeScope {
    Profile,
    Admin,
    TwoFactor,
    Terms,
    PrivacyPolicy,
    Privacy,
    Rating,
}

impl ChangeScope {
    fn of(change: &AccountChange) -> Self {
        match change {
            AccountChange::Profile(_) => ChangeScope::Profile,
            AccountChange::Admin(_) => ChangeScope::Admin,
            AccountChange::TwoFactorSecret(_) => ChangeScope::TwoFactor,
            AccountChange::AgreeToTerms => ChangeScope::Terms,
            AccountChange::AgreeToPrivacyPolicy => ChangeScope::PrivacyPolicy,
            AccountChange::Privacy(_) => ChangeScope::Privacy,
            AccountChange::AverageRating(_) => ChangeScope::Rating,
        }
    }
}

const ACCOUNT_COLUMNS: &str = "id, email, password_hash, role, name, business_name, \
    business_type, bio, skills, price_min, price_max, profile_completed, average_rating, \
    agreed_to_terms, agreed_to_privacy_policy, show_profile_publicly, allow_direct_messages, \
    email_notifications, two_factor_secret, created_at, updated_at";

#[async_trait]
impl AccountStore for PgStore {
    #[instrument(skip(self))]
    async fn find_account(&self, id: &AccountId) -> StoreResult<Option<Account>> {
        let row: Option<AccountRow> =
            sqlx::query_as(&format!("SELECT {} FROM accounts WHERE id = $1", ACCOUNT_COLUMNS))
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await?;
        row.map(Account::try_from).transpose()
    }

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {} FROM accounts WHERE email = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Account::try_from).transpose()
    }

    async fn insert_account(&self, account: Account) -> StoreResult<Account> {
        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, email, password_hash, role, name, business_name, business_type, bio,
                skills, price_min, price_max, profile_completed, average_rating,
                agreed_to_terms, agreed_to_privacy_policy, show_profile_publicly,
                allow_direct_messages, email_notifications, two_factor_secret,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                    $16, $17, $18, $19, $20, $21)
            "#,
        )
        .bind(account.id.as_str())
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(&account.name)
        .bind(&account.business_name)
        .bind(&account.business_type)
        .bind(&account.bio)
        .bind(&account.skills)
        .bind(account.price_range.min)
        .bind(account.price_range.max)
        .bind(account.profile_completed)
        .bind(account.average_rating)
        .bind(account.agreed_to_terms)
        .bind(account.agreed_to_privacy_policy)
        .bind(account.privacy.show_profile_publicly)
        .bind(account.privacy.allow_direct_messages)
        .bind(account.privacy.email_notifications)
        .bind(&account.two_factor_secret)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        debug!(account_id = %account.id, role = %account.role, "Inserted account");
        Ok(account)
    }

    async fn modify_account(
        &self,
        id: &AccountId,
        change: AccountChange,
    ) -> StoreResult<Account> {
        let mut tx = self.pool.begin().await?;

        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {} FROM accounts WHERE id = $1 FOR UPDATE",
            ACCOUNT_COLUMNS
        ))
        .bind(id.as_str())
        .fetch_optional(&mut *tx)
        .await?;
        let mut account = row
            .map(Account::try_from)
            .transpose()?
            .ok_or_else(|| StoreError::NotFound(format!("account {}", id)))?;

        let scope = ChangeScope::of(&change);
        change.apply(&mut account)?;

        let query = match scope {
            ChangeScope::Profile => sqlx::query(
                r#"
                UPDATE accounts SET
                    name = $2, bio = $3, skills = $4, business_name = $5, business_type = $6,
                    price_min = $7, price_max = $8, profile_completed = $9, updated_at = $10
                WHERE id = $1
                "#,
            )
            .bind(account.id.as_str())
            .bind(&account.name)
            .bind(&account.bio)
            .bind(&account.skills)
            .bind(&account.business_name)
            .bind(&account.business_type)
            .bind(account.price_range.min)
            .bind(account.price_range.max)
            .bind(account.profile_completed)
            .bind(account.updated_at),
            ChangeScope::Admin => sqlx::query(
                r#"
                UPDATE accounts SET
                    name = $2, bio = $3, skills = $4, business_name = $5, business_type = $6,
                    price_min = $7, price_max = $8, profile_completed = $9, updated_at = $10,
                    email = $11, role = $12
                WHERE id = $1
                "#,
            )
            .bind(account.id.as_str())
            .bind(&account.name)
            .bind(&account.bio)
            .bind(&account.skills)
            .bind(&account.business_name)
            .bind(&account.business_type)
            .bind(account.price_range.min)
            .bind(account.price_range.max)
            .bind(account.profile_completed)
            .bind(account.updated_at)
            .bind(&account.email)
            .bind(account.role.as_str()),
            ChangeScope::TwoFactor => sqlx::query(
                "UPDATE accounts SET two_factor_secret = $2, updated_at = $3 WHERE id = $1",
            )
            .bind(account.id.as_str())
            .bind(&account.two_factor_secret)
            .bind(account.updated_at),
            ChangeScope::Terms => sqlx::query(
                "UPDATE accounts SET agreed_to_terms = $2, updated_at = $3 WHERE id = $1",
            )
            .bind(account.id.as_str())
            .bind(account.agreed_to_terms)
            .bind(account.updated_at),
            ChangeScope::PrivacyPolicy => sqlx::query(
                "UPDATE accounts SET agreed_to_privacy_policy = $2, updated_at = $3 WHERE id = $1",
            )
            .bind(account.id.as_str())
            .bind(account.agreed_to_privacy_policy)
            .bind(account.updated_at),
            ChangeScope::Privacy => sqlx::query(
                r#"
                UPDATE accounts SET
                    show_profile_publicly = $2, allow_direct_messages = $3,
                    email_notifications = $4, updated_at = $5
                WHERE id = $1
                "#,
            )
            .bind(account.id.as_str())
            .bind(account.privacy.show_profile_publicly)
            .bind(account.privacy.allow_direct_messages)
            .bind(account.privacy.email_notifications)
            .bind(account.updated_at),
            ChangeScope::Rating => sqlx::query(
                "UPDATE accounts SET average_rating = $2, updated_at = $3 WHERE id = $1",
            )
            .bind(account.id.as_str())
            .bind(account.average_rating)
            .bind(account.updated_at),
        };
        query.execute(&mut *tx).await?;
        tx.commit().await?;

        debug!(account_id = %account.id, scope = ?scope, "Modified account");
        Ok(account)
    }

    async fn delete_account(&self, id: &AccountId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_accounts(&self, role: Option<Role>) -> StoreResult<Vec<Account>> {
        let rows: Vec<AccountRow> = sqlx::query_as(&format!(
            "SELECT {} FROM accounts WHERE ($1::text IS NULL OR role = $1) ORDER BY created_at, id",
            ACCOUNT_COLUMNS
        ))
        .bind(role.map(|r| r.as_str()))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Account::try_from).collect()
    }

    async fn count_accounts(&self, role: Role) -> StoreResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts WHERE role = $1")
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }
}

// =============================================================================
// Projects
// =============================================================================

#[derive(Debug, FromRow)]
struct ProjectRow {
    id: Uuid,
    client_id: String,
    title: String,
    description: String,
    status: String,
    skills_required: Vec<String>,
    budget: Option<Decimal>,
    deadline: Option<DateTime<Utc>>,
    posted_at: DateTime<Utc>,
    assigned_to: Option<String>,
    interest_ids: Vec<String>,
    interest_at: Vec<DateTime<Utc>>,
}

impl TryFrom<ProjectRow> for Project {
    type Error = StoreError;

    fn try_from(row: ProjectRow) -> Result<Self, Self::Error> {
        let status =
            ProjectStatus::parse(&row.status).ok_or_else(|| corrupt("status", &row.status))?;
        let interested = row
            .interest_ids
            .into_iter()
            .zip(row.interest_at)
            .map(|(id, at)| Interest {
                freelancer_id: AccountId::new(id),
                at,
            })
            .collect();
        Ok(Project {
            id: row.id,
            client_id: AccountId::new(row.client_id),
            title: row.title,
            description: row.description,
            status,
            skills_required: row.skills_required,
            budget: row.budget,
            deadline: row.deadline,
            posted_at: row.posted_at,
            assigned_to: row.assigned_to.map(AccountId::new),
            interested,
        })
    }
}

const PROJECT_SELECT: &str = r#"
    SELECT p.id, p.client_id, p.title, p.description, p.status, p.skills_required,
           p.budget, p.deadline, p.posted_at, p.assigned_to,
           ARRAY(SELECT i.freelancer_id FROM project_interest i
                 WHERE i.project_id = p.id ORDER BY i.at) AS interest_ids,
           ARRAY(SELECT i.at FROM project_interest i
                 WHERE i.project_id = p.id ORDER BY i.at) AS interest_at
    FROM projects p
"#;

fn push_project_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProjectFilter) {
    qb.push(" WHERE TRUE");
    if let Some(ref client) = filter.client_id {
        qb.push(" AND p.client_id = ").push_bind(client.as_str().to_string());
    }
    if let Some(ref assignee) = filter.assigned_to {
        qb.push(" AND p.assigned_to = ")
            .push_bind(assignee.as_str().to_string());
    }
    if let Some(status) = filter.status {
        qb.push(" AND p.status = ").push_bind(status.as_str());
    }
    if !filter.skills_any.is_empty() {
        let wanted: Vec<String> = filter.skills_any.iter().map(|s| s.to_lowercase()).collect();
        qb.push(" AND EXISTS (SELECT 1 FROM unnest(p.skills_required) s WHERE lower(s) = ANY(")
            .push_bind(wanted)
            .push("))");
    }
    if let Some(min) = filter.budget_min {
        qb.push(" AND p.budget >= ").push_bind(min);
    }
    if let Some(max) = filter.budget_max {
        qb.push(" AND p.budget <= ").push_bind(max);
    }
}

impl PgStore {
    async fn write_interest(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        project: &Project,
    ) -> StoreResult<()> {
        sqlx::query("DELETE FROM project_interest WHERE project_id = $1")
            .bind(project.id)
            .execute(&mut **tx)
            .await?;
        if project.interested.is_empty() {
            return Ok(());
        }

        let ids: Vec<String> = project
            .interested
            .iter()
            .map(|i| i.freelancer_id.as_str().to_string())
            .collect();
        let ats: Vec<DateTime<Utc>> = project.interested.iter().map(|i| i.at).collect();
        sqlx::query(
            r#"
            INSERT INTO project_interest (project_id, freelancer_id, at)
            SELECT $1, f, t FROM UNNEST($2::text[], $3::timestamptz[]) AS x(f, t)
            "#,
        )
        .bind(project.id)
        .bind(ids)
        .bind(ats)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let row: Option<ProjectRow> =
            sqlx::query_as(&format!("{} WHERE p.id = $1", PROJECT_SELECT))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Project::try_from).transpose()
    }

    async fn insert_project(&self, project: Project) -> StoreResult<Project> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO projects (
                id, client_id, title, description, status, skills_required,
                budget, deadline, posted_at, assigned_to
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(project.id)
        .bind(project.client_id.as_str())
        .bind(&project.title)
        .bind(&project.description)
        .bind(project.status.as_str())
        .bind(&project.skills_required)
        .bind(project.budget)
        .bind(project.deadline)
        .bind(project.posted_at)
        .bind(project.assigned_to.as_ref().map(|a| a.as_str()))
        .execute(&mut *tx)
        .await?;
        Self::write_interest(&mut tx, &project).await?;
        tx.commit().await?;

        debug!(project_id = %project.id, client_id = %project.client_id, "Inserted project");
        Ok(project)
    }

    async fn update_project(&self, project: Project) -> StoreResult<Project> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            r#"
            UPDATE projects SET
                title = $2, description = $3, status = $4, skills_required = $5,
                budget = $6, deadline = $7, assigned_to = $8
            WHERE id = $1
            "#,
        )
        .bind(project.id)
        .bind(&project.title)
        .bind(&project.description)
        .bind(project.status.as_str())
        .bind(&project.skills_required)
        .bind(project.budget)
        .bind(project.deadline)
        .bind(project.assigned_to.as_ref().map(|a| a.as_str()))
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("project {}", project.id)));
        }
        Self::write_interest(&mut tx, &project).await?;
        tx.commit().await?;
        Ok(project)
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_projects(&self, filter: &ProjectFilter) -> StoreResult<Vec<Project>> {
        let mut qb = QueryBuilder::<Postgres>::new(PROJECT_SELECT);
        push_project_filter(&mut qb, filter);
        qb.push(" ORDER BY p.posted_at DESC");
        let rows: Vec<ProjectRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        rows.into_iter().map(Project::try_from).collect()
    }

    async fn count_projects(&self, filter: &ProjectFilter) -> StoreResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM projects p");
        push_project_filter(&mut qb, filter);
        let (count,): (i64,) = qb.build_query_as().fetch_one(&self.pool).await?;
        Ok(count as u64)
    }
}

// =============================================================================
// Reviews
// =============================================================================

#[derive(Debug, FromRow)]
struct ReviewRow {
    id: Uuid,
    rating: i16,
    comment: String,
    reviewer_id: String,
    freelancer_id: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = StoreError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let rating =
            u8::try_from(row.rating).map_err(|_| corrupt("rating", &row.rating.to_string()))?;
        Ok(Review {
            id: row.id,
            rating,
            comment: row.comment,
            reviewer_id: AccountId::new(row.reviewer_id),
            freelancer_id: AccountId::new(row.freelancer_id),
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn find_review(&self, id: Uuid) -> StoreResult<Option<Review>> {
        let row: Option<ReviewRow> = sqlx::query_as("SELECT * FROM reviews WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Review::try_from).transpose()
    }

    async fn insert_review(&self, review: Review) -> StoreResult<Review> {
        sqlx::query(
            r#"
            INSERT INTO reviews (id, rating, comment, reviewer_id, freelancer_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(review.id)
        .bind(i16::from(review.rating))
        .bind(&review.comment)
        .bind(review.reviewer_id.as_str())
        .bind(review.freelancer_id.as_str())
        .bind(review.created_at)
        .execute(&self.pool)
        .await?;
        Ok(review)
    }

    async fn update_review(&self, review: Review) -> StoreResult<Review> {
        let result = sqlx::query("UPDATE reviews SET rating = $2, comment = $3 WHERE id = $1")
            .bind(review.id)
            .bind(i16::from(review.rating))
            .bind(&review.comment)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("review {}", review.id)));
        }
        Ok(review)
    }

    async fn delete_review(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn reviews_for_freelancer(&self, freelancer: &AccountId) -> StoreResult<Vec<Review>> {
        let rows: Vec<ReviewRow> = sqlx::query_as(
            "SELECT * FROM reviews WHERE freelancer_id = $1 ORDER BY created_at DESC",
        )
        .bind(freelancer.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Review::try_from).collect()
    }
}

// =============================================================================
// Messages
// =============================================================================

#[derive(Debug, FromRow)]
struct MessageRow {
    id: Uuid,
    project_id: Option<Uuid>,
    content: String,
    sender: String,
    receiver: String,
    sent_at: DateTime<Utc>,
    read: bool,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            project_id: row.project_id,
            content: row.content,
            sender: AccountId::new(row.sender),
            receiver: AccountId::new(row.receiver),
            sent_at: row.sent_at,
            read: row.read,
        }
    }
}

#[async_trait]
impl MessageStore for PgStore {
    async fn find_message(&self, id: Uuid) -> StoreResult<Option<Message>> {
        let row: Option<MessageRow> = sqlx::query_as("SELECT * FROM messages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Message::from))
    }

    async fn insert_message(&self, message: Message) -> StoreResult<Message> {
        sqlx::query(
            r#"
            INSERT INTO messages (id, project_id, content, sender, receiver, sent_at, read)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(message.id)
        .bind(message.project_id)
        .bind(&message.content)
        .bind(message.sender.as_str())
        .bind(message.receiver.as_str())
        .bind(message.sent_at)
        .bind(message.read)
        .execute(&self.pool)
        .await?;
        Ok(message)
    }

    async fn update_message(&self, message: Message) -> StoreResult<Message> {
        let result = sqlx::query("UPDATE messages SET content = $2, read = $3 WHERE id = $1")
            .bind(message.id)
            .bind(&message.content)
            .bind(message.read)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("message {}", message.id)));
        }
        Ok(message)
    }

    async fn delete_message(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_messages(&self, filter: &MessageFilter) -> StoreResult<Vec<Message>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT * FROM messages WHERE TRUE");
        if let Some(project) = filter.project_id {
            qb.push(" AND project_id = ").push_bind(project);
        }
        if let Some(ref participant) = filter.participant {
            let id = participant.as_str().to_string();
            qb.push(" AND (sender = ")
                .push_bind(id.clone())
                .push(" OR receiver = ")
                .push_bind(id)
                .push(")");
        }
        if let Some(ref receiver) = filter.receiver {
            qb.push(" AND receiver = ").push_bind(receiver.as_str().to_string());
        }
        match filter.latest {
            Some(n) => {
                qb.push(" ORDER BY sent_at DESC LIMIT ").push_bind(n as i64);
            }
            None => {
                qb.push(" ORDER BY sent_at ASC");
            }
        }

        let rows: Vec<MessageRow> = qb.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Message::from).collect())
    }
}

// =============================================================================
// Billing
// =============================================================================

#[derive(Debug, FromRow)]
struct BillingRow {
    id: Uuid,
    account_id: String,
    project_id: Uuid,
    invoice_number: String,
    amount: Decimal,
    status: String,
    method: String,
    transaction_date: DateTime<Utc>,
    due_date: Option<DateTime<Utc>>,
    payment_date: Option<DateTime<Utc>>,
    notes: Option<String>,
}

impl TryFrom<BillingRow> for BillingRecord {
    type Error = StoreError;

    fn try_from(row: BillingRow) -> Result<Self, Self::Error> {
        let status =
            BillingStatus::parse(&row.status).ok_or_else(|| corrupt("status", &row.status))?;
        let method =
            PaymentMethod::parse(&row.method).ok_or_else(|| corrupt("method", &row.method))?;
        Ok(BillingRecord {
            id: row.id,
            account_id: AccountId::new(row.account_id),
            project_id: row.project_id,
            invoice_number: row.invoice_number,
            amount: row.amount,
            status,
            method,
            transaction_date: row.transaction_date,
            due_date: row.due_date,
            payment_date: row.payment_date,
            notes: row.notes,
        })
    }
}

#[async_trait]
impl BillingStore for PgStore {
    async fn insert_billing(&self, record: BillingRecord) -> StoreResult<BillingRecord> {
        sqlx::query(
            r#"
            INSERT INTO billing (
                id, account_id, project_id, invoice_number, amount, status, method,
                transaction_date, due_date, payment_date, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(record.id)
        .bind(record.account_id.as_str())
        .bind(record.project_id)
        .bind(&record.invoice_number)
        .bind(record.amount)
        .bind(record.status.as_str())
        .bind(record.method.as_str())
        .bind(record.transaction_date)
        .bind(record.due_date)
        .bind(record.payment_date)
        .bind(&record.notes)
        .execute(&self.pool)
        .await?;
        Ok(record)
    }

    async fn billing_for_account(&self, account: &AccountId) -> StoreResult<Vec<BillingRecord>> {
        let rows: Vec<BillingRow> = sqlx::query_as(
            "SELECT * FROM billing WHERE account_id = $1 ORDER BY transaction_date DESC",
        )
        .bind(account.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(BillingRecord::try_from).collect()
    }
}

// =============================================================================
// Notifications
// =============================================================================

#[derive(Debug, FromRow)]
struct NotificationRow {
    id: Uuid,
    account_id: String,
    message: String,
    created_at: DateTime<Utc>,
    read: bool,
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn insert_notification(&self, notification: Notification) -> StoreResult<Notification> {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, account_id, message, created_at, read)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(notification.id)
        .bind(notification.account_id.as_str())
        .bind(&notification.message)
        .bind(notification.created_at)
        .bind(notification.read)
        .execute(&self.pool)
        .await?;
        Ok(notification)
    }

    async fn notifications_for(
        &self,
        account: &AccountId,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Notification>> {
        let rows: Vec<NotificationRow> = sqlx::query_as(
            r#"
            SELECT * FROM notifications WHERE account_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(account.as_str())
        .bind(limit.map(|n| n as i64))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| Notification {
                id: row.id,
                account_id: AccountId::new(row.account_id),
                message: row.message,
                created_at: row.created_at,
                read: row.read,
            })
            .collect())
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
