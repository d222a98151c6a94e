//! 인메모리 저장소.
//!
//! 컬렉션별 `RwLock`으로 보호되는 맵을 사용합니다. 유일성 검사와 삽입은
//! 같은 쓰기 잠금 안에서 수행됩니다.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AccountStore, BillingStore, MessageStore, NotificationStore, ProjectStore, ReviewStore,
    StoreError, StoreHealth, StoreResult,
};
use crate::domain::{
    Account, AccountChange, AccountId, BillingRecord, Message, MessageFilter, Notification,
    Project, ProjectFilter, Review, Role,
};

/// 인메모리 저장소.
#[derive(Debug)]
pub struct MemoryStore {
    accounts: RwLock<HashMap<AccountId, Account>>,
    projects: RwLock<HashMap<Uuid, Project>>,
    reviews: RwLock<HashMap<Uuid, Review>>,
    messages: RwLock<HashMap<Uuid, Message>>,
    billing: RwLock<Vec<BillingRecord>>,
    notifications: RwLock<Vec<Notification>>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            projects: RwLock::new(HashMap::new()),
            reviews: RwLock::new(HashMap::new()),
            messages: RwLock::new(HashMap::new()),
            billing: RwLock::new(Vec::new()),
            notifications: RwLock::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }

    /// 백엔드 장애를 흉내냅니다. false이면 모든 작업이 `Unavailable`을 반환합니다.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check(&self) -> StoreResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store offline".to_string()))
        }
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn find_account(&self, id: &AccountId) -> StoreResult<Option<Account>> {
        self.check()?;
        Ok(self.accounts.read().await.get(id).cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        self.check()?;
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    async fn insert_account(&self, account: Account) -> StoreResult<Account> {
        self.check()?;
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.id) {
            return Err(StoreError::Conflict(format!("account {}", account.id)));
        }
        if accounts.values().any(|a| a.email == account.email) {
            return Err(StoreError::Conflict(format!("email {}", account.email)));
        }
        accounts.insert(account.id.clone(), account.clone());
        Ok(account)
    }

    async fn modify_account(
        &self,
        id: &AccountId,
        change: AccountChange,
    ) -> StoreResult<Account> {
        self.check()?;
        let mut accounts = self.accounts.write().await;
        let mut account = accounts
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("account {}", id)))?;
        change.apply(&mut account)?;

        if accounts
            .values()
            .any(|a| a.id != account.id && a.email == account.email)
        {
            return Err(StoreError::Conflict(format!("email {}", account.email)));
        }
        accounts.insert(account.id.clone(), account.clone());
        Ok(account)
    }

    async fn delete_account(&self, id: &AccountId) -> StoreResult<bool> {
        self.check()?;
        Ok(self.accounts.write().await.remove(id).is_some())
    }

    async fn list_accounts(&self, role: Option<Role>) -> StoreResult<Vec<Account>> {
        self.check()?;
        let accounts = self.accounts.read().await;
        let mut list: Vec<Account> = accounts
            .values()
            .filter(|a| role.map_or(true, |r| a.role == r))
            .cloned()
            .collect();
        list.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(list)
    }

    async fn count_accounts(&self, role: Role) -> StoreResult<u64> {
        self.check()?;
        let accounts = self.accounts.read().await;
        Ok(accounts.values().filter(|a| a.role == role).count() as u64)
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        self.check()?;
        Ok(self.projects.read().await.get(&id).cloned())
    }

    async fn insert_project(&self, project: Project) -> StoreResult<Project> {
        self.check()?;
        let mut projects = self.projects.write().await;
        if projects.contains_key(&project.id) {
            return Err(StoreError::Conflict(format!("project {}", project.id)));
        }
        projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn update_project(&self, project: Project) -> StoreResult<Project> {
        self.check()?;
        let mut projects = self.projects.write().await;
        match projects.get_mut(&project.id) {
            Some(slot) => {
                *slot = project.clone();
                Ok(project)
            }
            None => Err(StoreError::NotFound(format!("project {}", project.id))),
        }
    }

    async fn delete_project(&self, id: Uuid) -> StoreResult<bool> {
        self.check()?;
        Ok(self.projects.write().await.remove(&id).is_some())
    }

    async fn list_projects(&self, filter: &ProjectFilter) -> StoreResult<Vec<Project>> {
        self.check()?;
        let projects = self.projects.read().await;
        let mut list: Vec<Project> = projects
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        list.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
        Ok(list)
    }

    async fn count_projects(&self, filter: &ProjectFilter) -> StoreResult<u64> {
        self.check()?;
        let projects = self.projects.read().await;
        Ok(projects.values().filter(|p| filter.matches(p)).count() as u64)
    }
}

#[async_trait]
impl ReviewStore for MemoryStore {
    async fn find_review(&self, id: Uuid) -> StoreResult<Option<Review>> {
        self.check()?;
        Ok(self.reviews.read().await.get(&id).cloned())
    }

    async fn insert_review(&self, review: Review) -> StoreResult<Review> {
        self.check()?;
        self.reviews.write().await.insert(review.id, review.clone());
        Ok(review)
    }

    async fn update_review(&self, review: Review) -> StoreResult<Review> {
        self.check()?;
        let mut reviews = self.reviews.write().await;
        match reviews.get_mut(&review.id) {
            Some(slot) => {
                *slot = review.clone();
                Ok(review)
            }
            None => Err(StoreError::NotFound(format!("review {}", review.id))),
        }
    }

    async fn delete_review(&self, id: Uuid) -> StoreResult<bool> {
        self.check()?;
        Ok(self.reviews.write().await.remove(&id).is_some())
    }

    async fn reviews_for_freelancer(&self, freelancer: &AccountId) -> StoreResult<Vec<Review>> {
        self.check()?;
        let reviews = self.reviews.read().await;
        let mut list: Vec<Review> = reviews
            .values()
            .filter(|r| &r.freelancer_id == freelancer)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn find_message(&self, id: Uuid) -> StoreResult<Option<Message>> {
        self.check()?;
        Ok(self.messages.read().await.get(&id).cloned())
    }

    async fn insert_message(&self, message: Message) -> StoreResult<Message> {
        self.check()?;
        self.messages.write().await.insert(message.id, message.clone());
        Ok(message)
    }

    async fn update_message(&self, message: Message) -> StoreResult<Message> {
        self.check()?;
        let mut messages = self.messages.write().await;
        match messages.get_mut(&message.id) {
            Some(slot) => {
                *slot = message.clone();
                Ok(message)
            }
            None => Err(StoreError::NotFound(format!("message {}", message.id))),
        }
    }

    async fn delete_message(&self, id: Uuid) -> StoreResult<bool> {
        self.check()?;
        Ok(self.messages.write().await.remove(&id).is_some())
    }

    async fn list_messages(&self, filter: &MessageFilter) -> StoreResult<Vec<Message>> {
        self.check()?;
        let messages = self.messages.read().await;
        let mut list: Vec<Message> = messages
            .values()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        match filter.latest {
            Some(n) => {
                list.sort_by(|a, b| b.sent_at.cmp(&a.sent_at));
                list.truncate(n);
            }
            None => list.sort_by(|a, b| a.sent_at.cmp(&b.sent_at)),
        }
        Ok(list)
    }
}

#[async_trait]
impl BillingStore for MemoryStore {
    async fn insert_billing(&self, record: BillingRecord) -> StoreResult<BillingRecord> {
        self.check()?;
        let mut billing = self.billing.write().await;
        if billing
            .iter()
            .any(|b| b.invoice_number == record.invoice_number)
        {
            return Err(StoreError::Conflict(format!(
                "invoice {}",
                record.invoice_number
            )));
        }
        billing.push(record.clone());
        Ok(record)
    }

    async fn billing_for_account(&self, account: &AccountId) -> StoreResult<Vec<BillingRecord>> {
        self.check()?;
        let billing = self.billing.read().await;
        let mut list: Vec<BillingRecord> = billing
            .iter()
            .filter(|b| &b.account_id == account)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.transaction_date.cmp(&a.transaction_date));
        Ok(list)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_notification(&self, notification: Notification) -> StoreResult<Notification> {
        self.check()?;
        self.notifications.write().await.push(notification.clone());
        Ok(notification)
    }

    async fn notifications_for(
        &self,
        account: &AccountId,
        limit: Option<usize>,
    ) -> StoreResult<Vec<Notification>> {
        self.check()?;
        let notifications = self.notifications.read().await;
        // 삽입 순서가 곧 시간 순서
        let iter = notifications
            .iter()
            .rev()
            .filter(|n| &n.account_id == account)
            .cloned();
        Ok(match limit {
            Some(n) => iter.take(n).collect(),
            None => iter.collect(),
        })
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.check()
    }
}
