//! 샘플 계정 시드.
//!
//! 개발용 데이터베이스에 프리랜서와 클라이언트 계정을 채웁니다.
//! 이미 같은 이메일이 있으면 건너뛰므로 여러 번 실행해도 안전합니다.

use anyhow::{Context, Result};
use freelance_core::crypto::hash_password;
use freelance_core::{Account, NewAccount, Role, Store};
use tracing::{info, warn};

/// 시드 계정 정의.
#[derive(Debug, Clone, Copy)]
pub struct SeedAccount {
    pub name: &'static str,
    pub email: &'static str,
    pub password: &'static str,
    pub role: Role,
    pub business_type: Option<&'static str>,
    pub skills: &'static [&'static str],
}

/// 기본 샘플 계정.
pub const SAMPLE_ACCOUNTS: &[SeedAccount] = &[
    SeedAccount {
        name: "John Doe",
        email: "john@example.com",
        password: "password123",
        role: Role::Freelancer,
        business_type: None,
        skills: &["Penetration Testing", "Incident Response"],
    },
    SeedAccount {
        name: "Lara Smith",
        email: "lara@example.com",
        password: "securepassword",
        role: Role::Client,
        business_type: Some("individual"),
        skills: &[],
    },
    SeedAccount {
        name: "Alice Johnson",
        email: "alice@example.com",
        password: "alicepassword",
        role: Role::Freelancer,
        business_type: None,
        skills: &["Web Security", "Vulnerability Assessment"],
    },
    SeedAccount {
        name: "Bob Anderson",
        email: "bob@example.com",
        password: "bobpassword",
        role: Role::Freelancer,
        business_type: None,
        skills: &["Security Auditing", "Security Consulting"],
    },
    SeedAccount {
        name: "Larnet",
        email: "info@larnet.co.uk",
        password: "larnetpassword",
        role: Role::Client,
        business_type: Some("business"),
        skills: &[],
    },
    SeedAccount {
        name: "HMRC",
        email: "info@hmrc.gov.uk",
        password: "hmrcpassword12",
        role: Role::Client,
        business_type: Some("government"),
        skills: &[],
    },
];

/// 추가로 만들 관리자 계정.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

/// 시드 결과.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub created: usize,
    pub skipped: usize,
}

impl SeedAccount {
    fn to_account(&self) -> Result<Account> {
        let password_hash = hash_password(self.password)
            .with_context(|| format!("failed to hash password for {}", self.email))?;

        let (business_name, skills) = match self.role {
            Role::Freelancer => (
                None,
                Some(self.skills.iter().map(|s| s.to_string()).collect()),
            ),
            _ => (self.business_type.map(|_| self.name.to_string()), None),
        };

        Ok(Account::new(NewAccount {
            email: self.email.to_string(),
            password_hash,
            role: self.role,
            name: self.name.to_string(),
            business_name,
            business_type: self.business_type.map(str::to_string),
            skills,
        }))
    }
}

/// 샘플 계정(과 선택적 관리자)을 저장소에 넣습니다.
pub async fn seed_accounts(store: &dyn Store, admin: Option<AdminSeed>) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    let mut accounts = Vec::with_capacity(SAMPLE_ACCOUNTS.len() + 1);
    for seed in SAMPLE_ACCOUNTS {
        accounts.push(seed.to_account()?);
    }
    if let Some(admin) = admin {
        let password_hash =
            hash_password(&admin.password).context("failed to hash admin password")?;
        accounts.push(Account::new(NewAccount {
            email: admin.email,
            password_hash,
            role: Role::Admin,
            name: "Administrator".to_string(),
            business_name: None,
            business_type: None,
            skills: None,
        }));
    }

    for account in accounts {
        if store.find_account_by_email(&account.email).await?.is_some() {
            warn!(email = %account.email, "Account already exists, skipping");
            report.skipped += 1;
            continue;
        }

        let account = store.insert_account(account).await?;
        info!(id = %account.id, email = %account.email, role = %account.role, "Seeded account");
        report.created += 1;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use freelance_core::crypto::verify_password;
    use freelance_core::{AccountStore, MemoryStore};

    #[tokio::test]
    async fn test_seed_creates_sample_accounts() {
        let store = MemoryStore::new();

        let report = seed_accounts(&store, None).await.unwrap();
        assert_eq!(report.created, SAMPLE_ACCOUNTS.len());
        assert_eq!(report.skipped, 0);

        let john = store
            .find_account_by_email("john@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(john.role, Role::Freelancer);
        assert!(john.has_any_skill(&["Incident Response".to_string()]));
        assert!(verify_password("password123", &john.password_hash).is_ok());

        let hmrc = store
            .find_account_by_email("info@hmrc.gov.uk")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hmrc.business_type, "government");
        assert_eq!(hmrc.business_name, "HMRC");
    }

    #[tokio::test]
    async fn test_seed_is_repeatable() {
        let store = MemoryStore::new();
        seed_accounts(&store, None).await.unwrap();

        let admin = AdminSeed {
            email: "admin@example.com".to_string(),
            password: "adminpassword".to_string(),
        };
        let report = seed_accounts(&store, Some(admin)).await.unwrap();

        assert_eq!(
            report,
            SeedReport {
                created: 1,
                skipped: SAMPLE_ACCOUNTS.len(),
            }
        );
        assert_eq!(store.count_accounts(Role::Admin).await.unwrap(), 1);
    }
}
