//! 계정 도메인 모델.
//!
//! 프리랜서, 클라이언트, 관리자 계정과 프로필 필드를 정의합니다.
//! 비밀번호 해시와 2FA 시크릿은 직렬화되지 않습니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Role;
use crate::error::{CoreError, CoreResult};

/// 비밀번호 최소 길이
pub const MIN_PASSWORD_LEN: usize = 6;

/// 계정 식별자.
///
/// 저장소에 독립적인 불투명 문자열입니다. 새 계정은 UUID v4 문자열을 사용합니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// 기존 식별자로 생성.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 새 식별자 생성.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AccountId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// 프리랜서 요금 범위.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    /// 최소 요금
    pub min: Decimal,
    /// 최대 요금 (상한 없음이면 None)
    #[serde(default)]
    pub max: Option<Decimal>,
}

impl PriceRange {
    /// 요금 범위 검증.
    pub fn validate(&self) -> CoreResult<()> {
        if self.min.is_sign_negative() {
            return Err(CoreError::Validation(
                "Minimum price cannot be negative".to_string(),
            ));
        }
        if let Some(max) = self.max {
            if max < self.min {
                return Err(CoreError::Validation(
                    "Maximum price must not be below minimum price".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// 개인정보 설정.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivacySettings {
    /// 프로필 공개 여부
    pub show_profile_publicly: bool,
    /// 다른 사용자의 직접 메시지 허용
    pub allow_direct_messages: bool,
    /// 이메일 알림 수신
    pub email_notifications: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            show_profile_publicly: true,
            allow_direct_messages: true,
            email_notifications: true,
        }
    }
}

/// 저장된 계정 레코드.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// 로그인 이메일 (소문자, 유일)
    pub email: String,
    /// Argon2 PHC 해시
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: Role,
    pub name: String,
    /// 클라이언트 사업체 이름
    #[serde(default)]
    pub business_name: String,
    /// 클라이언트 사업체 유형
    #[serde(default)]
    pub business_type: String,
    /// 프리랜서 소개
    #[serde(default)]
    pub bio: String,
    /// 프리랜서 보유 기술
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub price_range: PriceRange,
    /// 프로필 설정 완료 여부
    #[serde(default)]
    pub profile_completed: bool,
    /// 받은 리뷰의 평균 평점 (0이면 리뷰 없음)
    #[serde(default)]
    pub average_rating: f64,
    #[serde(default)]
    pub agreed_to_terms: bool,
    #[serde(default)]
    pub agreed_to_privacy_policy: bool,
    #[serde(default)]
    pub privacy: PrivacySettings,
    /// TOTP 시크릿 (hex)
    #[serde(skip_serializing, default)]
    pub two_factor_secret: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// 새 계정 생성.
    ///
    /// 이메일은 정규화되고, 프로필 완료 여부가 계산됩니다.
    pub fn new(new: NewAccount) -> Self {
        let now = Utc::now();
        let mut account = Self {
            id: AccountId::generate(),
            email: normalize_email(&new.email),
            password_hash: new.password_hash,
            role: new.role,
            name: new.name.trim().to_string(),
            business_name: new.business_name.unwrap_or_default(),
            business_type: new.business_type.unwrap_or_default(),
            bio: String::new(),
            skills: normalize_skills(new.skills.unwrap_or_default()),
            price_range: PriceRange::default(),
            profile_completed: false,
            average_rating: 0.0,
            agreed_to_terms: false,
            agreed_to_privacy_policy: false,
            privacy: PrivacySettings::default(),
            two_factor_secret: None,
            created_at: now,
            updated_at: now,
        };
        account.profile_completed = account.compute_profile_completed();
        account
    }

    /// 2FA 활성화 여부.
    pub fn two_factor_enabled(&self) -> bool {
        self.two_factor_secret.is_some()
    }

    /// 프로필 갱신 적용.
    pub fn apply_profile(&mut self, update: ProfileUpdate) -> CoreResult<()> {
        if let Some(name) = update.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(CoreError::Validation("Name cannot be empty".to_string()));
            }
            self.name = name.to_string();
        }
        if let Some(bio) = update.bio {
            self.bio = bio.trim().to_string();
        }
        if let Some(skills) = update.skills {
            self.skills = normalize_skills(skills);
        }
        if let Some(business_name) = update.business_name {
            self.business_name = business_name.trim().to_string();
        }
        if let Some(business_type) = update.business_type {
            self.business_type = business_type.trim().to_string();
        }
        if update.price_min.is_some() || update.price_max.is_some() {
            let range = PriceRange {
                min: update.price_min.unwrap_or(self.price_range.min),
                max: update.price_max.or(self.price_range.max),
            };
            range.validate()?;
            self.price_range = range;
        }

        self.profile_completed = self.compute_profile_completed();
        self.updated_at = Utc::now();
        Ok(())
    }

    /// 관리자 갱신 적용 (이메일/역할 변경 포함).
    pub fn apply_admin_update(&mut self, update: AccountUpdate) -> CoreResult<()> {
        if let Some(email) = update.email {
            self.email = normalize_email(&email);
        }
        if let Some(role) = update.role {
            self.role = role;
        }
        self.apply_profile(update.profile)
    }

    /// 프리랜서의 기술이 주어진 기술 목록과 하나라도 겹치는지 확인 (대소문자 무시).
    pub fn has_any_skill(&self, wanted: &[String]) -> bool {
        self.skills
            .iter()
            .any(|s| wanted.iter().any(|w| w.eq_ignore_ascii_case(s)))
    }

    fn compute_profile_completed(&self) -> bool {
        if self.name.is_empty() {
            return false;
        }
        match self.role {
            Role::Freelancer => !self.bio.is_empty() && !self.skills.is_empty(),
            Role::Client => !self.business_name.is_empty(),
            Role::Admin => true,
        }
    }
}

/// 계정 생성 입력.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub name: String,
    pub business_name: Option<String>,
    pub business_type: Option<String>,
    pub skills: Option<Vec<String>>,
}

/// 프로필 갱신 입력. None 필드는 유지됩니다.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Option<Vec<String>>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub price_min: Option<Decimal>,
    #[serde(default)]
    pub price_max: Option<Decimal>,
}

/// 관리자용 계정 갱신 입력.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountUpdate {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(flatten)]
    pub profile: ProfileUpdate,
}

/// 개인정보 설정 부분 변경. 빠진 항목은 유지됩니다.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrivacyUpdate {
    #[serde(default)]
    pub show_profile_publicly: Option<bool>,
    #[serde(default)]
    pub allow_direct_messages: Option<bool>,
    #[serde(default)]
    pub email_notifications: Option<bool>,
}

impl PrivacyUpdate {
    pub fn apply(&self, settings: &mut PrivacySettings) {
        if let Some(v) = self.show_profile_publicly {
            settings.show_profile_publicly = v;
        }
        if let Some(v) = self.allow_direct_messages {
            settings.allow_direct_messages = v;
        }
        if let Some(v) = self.email_notifications {
            settings.email_notifications = v;
        }
    }
}

/// 저장된 계정에 적용하는 필드 단위 변경.
///
/// 저장소는 최신 레코드를 읽고 변경을 적용해 같은 잠금(또는 트랜잭션) 안에서 기록합니다.
/// 변경이 다루지 않는 필드는 건드리지 않으므로 요청 시점의 계정 사본이
/// 그 사이 바뀐 역할을 되돌리지 못합니다. 역할은 [`AccountChange::Admin`]만 바꿉니다.
#[derive(Debug, Clone)]
pub enum AccountChange {
    /// 본인 프로필 수정
    Profile(ProfileUpdate),
    /// 관리자 수정 (이메일/역할 포함)
    Admin(AccountUpdate),
    /// 2FA 시크릿 설정
    TwoFactorSecret(String),
    /// 이용약관 동의
    AgreeToTerms,
    /// 개인정보 처리방침 동의
    AgreeToPrivacyPolicy,
    /// 개인정보 설정 변경
    Privacy(PrivacyUpdate),
    /// 리뷰 평균 평점 갱신
    AverageRating(f64),
}

impl AccountChange {
    /// 계정에 변경 적용. 검증에 실패하면 계정은 일부만 바뀌었을 수 있으므로
    /// 호출자는 사본에 적용해야 합니다.
    pub fn apply(self, account: &mut Account) -> CoreResult<()> {
        match self {
            AccountChange::Profile(update) => return account.apply_profile(update),
            AccountChange::Admin(update) => return account.apply_admin_update(update),
            AccountChange::TwoFactorSecret(secret) => account.two_factor_secret = Some(secret),
            AccountChange::AgreeToTerms => account.agreed_to_terms = true,
            AccountChange::AgreeToPrivacyPolicy => account.agreed_to_privacy_policy = true,
            AccountChange::Privacy(update) => update.apply(&mut account.privacy),
            AccountChange::AverageRating(rating) => account.average_rating = rating,
        }
        account.updated_at = Utc::now();
        Ok(())
    }
}

/// 다른 사용자에게 보여지는 공개 프로필.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicProfile {
    pub id: AccountId,
    pub name: String,
    pub role: Role,
    pub bio: String,
    pub skills: Vec<String>,
    pub business_name: String,
    pub price_range: PriceRange,
    pub average_rating: f64,
}

impl From<&Account> for PublicProfile {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.clone(),
            name: account.name.clone(),
            role: account.role,
            bio: account.bio.clone(),
            skills: account.skills.clone(),
            business_name: account.business_name.clone(),
            price_range: account.price_range.clone(),
            average_rating: account.average_rating,
        }
    }
}

/// 이메일 정규화 (공백 제거, 소문자).
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn normalize_skills(skills: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(skills.len());
    for skill in skills {
        let skill = skill.trim();
        if skill.is_empty() || out.iter().any(|s| s.eq_ignore_ascii_case(skill)) {
            continue;
        }
        out.push(skill.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn freelancer() -> Account {
        Account::new(NewAccount {
            email: "  John@Example.com ".to_string(),
            password_hash: "hash".to_string(),
            role: Role::Freelancer,
            name: "John Doe".to_string(),
            business_name: None,
            business_type: None,
            skills: Some(vec![
                "Penetration Testing".to_string(),
                "penetration testing".to_string(),
                " ".to_string(),
            ]),
        })
    }

    #[test]
    fn test_new_account_normalizes_fields() {
        let account = freelancer();
        assert_eq!(account.email, "john@example.com");
        assert_eq!(account.skills, vec!["Penetration Testing".to_string()]);
        assert!(!account.profile_completed, "bio missing");
        assert!(!account.two_factor_enabled());
    }

    #[test]
    fn test_profile_update_completes_profile() {
        let mut account = freelancer();
        account
            .apply_profile(ProfileUpdate {
                bio: Some("Security consultant".to_string()),
                price_min: Some(dec!(50)),
                price_max: Some(dec!(120)),
                ..Default::default()
            })
            .unwrap();

        assert!(account.profile_completed);
        assert_eq!(account.price_range.max, Some(dec!(120)));
    }

    #[test]
    fn test_profile_update_rejects_inverted_price_range() {
        let mut account = freelancer();
        let result = account.apply_profile(ProfileUpdate {
            price_min: Some(dec!(100)),
            price_max: Some(dec!(10)),
            ..Default::default()
        });
        assert!(result.is_err());
        assert_eq!(account.price_range, PriceRange::default());
    }

    #[test]
    fn test_secrets_are_not_serialized() {
        let mut account = freelancer();
        account.two_factor_secret = Some("abcd".to_string());
        let json = serde_json::to_string(&account).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("two_factor_secret"));
        assert!(!json.contains("abcd"));
    }

    #[test]
    fn test_admin_update_changes_role() {
        let mut account = freelancer();
        account
            .apply_admin_update(AccountUpdate {
                role: Some(Role::Client),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(account.role, Role::Client);
    }

    #[test]
    fn test_has_any_skill_ignores_case() {
        let account = freelancer();
        assert!(account.has_any_skill(&["PENETRATION TESTING".to_string()]));
        assert!(!account.has_any_skill(&["Design".to_string()]));
    }

    #[test]
    fn test_partial_privacy_update_keeps_other_settings() {
        let mut account = freelancer();
        AccountChange::Privacy(PrivacyUpdate {
            allow_direct_messages: Some(false),
            ..Default::default()
        })
        .apply(&mut account)
        .unwrap();

        assert!(!account.privacy.allow_direct_messages);
        assert!(account.privacy.show_profile_publicly);
        assert!(account.privacy.email_notifications);
    }

    #[test]
    fn test_only_admin_change_touches_role() {
        let changes = [
            AccountChange::Profile(ProfileUpdate {
                bio: Some("Red team lead".to_string()),
                ..Default::default()
            }),
            AccountChange::TwoFactorSecret("00ff".to_string()),
            AccountChange::AgreeToTerms,
            AccountChange::AgreeToPrivacyPolicy,
            AccountChange::Privacy(PrivacyUpdate::default()),
            AccountChange::AverageRating(4.5),
        ];
        for change in changes {
            let mut account = freelancer();
            change.apply(&mut account).unwrap();
            assert_eq!(account.role, Role::Freelancer);
        }

        let mut account = freelancer();
        AccountChange::Admin(AccountUpdate {
            role: Some(Role::Client),
            ..Default::default()
        })
        .apply(&mut account)
        .unwrap();
        assert_eq!(account.role, Role::Client);
    }
}
