//! JWT 토큰 처리.
//!
//! 로그인 시 토큰을 발급하는 [`TokenIssuer`]와 보호된 요청마다 토큰을 검증하는
//! [`TokenVerifier`]를 제공합니다. 두 쪽 모두 같은 서명 시크릿을 생성자로 전달받습니다.
//!
//! 검증은 (토큰, 시크릿, 시각)에 대한 순수 함수입니다. 만료 검사는 라이브러리에
//! 맡기지 않고 `now > exp + leeway` 조건으로 직접 수행하여, 만료된 토큰이 항상
//! [`JwtError::Expired`]로 구분되도록 합니다.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use freelance_core::{Account, AccountId, Role};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// JWT Access Token 페이로드.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 계정 ID
    pub sub: String,
    /// 발급 시점의 계정 역할
    pub role: Role,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// JWT ID
    pub jti: String,
}

impl Claims {
    /// 새로운 Claims 생성.
    pub fn new(account_id: &AccountId, role: Role, issued_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            sub: account_id.as_str().to_string(),
            role,
            iat: issued_at.timestamp(),
            exp: (issued_at + ttl).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        }
    }

    pub fn account_id(&self) -> AccountId {
        AccountId::new(self.sub.clone())
    }

    /// 주어진 시각에 만료되었는지 확인.
    pub fn is_expired_at(&self, now: DateTime<Utc>, leeway_secs: u64) -> bool {
        now.timestamp() > self.exp.saturating_add(leeway_secs as i64)
    }
}

/// 발급된 토큰.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    pub access_token: String,
    /// 항상 "Bearer"
    pub token_type: String,
    /// 만료까지 남은 시간 (초)
    pub expires_in: i64,
}

/// JWT 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("토큰 인코딩 실패: {0}")]
    Encoding(#[from] jsonwebtoken::errors::Error),
    #[error("토큰이 만료되었습니다")]
    Expired,
    #[error("유효하지 않은 토큰")]
    Invalid,
}

/// 토큰 발급자.
#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// # Arguments
    ///
    /// * `secret` - HS256 서명 시크릿
    /// * `ttl_minutes` - 토큰 수명 (분)
    pub fn new(secret: &SecretString, ttl_minutes: i64) -> Self {
        Self {
            key: EncodingKey::from_secret(secret.expose_secret().as_bytes()),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// 계정에 대한 토큰 발급.
    pub fn issue(&self, account: &Account) -> Result<IssuedToken, JwtError> {
        self.issue_for(&account.id, account.role)
    }

    /// 계정 ID와 역할로 토큰 발급.
    pub fn issue_for(&self, account_id: &AccountId, role: Role) -> Result<IssuedToken, JwtError> {
        let (access_token, _) = self.issue_at(account_id, role, Utc::now())?;
        Ok(IssuedToken {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.ttl.num_seconds(),
        })
    }

    /// 지정한 발급 시각으로 서명된 토큰과 그 Claims 반환.
    pub fn issue_at(
        &self,
        account_id: &AccountId,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> Result<(String, Claims), JwtError> {
        let claims = Claims::new(account_id, role, issued_at, self.ttl);
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.key)?;
        Ok((token, claims))
    }
}

/// 토큰 검증자.
#[derive(Clone)]
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
    leeway_secs: u64,
}

impl TokenVerifier {
    /// # Arguments
    ///
    /// * `secret` - 발급자와 같은 서명 시크릿
    /// * `leeway_secs` - 만료 검사 시 허용하는 시계 오차
    pub fn new(secret: &SecretString, leeway_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims =
            HashSet::from(["exp".to_string(), "sub".to_string()]);

        Self {
            key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
            leeway_secs,
        }
    }

    /// 현재 시각 기준으로 토큰 검증.
    pub fn verify(&self, raw: &str) -> Result<Claims, JwtError> {
        self.verify_at(raw, Utc::now())
    }

    /// 주어진 시각 기준으로 토큰 검증.
    ///
    /// 형식/서명 오류는 `Invalid`, 서명은 맞지만 만료되었으면 `Expired`.
    pub fn verify_at(&self, raw: &str, now: DateTime<Utc>) -> Result<Claims, JwtError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(JwtError::Invalid);
        }

        let data = decode::<Claims>(raw, &self.key, &self.validation).map_err(|_| JwtError::Invalid)?;
        if data.claims.is_expired_at(now, self.leeway_secs) {
            return Err(JwtError::Expired);
        }
        Ok(data.claims)
    }

    pub fn leeway_secs(&self) -> u64 {
        self.leeway_secs
    }
}
