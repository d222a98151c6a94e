//! # 암호화 모듈
//!
//! 비밀번호 해싱(Argon2id)과 2단계 인증용 TOTP(HMAC-SHA256)를 제공합니다.
//!
//! ## 보안 고려사항
//! - 비밀번호는 PHC 형식 해시로만 저장
//! - TOTP 시크릿은 20바이트 난수의 hex 문자열
//! - 코드 비교는 상수 시간으로 수행

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::domain::MIN_PASSWORD_LEN;

type HmacSha256 = Hmac<Sha256>;

/// TOTP 시크릿 크기 (바이트)
pub const TOTP_SECRET_SIZE: usize = 20;

/// 비밀번호 처리 에러.
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("비밀번호 해싱 실패")]
    HashingFailed,
    #[error("비밀번호 검증 실패")]
    VerificationFailed,
    #[error("잘못된 해시 형식")]
    InvalidHashFormat,
    #[error("Password must be at least {0} characters")]
    TooShort(usize),
}

/// TOTP 에러.
#[derive(Debug, Error)]
pub enum TotpError {
    #[error("Invalid TOTP secret")]
    InvalidSecret,
    #[error("Unsupported digit count: {0}")]
    UnsupportedDigits(u32),
}

/// 비밀번호 해싱.
///
/// Argon2id 알고리즘을 사용하며 솔트는 자동으로 생성됩니다.
/// 최소 길이보다 짧은 비밀번호는 거부합니다.
///
/// ```rust,ignore
/// let hash = hash_password("password123").unwrap();
/// // "$argon2id$v=19$m=19456,t=2,p=1$..."
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooShort(MIN_PASSWORD_LEN));
    }

    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| PasswordError::HashingFailed)?;

    Ok(hash.to_string())
}

/// 비밀번호 검증.
///
/// 일치하면 Ok(()), 불일치하면 `VerificationFailed`.
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| PasswordError::VerificationFailed)
}

/// TOTP 파라미터.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotpSettings {
    /// 시간 단계 (초)
    #[serde(default = "default_step_secs")]
    pub step_secs: u64,
    /// 코드 자릿수 (6~8)
    #[serde(default = "default_digits")]
    pub digits: u32,
    /// 앞뒤로 허용할 단계 수
    #[serde(default = "default_skew_steps")]
    pub skew_steps: u64,
    /// 인증 앱에 표시될 발급자 이름
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

fn default_step_secs() -> u64 {
    30
}
fn default_digits() -> u32 {
    6
}
fn default_skew_steps() -> u64 {
    1
}
fn default_issuer() -> String {
    "Freelance Marketplace".to_string()
}

impl Default for TotpSettings {
    fn default() -> Self {
        Self {
            step_secs: default_step_secs(),
            digits: default_digits(),
            skew_steps: default_skew_steps(),
            issuer: default_issuer(),
        }
    }
}

/// 새 TOTP 시크릿 생성 (hex).
pub fn generate_totp_secret() -> String {
    let mut bytes = [0u8; TOTP_SECRET_SIZE];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// 인증 앱 등록용 `otpauth://` URI.
pub fn totp_uri(secret: &str, account_label: &str, settings: &TotpSettings) -> String {
    format!(
        "otpauth://totp/{issuer}:{label}?secret={secret}&issuer={issuer}&algorithm=SHA256&digits={digits}&period={period}",
        issuer = settings.issuer.replace(' ', "%20"),
        label = account_label,
        secret = secret,
        digits = settings.digits,
        period = settings.step_secs,
    )
}

/// 주어진 시각(UNIX 초)의 TOTP 코드.
pub fn totp_code(secret: &str, unix_secs: u64, settings: &TotpSettings) -> Result<String, TotpError> {
    let key = hex::decode(secret).map_err(|_| TotpError::InvalidSecret)?;
    let counter = unix_secs / settings.step_secs.max(1);
    hotp(&key, counter, settings.digits)
}

/// TOTP 코드 검증. 허용 오차 범위 안의 단계 중 하나와 일치하면 true.
pub fn verify_totp(
    secret: &str,
    code: &str,
    unix_secs: u64,
    settings: &TotpSettings,
) -> Result<bool, TotpError> {
    let key = hex::decode(secret).map_err(|_| TotpError::InvalidSecret)?;
    let code = code.trim();
    if code.len() != settings.digits as usize || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(false);
    }

    let counter = unix_secs / settings.step_secs.max(1);
    let first = counter.saturating_sub(settings.skew_steps);
    let last = counter.saturating_add(settings.skew_steps);
    for c in first..=last {
        let expected = hotp(&key, c, settings.digits)?;
        if bool::from(expected.as_bytes().ct_eq(code.as_bytes())) {
            return Ok(true);
        }
    }
    Ok(false)
}

// RFC 4226 동적 절단
fn hotp(key: &[u8], counter: u64, digits: u32) -> Result<String, TotpError> {
    if !(6..=8).contains(&digits) {
        return Err(TotpError::UnsupportedDigits(digits));
    }
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| TotpError::InvalidSecret)?;
    mac.update(&counter.to_be_bytes());
    let digest = mac.finalize().into_bytes();

    let offset = (digest[digest.len() - 1] & 0x0f) as usize;
    let binary = (u32::from(digest[offset] & 0x7f) << 24)
        | (u32::from(digest[offset + 1]) << 16)
        | (u32::from(digest[offset + 2]) << 8)
        | u32::from(digest[offset + 3]);
    let value = binary % 10u32.pow(digits);

    Ok(format!("{:0width$}", value, width = digits as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("password123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("password123", &hash).is_ok());
        assert!(matches!(
            verify_password("password124", &hash),
            Err(PasswordError::VerificationFailed)
        ));
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(matches!(hash_password("abc"), Err(PasswordError::TooShort(6))));
    }

    #[test]
    fn test_invalid_hash_format() {
        let result = verify_password("password", "not-a-valid-hash");
        assert!(matches!(result, Err(PasswordError::InvalidHashFormat)));
    }

    #[test]
    fn test_totp_secret_shape() {
        let secret = generate_totp_secret();
        assert_eq!(secret.len(), TOTP_SECRET_SIZE * 2);
        assert_ne!(secret, generate_totp_secret());
    }

    #[test]
    fn test_totp_matches_rfc6238_sha256_vector() {
        // RFC 6238 부록 B, SHA256 시드
        let secret = hex::encode(b"12345678901234567890123456789012");
        let settings = TotpSettings {
            digits: 8,
            ..Default::default()
        };
        assert_eq!(totp_code(&secret, 59, &settings).unwrap(), "46119246");
        assert_eq!(totp_code(&secret, 1111111109, &settings).unwrap(), "68084774");
    }

    #[test]
    fn test_verify_totp_with_skew() {
        let settings = TotpSettings::default();
        let secret = generate_totp_secret();
        let now = 1_700_000_000;
        let code = totp_code(&secret, now, &settings).unwrap();

        assert!(verify_totp(&secret, &code, now, &settings).unwrap());
        assert!(verify_totp(&secret, &code, now + 30, &settings).unwrap());
        assert!(!verify_totp(&secret, &code, now + 300, &settings).unwrap());
        assert!(!verify_totp(&secret, "12ab56", now, &settings).unwrap());
    }

    #[test]
    fn test_verify_totp_rejects_near_miss() {
        let settings = TotpSettings {
            skew_steps: 0,
            ..Default::default()
        };
        let secret = generate_totp_secret();
        let now = 1_700_000_000;
        let code = totp_code(&secret, now, &settings).unwrap();

        let mut near = code.clone().into_bytes();
        let last = near.len() - 1;
        near[last] = if near[last] == b'9' { b'0' } else { near[last] + 1 };
        let near = String::from_utf8(near).unwrap();

        assert!(verify_totp(&secret, &code, now, &settings).unwrap());
        assert!(!verify_totp(&secret, &near, now, &settings).unwrap());
        assert!(!verify_totp(&secret, &code[..code.len() - 1], now, &settings).unwrap());
    }

    #[test]
    fn test_invalid_secret() {
        let settings = TotpSettings::default();
        assert!(matches!(
            totp_code("zz", 0, &settings),
            Err(TotpError::InvalidSecret)
        ));
    }
}
