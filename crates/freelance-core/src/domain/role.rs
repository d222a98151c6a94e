//! 계정 역할 정의.
//!
//! 마켓플레이스의 모든 계정은 정확히 하나의 역할을 가집니다.

use serde::{Deserialize, Serialize};

/// 계정 역할.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// 프리랜서 - 프로젝트에 관심 표시, 리뷰 대상
    Freelancer,
    /// 클라이언트 - 프로젝트 등록 및 제안 수락
    Client,
    /// 관리자 - 계정/프로젝트 관리
    Admin,
}

impl Role {
    /// 모든 역할 목록.
    pub const ALL: [Role; 3] = [Role::Freelancer, Role::Client, Role::Admin];

    /// 문자열에서 역할 파싱.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "freelancer" => Some(Role::Freelancer),
            "client" => Some(Role::Client),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// 소문자 태그 반환.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Freelancer => "freelancer",
            Role::Client => "client",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::parse(s).ok_or_else(|| format!("Unknown role: {}", s))
    }
}
