//! 라우트별 허용 역할 집합.
//!
//! 역할은 닫힌 열거형([`Role`])이므로 라우트 선언의 오타는 컴파일 시점에 잡힙니다.
//! 빈 집합은 허용되지 않으며, `const` 선언에서 사용하면 컴파일이 실패합니다.

use std::fmt;

use freelance_core::Role;

/// 허용 역할 비트셋.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoleSet(u8);

/// 클라이언트 전용
pub const CLIENTS: RoleSet = RoleSet::of(&[Role::Client]);
/// 프리랜서 전용
pub const FREELANCERS: RoleSet = RoleSet::of(&[Role::Freelancer]);
/// 관리자 전용
pub const ADMINS: RoleSet = RoleSet::of(&[Role::Admin]);
/// 클라이언트와 프리랜서
pub const MEMBERS: RoleSet = RoleSet::of(&[Role::Client, Role::Freelancer]);
/// 모든 인증된 계정
pub const ANY_ROLE: RoleSet = RoleSet::of(&Role::ALL);

impl RoleSet {
    const fn bit(role: Role) -> u8 {
        match role {
            Role::Freelancer => 0b001,
            Role::Client => 0b010,
            Role::Admin => 0b100,
        }
    }

    /// 역할 목록으로 집합 생성.
    ///
    /// # Panics
    ///
    /// 목록이 비어 있으면 패닉합니다. `const` 문맥에서는 컴파일 에러가 됩니다.
    pub const fn of(roles: &[Role]) -> Self {
        if roles.is_empty() {
            panic!("RoleSet requires at least one role");
        }
        let mut bits = 0u8;
        let mut i = 0;
        while i < roles.len() {
            bits |= Self::bit(roles[i]);
            i += 1;
        }
        Self(bits)
    }

    /// 런타임 구성용. 목록이 비어 있으면 None.
    pub fn try_from_roles(roles: &[Role]) -> Option<Self> {
        if roles.is_empty() {
            None
        } else {
            Some(Self::of(roles))
        }
    }

    pub const fn contains(self, role: Role) -> bool {
        self.0 & Self::bit(role) != 0
    }

    #[must_use]
    pub const fn union(self, other: RoleSet) -> Self {
        Self(self.0 | other.0)
    }

    pub fn iter(self) -> impl Iterator<Item = Role> {
        Role::ALL.into_iter().filter(move |r| self.contains(*r))
    }
}

impl fmt::Debug for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(|r| r.as_str()).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predefined_sets() {
        assert!(CLIENTS.contains(Role::Client));
        assert!(!CLIENTS.contains(Role::Freelancer));
        assert!(!CLIENTS.contains(Role::Admin));

        assert!(MEMBERS.contains(Role::Client));
        assert!(MEMBERS.contains(Role::Freelancer));
        assert!(!MEMBERS.contains(Role::Admin));

        for role in Role::ALL {
            assert!(ANY_ROLE.contains(role));
        }
    }

    #[test]
    fn test_union_and_display() {
        let set = CLIENTS.union(ADMINS);
        assert_eq!(set.to_string(), "{client, admin}");
        assert_eq!(set.iter().count(), 2);
        assert_eq!(FREELANCERS.union(FREELANCERS), FREELANCERS);
    }

    #[test]
    fn test_empty_set_rejected_at_runtime() {
        assert!(RoleSet::try_from_roles(&[]).is_none());
        assert_eq!(RoleSet::try_from_roles(&[Role::Admin]), Some(ADMINS));
    }

    #[test]
    #[should_panic(expected = "at least one role")]
    fn test_empty_set_panics() {
        let empty: Vec<Role> = Vec::new();
        let _ = RoleSet::of(&empty);
    }
}
