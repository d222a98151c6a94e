//! CLI 명령어 구현 모듈.

pub mod hash_password;
pub mod issue_token;
pub mod migrate;
pub mod seed;
