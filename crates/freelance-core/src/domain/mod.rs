//! 마켓플레이스 도메인 모델.

mod account;
mod billing;
mod message;
mod notification;
mod project;
mod review;
mod role;

pub use account::*;
pub use billing::*;
pub use message::*;
pub use notification::*;
pub use project::*;
pub use review::*;
pub use role::*;
