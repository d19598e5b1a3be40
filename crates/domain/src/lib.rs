//! 帖子通知系统核心领域模型
//!
//! 包含用户、帖子等核心实体，以及推送给在线客户端的领域事件。

pub mod errors;
pub mod events;
pub mod post;
pub mod user;
pub mod value_objects;

// 重新导出常用类型
pub use errors::{DomainError, DomainResult, RepositoryError};
pub use events::{DomainEvent, EventEnvelope};
pub use post::Post;
pub use user::User;
pub use value_objects::{PasswordHash, PostContent, PostId, Timestamp, UserEmail, UserId};
