//! 应用层实现。
//!
//! 这里提供围绕领域模型的用例服务，处理输入校验、权限判断，
//! 以及对外部适配器（例如密码哈希、仓储、实时推送）的抽象。

pub mod clock;
pub mod error;
pub mod password;
pub mod publisher;
pub mod repository;
pub mod services;

pub use clock::{Clock, SystemClock};
pub use error::ApplicationError;
pub use password::{PasswordHasher, PasswordHasherError};
pub use publisher::{ConnectionId, EventPublisher};
pub use repository::{PostRepository, UserRepository};
pub use services::{
    PostService, PostServiceDependencies, SignUpRequest, UserService, UserServiceDependencies,
};
