//! 基础设施层实现。
//!
//! 提供数据库仓储、密码哈希，以及向在线客户端推送事件的连接中心。

pub mod hub;
pub mod memory;
pub mod password;
pub mod repository;

pub use hub::{
    Connection, ConnectionHandle, ConnectionMonitor, Hub, HubHandle, Inbound, Transport,
    TransportError,
};
pub use memory::{InMemoryPostRepository, InMemoryUserRepository};
pub use password::BcryptPasswordHasher;
pub use repository::{create_pg_pool, PgPostRepository, PgUserRepository};
