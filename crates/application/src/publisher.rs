//! 实时推送端口
//!
//! 应用层只负责在领域事件发生时调用 [`EventPublisher::publish`]，
//! 投递是尽力而为、至多一次的，调用方不会收到任何投递错误。

use std::fmt;

use async_trait::async_trait;
use domain::DomainEvent;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 一条在线 socket 连接的标识。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ConnectionId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// 向所有在线连接广播事件，`exclude` 指定的连接（事件发起方）除外
    async fn publish(&self, event: DomainEvent, exclude: Option<ConnectionId>);
}
