//! 推送给在线客户端的领域事件

use serde::Serialize;

use crate::post::Post;

/// 需要实时通知的领域事件。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainEvent {
    PostCreated(Post),
}

impl DomainEvent {
    /// 线上的 `type` 字段
    pub fn label(&self) -> &'static str {
        match self {
            DomainEvent::PostCreated(_) => "Post Created",
        }
    }

    pub fn envelope(&self) -> EventEnvelope<'_, Post> {
        match self {
            DomainEvent::PostCreated(post) => EventEnvelope {
                kind: self.label(),
                payload: post,
            },
        }
    }
}

/// 出站消息信封：`{"type": ..., "payload": ...}`
#[derive(Debug, Serialize)]
pub struct EventEnvelope<'a, T: Serialize> {
    #[serde(rename = "type")]
    pub kind: &'a str,
    pub payload: &'a T,
}
