use std::collections::HashMap;

use application::{ConnectionId, EventPublisher};
use async_trait::async_trait;
use config::HubConfig;
use domain::DomainEvent;
use tokio::sync::{mpsc, oneshot};
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use super::connection::{ConnectionHandle, OutboundMessage};

/// 成员变更与查询请求
enum Control {
    Register {
        handle: ConnectionHandle,
        ack: oneshot::Sender<()>,
    },
    Unregister {
        id: ConnectionId,
    },
    Count {
        reply: oneshot::Sender<usize>,
    },
}

/// 一次广播请求：不可变载荷加可选的排除连接
struct Broadcast {
    message: OutboundMessage,
    exclude: Option<ConnectionId>,
}

/// 连接中心 actor。
///
/// 成员集合只在 [`Hub::run`] 所在的任务中读写，其他任务一律通过 [`HubHandle`] 发消息。
pub struct Hub {
    members: HashMap<ConnectionId, ConnectionHandle>,
    control_rx: mpsc::Receiver<Control>,
    broadcast_rx: mpsc::Receiver<Broadcast>,
    shutdown: CancellationToken,
}

/// [`Hub`] 的发送端
#[derive(Clone)]
pub struct HubHandle {
    control_tx: mpsc::Sender<Control>,
    broadcast_tx: mpsc::Sender<Broadcast>,
    shutdown: CancellationToken,
    outbound_capacity: usize,
}

impl Hub {
    pub fn new(config: &HubConfig) -> (Self, HubHandle) {
        let capacity = config.command_capacity.max(1);
        let (control_tx, control_rx) = mpsc::channel(capacity);
        let (broadcast_tx, broadcast_rx) = mpsc::channel(capacity);
        let shutdown = CancellationToken::new();

        let hub = Self {
            members: HashMap::new(),
            control_rx,
            broadcast_rx,
            shutdown: shutdown.clone(),
        };
        let handle = HubHandle {
            control_tx,
            broadcast_tx,
            shutdown,
            outbound_capacity: config.outbound_capacity.max(1),
        };
        (hub, handle)
    }

    /// 协调循环，直到 [`HubHandle::shutdown`] 或所有句柄都被丢弃。
    ///
    /// 成员请求优先于广播处理。停止时清空成员：每个连接的缓冲区随之关闭，
    /// 写循环写完已入队的消息后发送关闭帧；尚未处理的广播直接丢弃。
    pub async fn run(mut self) {
        tracing::info!("connection hub started");

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    tracing::info!("connection hub shutting down");
                    break;
                }
                control = self.control_rx.recv() => match control {
                    Some(control) => self.handle_control(control),
                    None => break,
                },
                Some(broadcast) = self.broadcast_rx.recv() => self.fan_out(broadcast),
            }
        }

        let remaining = self.members.len();
        self.members.clear();
        tracing::info!(closed = remaining, "connection hub stopped");
    }

    fn handle_control(&mut self, control: Control) {
        match control {
            Control::Register { handle, ack } => {
                let id = handle.id();
                if self.members.insert(id, handle).is_some() {
                    tracing::warn!(connection_id = %id, "connection registered twice, replacing");
                }
                tracing::info!(connection_id = %id, members = self.members.len(), "connection registered");
                let _ = ack.send(());
            }
            Control::Unregister { id } => {
                // 读写两端都可能检测到故障，重复注销是空操作
                if self.members.remove(&id).is_some() {
                    tracing::info!(connection_id = %id, members = self.members.len(), "connection unregistered");
                } else {
                    tracing::debug!(connection_id = %id, "connection already unregistered");
                }
            }
            Control::Count { reply } => {
                let _ = reply.send(self.members.len());
            }
        }
    }

    /// 非阻塞地投递给每个成员，缓冲区已满或已关闭的连接被移除，不影响其他连接。
    /// 缓冲区已满的连接同时被驱逐，它的写循环不会再等待对端读取。
    fn fan_out(&mut self, broadcast: Broadcast) {
        let mut slow = Vec::new();
        let mut gone = Vec::new();

        for (id, member) in &self.members {
            if Some(*id) == broadcast.exclude {
                continue;
            }
            match member.send(broadcast.message.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => slow.push(*id),
                Err(TrySendError::Closed(_)) => gone.push(*id),
            }
        }

        for id in slow {
            if let Some(member) = self.members.remove(&id) {
                tracing::warn!(connection_id = %id, members = self.members.len(), "outbound buffer full, dropping slow connection");
                member.evict();
            }
        }
        for id in gone {
            self.members.remove(&id);
        }
    }
}

impl HubHandle {
    /// 新连接出站缓冲区的容量
    pub fn outbound_capacity(&self) -> usize {
        self.outbound_capacity
    }

    /// 注册连接，返回时 Hub 已将其加入成员集合。
    ///
    /// Hub 已停止时句柄被丢弃，连接的写循环会立即结束。
    pub async fn register(&self, handle: ConnectionHandle) {
        let id = handle.id();
        let (ack, acked) = oneshot::channel();
        if self
            .control_tx
            .send(Control::Register { handle, ack })
            .await
            .is_err()
            || acked.await.is_err()
        {
            tracing::warn!(connection_id = %id, "hub is not running, connection dropped");
        }
    }

    pub async fn unregister(&self, id: ConnectionId) {
        if self
            .control_tx
            .send(Control::Unregister { id })
            .await
            .is_err()
        {
            tracing::debug!(connection_id = %id, "hub is not running, unregister ignored");
        }
    }

    /// 广播给除 `exclude` 外的所有连接，发出即返回，投递结果不回传
    pub async fn broadcast(&self, message: impl Into<OutboundMessage>, exclude: Option<ConnectionId>) {
        let broadcast = Broadcast {
            message: message.into(),
            exclude,
        };
        if self.broadcast_tx.send(broadcast).await.is_err() {
            tracing::debug!("hub is not running, broadcast discarded");
        }
    }

    /// 当前在线连接数，Hub 已停止时为 0
    pub async fn connection_count(&self) -> usize {
        let (reply, count) = oneshot::channel();
        if self.control_tx.send(Control::Count { reply }).await.is_err() {
            return 0;
        }
        count.await.unwrap_or(0)
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

#[async_trait]
impl EventPublisher for HubHandle {
    async fn publish(&self, event: DomainEvent, exclude: Option<ConnectionId>) {
        match serde_json::to_string(&event.envelope()) {
            Ok(json) => self.broadcast(json, exclude).await,
            Err(err) => {
                tracing::warn!(error = %err, event = event.label(), "failed to serialize event");
            }
        }
    }
}
