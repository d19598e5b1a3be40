use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use application::ConnectionId;
use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::HubHandle;

/// 关闭对端可能已不再读取的传输层时最多等待的时间
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// 一条出站消息对应一次独立的写操作，广播时所有连接共享同一份序列化结果。
pub type OutboundMessage = Arc<str>;

#[derive(Debug, Error)]
#[error("transport error: {0}")]
pub struct TransportError(String);

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// 底层双向 socket 的写半部分
#[async_trait]
pub trait Transport: Send {
    async fn send_text(&mut self, text: &str) -> Result<(), TransportError>;

    /// 向对端发送关闭帧并关闭写端
    async fn close(&mut self) -> Result<(), TransportError>;

    /// 把底层协议自动排队的帧（例如关闭握手的回应）写出去
    async fn flush(&mut self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// 读端关心的入站帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// 对端主动关闭
    Close,
    /// 任意应用数据或控制帧，推送协议下被忽略
    Other,
}

/// Hub 持有的连接视图：只有出站缓冲区的发送端。
///
/// 它是缓冲区唯一的发送端，被 Hub 丢弃即关闭缓冲区，写循环随之退出。
#[derive(Debug)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: mpsc::Sender<OutboundMessage>,
    teardown: CancellationToken,
}

impl ConnectionHandle {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// 非阻塞入队。缓冲区已满或已关闭都返回错误，由 Hub 决定移除连接。
    pub(crate) fn send(
        &self,
        message: OutboundMessage,
    ) -> Result<(), mpsc::error::TrySendError<OutboundMessage>> {
        self.outbound.try_send(message)
    }

    /// Hub 因缓冲区写满移除连接时调用：写循环放弃排队中的消息并立即关闭传输层
    pub(crate) fn evict(&self) {
        self.teardown.cancel();
    }
}

/// 单条 socket 连接：出站缓冲区的接收端加上专属写循环
pub struct Connection {
    id: ConnectionId,
    outbound: mpsc::Receiver<OutboundMessage>,
    open: Arc<AtomicBool>,
    teardown: CancellationToken,
    hub: HubHandle,
}

impl Connection {
    /// 创建连接及其 Hub 侧句柄，缓冲区容量为 `capacity`
    pub fn open(id: ConnectionId, hub: HubHandle, capacity: usize) -> (Self, ConnectionHandle) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let teardown = CancellationToken::new();
        let connection = Self {
            id,
            outbound: rx,
            open: Arc::new(AtomicBool::new(true)),
            teardown: teardown.clone(),
            hub,
        };
        let handle = ConnectionHandle {
            id,
            outbound: tx,
            teardown,
        };
        (connection, handle)
    }

    /// 读端监视器，与写循环共享传输层存活标记
    pub fn monitor(&self) -> ConnectionMonitor {
        ConnectionMonitor {
            id: self.id,
            open: self.open.clone(),
            teardown: self.teardown.clone(),
            hub: self.hub.clone(),
        }
    }

    /// 写循环：按入队顺序逐条写出。
    ///
    /// - 写失败：关闭传输层，请求注销，退出。
    /// - 缓冲区被关闭（已注销）：写完已入队的消息，传输层仍存活时发送关闭帧，退出。
    /// - 被 Hub 驱逐：中断正在进行的写，丢弃排队消息，发送关闭帧，退出。
    /// - 对端已离开：不再写任何消息，只冲刷协议层待发的帧，退出。
    ///
    /// 传输层只归写循环所有，存活标记保证它最多被关闭一次。
    pub async fn run_writer<T: Transport>(mut self, mut transport: T) {
        loop {
            let message = tokio::select! {
                biased;
                _ = self.teardown.cancelled() => break,
                message = self.outbound.recv() => match message {
                    Some(message) => message,
                    None => break,
                },
            };
            if !self.open.load(Ordering::SeqCst) {
                break;
            }

            let written = tokio::select! {
                biased;
                _ = self.teardown.cancelled() => break,
                written = transport.send_text(&message) => written,
            };

            if let Err(err) = written {
                if self.open.swap(false, Ordering::SeqCst) {
                    tracing::warn!(connection_id = %self.id, error = %err, "write failed, dropping connection");
                    self.close_transport(&mut transport).await;
                }
                self.hub.unregister(self.id).await;
                return;
            }
        }

        if self.open.swap(false, Ordering::SeqCst) {
            self.close_transport(&mut transport).await;
        } else {
            match tokio::time::timeout(CLOSE_TIMEOUT, transport.flush()).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::debug!(connection_id = %self.id, error = %err, "flush after peer close failed");
                }
                Err(_) => {
                    tracing::debug!(connection_id = %self.id, "flush after peer close timed out");
                }
            }
        }
        tracing::debug!(connection_id = %self.id, "writer loop finished");
    }

    async fn close_transport<T: Transport>(&self, transport: &mut T) {
        match tokio::time::timeout(CLOSE_TIMEOUT, transport.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tracing::debug!(connection_id = %self.id, error = %err, "failed to send close frame");
            }
            Err(_) => {
                tracing::debug!(connection_id = %self.id, "peer did not accept close frame in time");
            }
        }
    }
}

/// 连接的读端：推送协议下不处理入站数据，只检测对端关闭或传输错误
#[derive(Clone)]
pub struct ConnectionMonitor {
    id: ConnectionId,
    open: Arc<AtomicBool>,
    teardown: CancellationToken,
    hub: HubHandle,
}

impl ConnectionMonitor {
    /// 消费入站帧直到对端关闭、出错或流结束，然后请求注销
    pub async fn watch<S, E>(self, mut inbound: S)
    where
        S: Stream<Item = Result<Inbound, E>> + Unpin,
        E: std::fmt::Display,
    {
        while let Some(frame) = inbound.next().await {
            match frame {
                Ok(Inbound::Close) => {
                    tracing::debug!(connection_id = %self.id, "peer closed connection");
                    break;
                }
                Ok(Inbound::Other) => {}
                Err(err) => {
                    tracing::debug!(connection_id = %self.id, error = %err, "read failed");
                    break;
                }
            }
        }
        self.peer_gone().await;
    }

    /// 标记传输层已失效，停止写循环并请求注销，重复调用只是无害的空操作
    pub async fn peer_gone(&self) {
        self.open.store(false, Ordering::SeqCst);
        self.teardown.cancel();
        self.hub.unregister(self.id).await;
    }
}
