//! WebSocket 升级端点
//!
//! 每条升级成功的 socket 被拆成两半：写半部分交给连接的写循环，
//! 读半部分只用来发现对端关闭。客户端发来的数据一律忽略。

use async_trait::async_trait;
use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{HeaderName, HeaderValue},
    response::Response,
};
use futures_util::{stream::SplitSink, SinkExt, StreamExt};
use serde::Deserialize;

use application::ConnectionId;
use infrastructure::{Connection, HubHandle, Inbound, Transport, TransportError};

use crate::{error::ApiError, state::AppState};

/// 升级响应里携带的连接标识，客户端创建帖子时回传它以跳过自己
pub const CONNECTION_ID_HEADER: &str = "x-connection-id";

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

pub async fn websocket_upgrade(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    if state.require_socket_auth {
        let token = query
            .token
            .as_deref()
            .ok_or_else(|| ApiError::unauthorized("Missing token"))?;
        let claims = state.jwt_service.verify_token(token)?;
        tracing::debug!(user_id = %claims.user_id, "websocket token accepted");
    }

    let connection_id = ConnectionId::generate();
    let header_value = HeaderValue::from_str(&connection_id.to_string())
        .map_err(|err| ApiError::internal_server_error(err.to_string()))?;

    let hub = state.hub.clone();
    let mut response = ws.on_upgrade(move |socket| serve_socket(socket, hub, connection_id));
    response
        .headers_mut()
        .insert(HeaderName::from_static(CONNECTION_ID_HEADER), header_value);
    Ok(response)
}

async fn serve_socket(socket: WebSocket, hub: HubHandle, connection_id: ConnectionId) {
    let (sender, incoming) = socket.split();

    let (connection, handle) = Connection::open(connection_id, hub.clone(), hub.outbound_capacity());
    let monitor = connection.monitor();

    // 先完成注册，之后的广播都能送达这条连接
    hub.register(handle).await;
    tracing::info!(connection_id = %connection_id, "WebSocket 连接已建立");

    let mut writer = tokio::spawn(connection.run_writer(WsTransport { sink: sender }));

    let inbound = incoming.map(|frame| {
        frame.map(|message| match message {
            WsMessage::Close(_) => Inbound::Close,
            _ => Inbound::Other,
        })
    });

    // 任意一端先结束都意味着连接已注销；读端先结束时等待写循环冲刷关闭握手后收尾
    let writer_result = tokio::select! {
        _ = monitor.watch(inbound) => None,
        result = &mut writer => Some(result),
    };
    let writer_result = match writer_result {
        Some(result) => result,
        None => writer.await,
    };
    if let Err(err) = writer_result {
        tracing::warn!(connection_id = %connection_id, error = %err, "writer task failed");
    }

    tracing::info!(connection_id = %connection_id, "WebSocket 连接已断开");
}

/// axum socket 写半部分上的传输层
struct WsTransport {
    sink: SplitSink<WebSocket, WsMessage>,
}

#[async_trait]
impl Transport for WsTransport {
    async fn send_text(&mut self, text: &str) -> Result<(), TransportError> {
        self.sink
            .send(WsMessage::Text(text.into()))
            .await
            .map_err(|err| TransportError::new(err.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.sink
            .close()
            .await
            .map_err(|err| TransportError::new(err.to_string()))
    }

    // 对端关闭后回应的关闭帧由协议层排队，需要显式写出
    async fn flush(&mut self) -> Result<(), TransportError> {
        self.sink
            .flush()
            .await
            .map_err(|err| TransportError::new(err.to_string()))
    }
}
