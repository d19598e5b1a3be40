//! Web API 层。
//!
//! 提供 Axum 路由，将 HTTP 请求委托给应用层的用例服务，
//! 并把升级后的 WebSocket 连接交给连接中心。

mod auth;
mod error;
mod routes;
mod state;
mod ws_connection;

pub use auth::{AuthUser, Claims, JwtService, LoginResponse};
pub use config::JwtConfig;
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
pub use ws_connection::CONNECTION_ID_HEADER;
