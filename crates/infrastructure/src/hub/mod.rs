//! 实时推送连接中心
//!
//! - [`Hub`]：唯一持有在线连接集合的 actor，所有注册、注销、广播都经由它的消息通道串行处理，
//!   成员集合因此不需要锁。
//! - [`HubHandle`]：可克隆的发送端，供升级端点、连接和应用层使用。
//! - [`Connection`]：单条 socket 的出站缓冲区与写循环。
//! - [`ConnectionMonitor`]：读端，检测对端关闭后请求注销。
//!
//! 与广播并发进行的注册可能收到也可能收不到这条广播，这是尽力而为投递可接受的竞争。

mod connection;
mod registry;

pub use connection::{
    Connection, ConnectionHandle, ConnectionMonitor, Inbound, OutboundMessage, Transport,
    TransportError,
};
pub use registry::{Hub, HubHandle};
