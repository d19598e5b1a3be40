use std::sync::Arc;

use application::{PostService, UserService};
use infrastructure::HubHandle;

use crate::JwtService;

#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub post_service: Arc<PostService>,
    pub jwt_service: Arc<JwtService>,
    pub hub: HubHandle,
    /// 升级 WebSocket 时是否校验 `?token=`
    pub require_socket_auth: bool,
}

impl AppState {
    pub fn new(
        user_service: Arc<UserService>,
        post_service: Arc<PostService>,
        jwt_service: Arc<JwtService>,
        hub: HubHandle,
        require_socket_auth: bool,
    ) -> Self {
        Self {
            user_service,
            post_service,
            jwt_service,
            hub,
            require_socket_auth,
        }
    }
}
