#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use application::{
    Clock, EventPublisher, PasswordHasher, PostRepository, PostService, PostServiceDependencies,
    SystemClock, UserRepository, UserService, UserServiceDependencies,
};
use config::HubConfig;
use infrastructure::{
    BcryptPasswordHasher, Hub, HubHandle, InMemoryPostRepository, InMemoryUserRepository,
};
use reqwest::Client;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::oneshot, time::sleep};
use web_api::{router, AppState, JwtConfig, JwtService};

pub const TEST_SECRET: &str = "integration-test-secret-with-32-chars!";

/// 使用内存仓储启动的完整服务
pub struct TestApp {
    pub addr: SocketAddr,
    pub hub: HubHandle,
    pub client: Client,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(false).await
    }

    pub async fn spawn_with(require_socket_auth: bool) -> Self {
        Self::spawn_with_hub(HubConfig {
            require_auth: require_socket_auth,
            ..HubConfig::default()
        })
        .await
    }

    pub async fn spawn_with_hub(hub_config: HubConfig) -> Self {
        let require_socket_auth = hub_config.require_auth;
        let user_repository: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepository::new());
        let post_repository: Arc<dyn PostRepository> = Arc::new(InMemoryPostRepository::new());
        let password_hasher: Arc<dyn PasswordHasher> =
            Arc::new(BcryptPasswordHasher::new(Some(4)));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let (hub, hub_handle) = Hub::new(&hub_config);
        tokio::spawn(hub.run());

        let user_service = UserService::new(UserServiceDependencies {
            user_repository,
            password_hasher,
            clock: clock.clone(),
        });
        let post_service = PostService::new(PostServiceDependencies {
            post_repository,
            publisher: Arc::new(hub_handle.clone()) as Arc<dyn EventPublisher>,
            clock,
        });
        let jwt_service = Arc::new(JwtService::new(JwtConfig {
            secret: TEST_SECRET.to_string(),
            expiration_hours: 1,
        }));

        let state = AppState::new(
            Arc::new(user_service),
            Arc::new(post_service),
            jwt_service,
            hub_handle.clone(),
            require_socket_auth,
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let app = router(state);

        tokio::spawn(async move {
            axum::serve(listener, app.into_make_service())
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .ok();
        });

        // allow server to start
        sleep(Duration::from_millis(50)).await;

        Self {
            addr,
            hub: hub_handle,
            client: Client::new(),
            shutdown: Some(shutdown_tx),
        }
    }

    pub fn http(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws(&self, query: &str) -> String {
        format!("ws://{}/ws{}", self.addr, query)
    }

    /// 注册并登录，返回 (用户 id, token)
    pub async fn sign_up_and_login(&self, email: &str) -> (String, String) {
        let credentials = json!({ "email": email, "password": "secret-password" });

        let created: Value = self
            .client
            .post(self.http("/signup"))
            .json(&credentials)
            .send()
            .await
            .expect("signup")
            .json()
            .await
            .expect("signup json");
        let user_id = created["id"].as_str().expect("user id").to_string();

        let login: Value = self
            .client
            .post(self.http("/login"))
            .json(&credentials)
            .send()
            .await
            .expect("login")
            .json()
            .await
            .expect("login json");
        let token = login["token"].as_str().expect("token").to_string();

        (user_id, token)
    }

    /// 等待 Hub 中的在线连接数达到 `expected`
    pub async fn wait_for_connections(&self, expected: usize) {
        for _ in 0..50 {
            if self.hub.connection_count().await == expected {
                return;
            }
            sleep(Duration::from_millis(20)).await;
        }
        panic!(
            "expected {expected} connections, hub reports {}",
            self.hub.connection_count().await
        );
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        self.hub.shutdown();
    }
}
