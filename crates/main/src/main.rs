//! 主应用程序入口
//!
//! 加载配置，组装仓储、服务和连接中心，然后启动 Axum Web API 服务。

use std::sync::Arc;

use application::{
    Clock, EventPublisher, PasswordHasher, PostRepository, PostService, PostServiceDependencies,
    SystemClock, UserRepository, UserService, UserServiceDependencies,
};
use config::AppConfig;
use infrastructure::{
    create_pg_pool, BcryptPasswordHasher, Hub, InMemoryPostRepository, InMemoryUserRepository,
    PgPostRepository, PgUserRepository,
};
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    config.validate()?;

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let (user_repository, post_repository) = build_repositories(&config).await?;

    let password_hasher: Arc<dyn PasswordHasher> =
        Arc::new(BcryptPasswordHasher::new(config.server.bcrypt_cost));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // 连接中心独立运行，服务通过句柄发布事件
    let (hub, hub_handle) = Hub::new(&config.hub);
    let hub_task = tokio::spawn(hub.run());

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

    let jwt_service = Arc::new(JwtService::new(config.jwt.clone()));

    let state = AppState::new(
        Arc::new(user_service),
        Arc::new(post_service),
        jwt_service,
        hub_handle.clone(),
        config.hub.require_auth,
    );

    // 启动 Web 服务器
    let app = router(state);
    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;

    tracing::info!("帖子服务启动在 http://{}", address);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for shutdown signal");
            }
            tracing::info!("收到关闭信号，停止连接中心");
            hub_handle.shutdown();
        })
        .await?;

    hub_task.await?;
    tracing::info!("服务已停止");
    Ok(())
}

/// `memory://` 使用进程内仓储，其余地址连接 PostgreSQL 并执行迁移
async fn build_repositories(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn UserRepository>, Arc<dyn PostRepository>)> {
    if config.database.url.starts_with("memory:") {
        tracing::warn!("使用内存仓储，数据不会持久化");
        return Ok((
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryPostRepository::new()),
        ));
    }

    tracing::info!(
        "连接数据库: {}",
        config.database.url.split('@').next_back().unwrap_or("unknown")
    );
    let pg_pool = create_pg_pool(&config.database.url, config.database.max_connections).await?;

    // 运行迁移
    sqlx::migrate!("../../migrations").run(&pg_pool).await?;

    Ok((
        Arc::new(PgUserRepository::new(pg_pool.clone())),
        Arc::new(PgPostRepository::new(pg_pool)),
    ))
}
