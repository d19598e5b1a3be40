use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use application::{ConnectionId, SignUpRequest};
use domain::{Post, PostId, User, UserId};

use crate::{
    auth::{AuthUser, LoginResponse},
    error::ApiError,
    state::AppState,
    ws_connection::{websocket_upgrade, CONNECTION_ID_HEADER},
};

#[derive(Debug, Deserialize)]
struct CredentialsPayload {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PostPayload {
    post_content: String,
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    page: Option<u64>,
}

#[derive(Debug, Serialize)]
struct HomeResponse {
    message: &'static str,
    status: bool,
}

#[derive(Debug, Serialize)]
struct SignUpResponse {
    id: UserId,
    email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PostResponse {
    id: PostId,
    post_content: String,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            post_content: post.post_content.into_inner(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/signup", post(sign_up))
        .route("/login", post(login))
        .route("/posts", get(list_posts))
        .route("/posts/{post_id}", get(get_post))
        .route("/ws", get(websocket_upgrade))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(current_user))
        .route("/posts", post(create_post))
        .route("/posts/{post_id}", put(update_post).delete(delete_post))
}

async fn home() -> Json<HomeResponse> {
    Json(HomeResponse {
        message: "Hello World",
        status: true,
    })
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsPayload>,
) -> Result<(StatusCode, Json<SignUpResponse>), ApiError> {
    let user = state
        .user_service
        .sign_up(SignUpRequest {
            email: payload.email,
            password: payload.password,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            id: user.id,
            email: user.email.to_string(),
        }),
    ))
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<CredentialsPayload>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = state
        .user_service
        .authenticate(payload.email, payload.password)
        .await?;

    let token = state.jwt_service.generate_token(user.id)?;
    tracing::info!(user_id = %user.id, "用户登录成功");
    Ok(Json(LoginResponse { token }))
}

async fn current_user(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<User>, ApiError> {
    let user = state.user_service.find_user(user_id).await?;
    Ok(Json(user))
}

async fn get_post(
    State(state): State<AppState>,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Post>, ApiError> {
    let post = state.post_service.get_post(PostId::from(post_id)).await?;
    Ok(Json(post))
}

async fn list_posts(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Post>>, ApiError> {
    let posts = state
        .post_service
        .list_posts(user_id, query.page.unwrap_or(1))
        .await?;
    Ok(Json(posts))
}

async fn create_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    headers: HeaderMap,
    Json(payload): Json<PostPayload>,
) -> Result<(StatusCode, Json<PostResponse>), ApiError> {
    let origin = origin_connection(&headers)?;
    let post = state
        .post_service
        .create_post(user_id, payload.post_content, origin)
        .await?;

    Ok((StatusCode::CREATED, Json(post.into())))
}

async fn update_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<Uuid>,
    Json(payload): Json<PostPayload>,
) -> Result<Json<PostResponse>, ApiError> {
    let post = state
        .post_service
        .update_post(user_id, PostId::from(post_id), payload.post_content)
        .await?;
    Ok(Json(post.into()))
}

async fn delete_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .post_service
        .delete_post(user_id, PostId::from(post_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// 发起请求的 socket 连接，广播时跳过它
fn origin_connection(headers: &HeaderMap) -> Result<Option<ConnectionId>, ApiError> {
    let Some(value) = headers.get(CONNECTION_ID_HEADER) else {
        return Ok(None);
    };

    value
        .to_str()
        .ok()
        .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
        .map(|id| Some(ConnectionId::from(id)))
        .ok_or_else(|| ApiError::bad_request("invalid x-connection-id header"))
}
