//! JWT 认证和授权模块
//!
//! 提供 JWT token 生成、验证，以及把请求头解码为用户身份的提取器

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
};
use config::JwtConfig;
use domain::UserId;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// JWT Claims 结构
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub exp: i64, // 过期时间 (Unix timestamp)
}

/// JWT Token 服务
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_ref());
        let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 生成 JWT token
    pub fn generate_token(&self, user_id: UserId) -> Result<String, ApiError> {
        let exp = chrono::Utc::now() + chrono::Duration::hours(self.config.expiration_hours);

        let claims = Claims {
            user_id: user_id.into(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|err| {
            ApiError::internal_server_error(format!("Token generation failed: {}", err))
        })
    }

    /// 验证并解析 JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|token_data| token_data.claims)
            .map_err(|err| ApiError::unauthorized(format!("Invalid token: {}", err)))
    }

    /// 从 headers 中提取和验证 token，接受 `Bearer <jwt>` 或裸 token
    pub fn extract_user_from_headers(&self, headers: &HeaderMap) -> Result<UserId, ApiError> {
        let auth_header = headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .unwrap_or(auth_header)
            .trim();

        let claims = self.verify_token(token)?;
        Ok(UserId::from(claims.user_id))
    }
}

/// 已认证的调用者
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub UserId);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        state
            .jwt_service
            .extract_user_from_headers(&parts.headers)
            .map(AuthUser)
    }
}

/// 登录响应结构
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}
