//! 密码哈希端口
//!
//! 用户服务只依赖这个 trait，具体算法与成本参数由基础设施层决定。

use async_trait::async_trait;
use domain::PasswordHash;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordHasherError {
    #[error("failed to hash password: {0}")]
    Hashing(String),
    #[error("stored password hash is unusable: {0}")]
    MalformedHash(String),
    #[error("password worker stopped: {0}")]
    Worker(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    /// 生成可直接入库的哈希
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHasherError>;

    /// 密码不匹配返回 `Ok(false)`，只有哈希本身无法解析时才返回错误
    async fn verify(
        &self,
        plaintext: &str,
        hashed: &PasswordHash,
    ) -> Result<bool, PasswordHasherError>;
}
