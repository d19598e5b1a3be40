use application::{PasswordHasher, PasswordHasherError};
use async_trait::async_trait;
use bcrypt::DEFAULT_COST;
use domain::PasswordHash;

/// bcrypt 实现，计算放在阻塞线程池里，不占用异步工作线程
#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordHasher {
    cost: u32,
}

impl BcryptPasswordHasher {
    /// `cost` 缺省时使用 bcrypt 的默认成本
    pub fn new(cost: Option<u32>) -> Self {
        Self {
            cost: cost.unwrap_or(DEFAULT_COST),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptPasswordHasher {
    fn default() -> Self {
        Self::new(None)
    }
}

async fn run_blocking<T, F>(job: F) -> Result<T, PasswordHasherError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|err| PasswordHasherError::Worker(err.to_string()))
}

#[async_trait]
impl PasswordHasher for BcryptPasswordHasher {
    async fn hash(&self, plaintext: &str) -> Result<PasswordHash, PasswordHasherError> {
        let cost = self.cost;
        let plaintext = plaintext.to_owned();
        let hashed = run_blocking(move || bcrypt::hash(plaintext, cost))
            .await?
            .map_err(|err| PasswordHasherError::Hashing(err.to_string()))?;

        PasswordHash::new(hashed).map_err(|err| PasswordHasherError::Hashing(err.to_string()))
    }

    async fn verify(
        &self,
        plaintext: &str,
        hashed: &PasswordHash,
    ) -> Result<bool, PasswordHasherError> {
        let plaintext = plaintext.to_owned();
        let hashed = hashed.as_str().to_owned();
        run_blocking(move || bcrypt::verify(plaintext, &hashed))
            .await?
            .map_err(|err| PasswordHasherError::MalformedHash(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // bcrypt 允许的最低成本
    fn hasher() -> BcryptPasswordHasher {
        BcryptPasswordHasher::new(Some(4))
    }

    #[tokio::test]
    async fn hash_then_verify() {
        let hasher = hasher();

        let hashed = hasher.hash("secret").await.unwrap();

        assert_ne!(hashed.as_str(), "secret");
        assert!(hashed.as_str().starts_with("$2"));
        assert!(hasher.verify("secret", &hashed).await.unwrap());
        assert!(!hasher.verify("wrong", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn unparsable_stored_hash_is_an_error() {
        let stored = PasswordHash::new("not-a-bcrypt-hash").unwrap();

        let result = hasher().verify("secret", &stored).await;

        assert!(matches!(result, Err(PasswordHasherError::MalformedHash(_))));
    }

    #[test]
    fn default_uses_bcrypt_default_cost() {
        assert_eq!(BcryptPasswordHasher::default().cost(), DEFAULT_COST);
        assert_eq!(hasher().cost(), 4);
    }
}
