use async_trait::async_trait;
use domain::{Post, PostId, RepositoryError, User, UserEmail, UserId};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: User) -> Result<User, RepositoryError>;
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;
    async fn find_by_email(&self, email: &UserEmail) -> Result<Option<User>, RepositoryError>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: Post) -> Result<Post, RepositoryError>;
    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepositoryError>;
    async fn update(&self, post: Post) -> Result<Post, RepositoryError>;
    async fn delete(&self, id: PostId, author: UserId) -> Result<(), RepositoryError>;

    // 按创建时间倒序
    async fn list_by_user(
        &self,
        author: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, RepositoryError>;
}
