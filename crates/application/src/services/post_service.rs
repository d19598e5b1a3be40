use std::sync::Arc;

use domain::{DomainError, DomainEvent, Post, PostContent, PostId, UserId};
use uuid::Uuid;

use crate::{
    clock::Clock,
    error::ApplicationError,
    publisher::{ConnectionId, EventPublisher},
    repository::PostRepository,
};

pub const POSTS_PER_PAGE: i64 = 10;

pub struct PostServiceDependencies {
    pub post_repository: Arc<dyn PostRepository>,
    pub publisher: Arc<dyn EventPublisher>,
    pub clock: Arc<dyn Clock>,
}

pub struct PostService {
    deps: PostServiceDependencies,
}

impl PostService {
    pub fn new(deps: PostServiceDependencies) -> Self {
        Self { deps }
    }

    /// 保存帖子后通知所有在线连接，`origin` 为发起请求的连接
    pub async fn create_post(
        &self,
        author: UserId,
        content: String,
        origin: Option<ConnectionId>,
    ) -> Result<Post, ApplicationError> {
        let content = PostContent::parse(content)?;
        let post = Post::new(
            PostId::from(Uuid::new_v4()),
            author,
            content,
            self.deps.clock.now(),
        );

        let stored = self.deps.post_repository.create(post).await?;
        tracing::debug!(post_id = %stored.id, user_id = %author, "post created");

        self.deps
            .publisher
            .publish(DomainEvent::PostCreated(stored.clone()), origin)
            .await;

        Ok(stored)
    }

    pub async fn get_post(&self, id: PostId) -> Result<Post, ApplicationError> {
        self.deps
            .post_repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::PostNotFound.into())
    }

    pub async fn update_post(
        &self,
        author: UserId,
        id: PostId,
        content: String,
    ) -> Result<Post, ApplicationError> {
        let content = PostContent::parse(content)?;
        let mut post = self.owned_post(author, id).await?;
        post.edit(content);

        let stored = self.deps.post_repository.update(post).await?;
        Ok(stored)
    }

    pub async fn delete_post(&self, author: UserId, id: PostId) -> Result<(), ApplicationError> {
        let post = self.owned_post(author, id).await?;
        self.deps.post_repository.delete(post.id, author).await?;
        Ok(())
    }

    /// 分页列出作者自己的帖子，页码从 1 开始，0 视为第一页
    pub async fn list_posts(&self, author: UserId, page: u64) -> Result<Vec<Post>, ApplicationError> {
        let page = page.max(1);
        let offset = i64::try_from(page - 1)
            .ok()
            .and_then(|p| p.checked_mul(POSTS_PER_PAGE))
            .ok_or_else(|| DomainError::invalid_argument("page", "out of range"))?;

        let posts = self
            .deps
            .post_repository
            .list_by_user(author, POSTS_PER_PAGE, offset)
            .await?;
        Ok(posts)
    }

    async fn owned_post(&self, author: UserId, id: PostId) -> Result<Post, ApplicationError> {
        let post = self.get_post(id).await?;
        if !post.is_owned_by(author) {
            return Err(DomainError::NotPostOwner.into());
        }
        Ok(post)
    }
}
