//! 内存仓储实现
//!
//! 用于本地开发（`database.url = "memory://"`）和集成测试，进程退出即丢失数据。

use std::collections::HashMap;
use std::sync::Arc;

use application::{PostRepository, UserRepository};
use async_trait::async_trait;
use domain::{Post, PostId, RepositoryError, User, UserEmail, UserId};
use tokio::sync::RwLock;

/// 内存中的用户仓储
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let mut users = self.users.write().await;
        // 与数据库的唯一索引保持一致
        if users.values().any(|existing| existing.email == user.email) {
            return Err(RepositoryError::Conflict);
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &UserEmail) -> Result<Option<User>, RepositoryError> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| &user.email == email).cloned())
    }
}

/// 内存中的帖子仓储
#[derive(Clone, Default)]
pub struct InMemoryPostRepository {
    posts: Arc<RwLock<HashMap<PostId, Post>>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn create(&self, post: Post) -> Result<Post, RepositoryError> {
        let mut posts = self.posts.write().await;
        if posts.contains_key(&post.id) {
            return Err(RepositoryError::Conflict);
        }
        posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepositoryError> {
        Ok(self.posts.read().await.get(&id).cloned())
    }

    async fn update(&self, post: Post) -> Result<Post, RepositoryError> {
        let mut posts = self.posts.write().await;
        match posts.get_mut(&post.id) {
            Some(stored) if stored.user_id == post.user_id => {
                stored.post_content = post.post_content.clone();
                Ok(stored.clone())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }

    async fn delete(&self, id: PostId, author: UserId) -> Result<(), RepositoryError> {
        let mut posts = self.posts.write().await;
        match posts.get(&id) {
            Some(post) if post.user_id == author => {
                posts.remove(&id);
                Ok(())
            }
            _ => Err(RepositoryError::NotFound),
        }
    }

    async fn list_by_user(
        &self,
        author: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, RepositoryError> {
        let posts = self.posts.read().await;
        let mut owned: Vec<Post> = posts
            .values()
            .filter(|post| post.user_id == author)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let offset = usize::try_from(offset).unwrap_or(0);
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(owned.into_iter().skip(offset).take(limit).collect())
    }
}
