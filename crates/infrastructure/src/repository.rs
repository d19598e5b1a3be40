use application::{PostRepository, UserRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::{
    PasswordHash, Post, PostContent, PostId, RepositoryError, User, UserEmail, UserId,
};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool};
use uuid::Uuid;

const UNIQUE_VIOLATION: &str = "23505";

fn map_sqlx_err(err: sqlx::Error) -> RepositoryError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return RepositoryError::Conflict;
        }
    }
    match err {
        sqlx::Error::RowNotFound => RepositoryError::NotFound,
        other => RepositoryError::storage(other.to_string()),
    }
}

fn invalid_data(message: impl Into<String>) -> RepositoryError {
    RepositoryError::storage(message)
}

#[derive(Debug, FromRow)]
struct UserRecord {
    id: Uuid,
    email: String,
    password: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRecord> for User {
    type Error = RepositoryError;

    fn try_from(value: UserRecord) -> Result<Self, Self::Error> {
        let email = UserEmail::parse(value.email).map_err(|err| invalid_data(err.to_string()))?;
        let password =
            PasswordHash::new(value.password).map_err(|err| invalid_data(err.to_string()))?;

        Ok(User {
            id: UserId::from(value.id),
            email,
            password,
            created_at: value.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct PostRecord {
    id: Uuid,
    user_id: Uuid,
    post_content: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PostRecord> for Post {
    type Error = RepositoryError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        let content =
            PostContent::parse(value.post_content).map_err(|err| invalid_data(err.to_string()))?;

        Ok(Post {
            id: PostId::from(value.id),
            user_id: UserId::from(value.user_id),
            post_content: content,
            created_at: value.created_at,
        })
    }
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User) -> Result<User, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (id, email, password, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, password, created_at
            "#,
        )
        .bind(Uuid::from(user.id))
        .bind(user.email.as_str())
        .bind(user.password.as_str())
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        User::try_from(record)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"SELECT id, email, password, created_at FROM users WHERE id = $1"#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &UserEmail) -> Result<Option<User>, RepositoryError> {
        let record = sqlx::query_as::<_, UserRecord>(
            r#"SELECT id, email, password, created_at FROM users WHERE email = $1"#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(User::try_from).transpose()
    }
}

#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create(&self, post: Post) -> Result<Post, RepositoryError> {
        let record = sqlx::query_as::<_, PostRecord>(
            r#"
            INSERT INTO posts (id, user_id, post_content, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, post_content, created_at
            "#,
        )
        .bind(Uuid::from(post.id))
        .bind(Uuid::from(post.user_id))
        .bind(post.post_content.as_str())
        .bind(post.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Post::try_from(record)
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepositoryError> {
        let record = sqlx::query_as::<_, PostRecord>(
            r#"SELECT id, user_id, post_content, created_at FROM posts WHERE id = $1"#,
        )
        .bind(Uuid::from(id))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        record.map(Post::try_from).transpose()
    }

    async fn update(&self, post: Post) -> Result<Post, RepositoryError> {
        // 作者条件不匹配时没有返回行，映射为 NotFound
        let record = sqlx::query_as::<_, PostRecord>(
            r#"
            UPDATE posts
            SET post_content = $2
            WHERE id = $1 AND user_id = $3
            RETURNING id, user_id, post_content, created_at
            "#,
        )
        .bind(Uuid::from(post.id))
        .bind(post.post_content.as_str())
        .bind(Uuid::from(post.user_id))
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        Post::try_from(record)
    }

    async fn delete(&self, id: PostId, author: UserId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1 AND user_id = $2")
            .bind(Uuid::from(id))
            .bind(Uuid::from(author))
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_by_user(
        &self,
        author: UserId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, RepositoryError> {
        let records = sqlx::query_as::<_, PostRecord>(
            r#"
            SELECT id, user_id, post_content, created_at
            FROM posts
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(Uuid::from(author))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_err)?;

        records.into_iter().map(Post::try_from).collect()
    }
}

pub async fn create_pg_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}
