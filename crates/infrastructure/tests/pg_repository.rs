use application::{PasswordHasher, PostRepository, UserRepository};
use domain::{Post, PostContent, PostId, RepositoryError, User, UserEmail, UserId};
use infrastructure::{create_pg_pool, BcryptPasswordHasher, PgPostRepository, PgUserRepository};
use uuid::Uuid;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "requires a running postgres reachable through DATABASE_URL"]
async fn postgres_repository_round_trip() {
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
    let pool = create_pg_pool(&database_url, 5).await.expect("pool");
    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("migrations");

    let users = PgUserRepository::new(pool.clone());
    let posts = PgPostRepository::new(pool);
    let hasher = BcryptPasswordHasher::new(Some(4));
    let now = chrono::Utc::now();

    let email = UserEmail::parse(format!("pg-{}@example.com", Uuid::new_v4())).expect("email");
    let user = User::register(
        UserId::from(Uuid::new_v4()),
        email.clone(),
        hasher.hash("secret-password").await.expect("hash"),
        now,
    );
    let stored_user = users.create(user.clone()).await.expect("store user");

    let fetched = users
        .find_by_email(&email)
        .await
        .expect("fetch user")
        .expect("user exists");
    assert_eq!(fetched.id, stored_user.id);

    let duplicate = User::register(
        UserId::from(Uuid::new_v4()),
        email,
        user.password.clone(),
        now,
    );
    assert!(matches!(
        users.create(duplicate).await,
        Err(RepositoryError::Conflict)
    ));

    for i in 0..3 {
        let post = Post::new(
            PostId::from(Uuid::new_v4()),
            stored_user.id,
            PostContent::parse(format!("post {i}")).expect("content"),
            now + chrono::Duration::seconds(i),
        );
        posts.create(post).await.expect("store post");
    }

    let page = posts
        .list_by_user(stored_user.id, 2, 0)
        .await
        .expect("list posts");
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].post_content.as_str(), "post 2");

    let mut newest = page[0].clone();
    newest.edit(PostContent::parse("edited").expect("content"));
    let updated = posts.update(newest.clone()).await.expect("update post");
    assert_eq!(updated.post_content.as_str(), "edited");

    posts
        .delete(newest.id, stored_user.id)
        .await
        .expect("delete post");
    assert!(posts.find_by_id(newest.id).await.expect("find").is_none());
    assert!(matches!(
        posts.delete(newest.id, stored_user.id).await,
        Err(RepositoryError::NotFound)
    ));
}
