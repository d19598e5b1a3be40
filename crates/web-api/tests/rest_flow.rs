mod support;

use reqwest::StatusCode;
use serde_json::{json, Value};

use support::TestApp;

#[tokio::test]
async fn home_and_health_respond() {
    let app = TestApp::spawn().await;

    let home: Value = app
        .client
        .get(app.http("/"))
        .send()
        .await
        .expect("home")
        .json()
        .await
        .expect("home json");
    assert_eq!(home, json!({ "message": "Hello World", "status": true }));

    let health = app.client.get(app.http("/health")).send().await.expect("health");
    assert_eq!(health.status(), StatusCode::OK);
}

#[tokio::test]
async fn sign_up_rejects_duplicates_and_bad_input() {
    let app = TestApp::spawn().await;
    let credentials = json!({ "email": "dup@example.com", "password": "secret-password" });

    let first = app
        .client
        .post(app.http("/signup"))
        .json(&credentials)
        .send()
        .await
        .expect("signup");
    assert_eq!(first.status(), StatusCode::CREATED);
    let body: Value = first.json().await.expect("signup json");
    assert_eq!(body["email"], "dup@example.com");
    assert!(body["id"].is_string());
    assert!(body.get("password").is_none());

    let second = app
        .client
        .post(app.http("/signup"))
        .json(&credentials)
        .send()
        .await
        .expect("duplicate signup");
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let error: Value = second.json().await.expect("error json");
    assert_eq!(error["code"], "USER_EXISTS");

    let invalid = app
        .client
        .post(app.http("/signup"))
        .json(&json!({ "email": "not-an-email", "password": "secret-password" }))
        .send()
        .await
        .expect("invalid signup");
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = TestApp::spawn().await;
    app.sign_up_and_login("login@example.com").await;

    for credentials in [
        json!({ "email": "login@example.com", "password": "wrong" }),
        json!({ "email": "nobody@example.com", "password": "secret-password" }),
    ] {
        let response = app
            .client
            .post(app.http("/login"))
            .json(&credentials)
            .send()
            .await
            .expect("login");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let error: Value = response.json().await.expect("error json");
        assert_eq!(error["message"], "Invalid Credentials");
    }
}

#[tokio::test]
async fn protected_routes_require_token() {
    let app = TestApp::spawn().await;

    let me = app.client.get(app.http("/api/v1/me")).send().await.expect("me");
    assert_eq!(me.status(), StatusCode::UNAUTHORIZED);

    let list = app
        .client
        .get(app.http("/posts"))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .expect("list");
    assert_eq!(list.status(), StatusCode::UNAUTHORIZED);

    let create = app
        .client
        .post(app.http("/api/v1/posts"))
        .json(&json!({ "postContent": "anonymous" }))
        .send()
        .await
        .expect("create");
    assert_eq!(create.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_current_user() {
    let app = TestApp::spawn().await;
    let (user_id, token) = app.sign_up_and_login("me@example.com").await;

    let me: Value = app
        .client
        .get(app.http("/api/v1/me"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("me")
        .json()
        .await
        .expect("me json");

    assert_eq!(me["id"], user_id.as_str());
    assert_eq!(me["email"], "me@example.com");
    assert!(me.get("password").is_none());
}

#[tokio::test]
async fn post_lifecycle_enforces_ownership() {
    let app = TestApp::spawn().await;
    let (owner_id, owner_token) = app.sign_up_and_login("owner@example.com").await;
    let (_, other_token) = app.sign_up_and_login("other@example.com").await;

    let created: Value = app
        .client
        .post(app.http("/api/v1/posts"))
        .bearer_auth(&owner_token)
        .json(&json!({ "postContent": "first draft" }))
        .send()
        .await
        .expect("create")
        .json()
        .await
        .expect("create json");
    let post_id = created["id"].as_str().expect("post id").to_string();
    assert_eq!(created["postContent"], "first draft");

    let fetched: Value = app
        .client
        .get(app.http(&format!("/posts/{post_id}")))
        .send()
        .await
        .expect("get")
        .json()
        .await
        .expect("get json");
    assert_eq!(fetched["userId"], owner_id.as_str());
    assert_eq!(fetched["postContent"], "first draft");

    let forbidden = app
        .client
        .put(app.http(&format!("/api/v1/posts/{post_id}")))
        .bearer_auth(&other_token)
        .json(&json!({ "postContent": "hijacked" }))
        .send()
        .await
        .expect("foreign update");
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let updated: Value = app
        .client
        .put(app.http(&format!("/api/v1/posts/{post_id}")))
        .bearer_auth(&owner_token)
        .json(&json!({ "postContent": "final version" }))
        .send()
        .await
        .expect("update")
        .json()
        .await
        .expect("update json");
    assert_eq!(updated["postContent"], "final version");

    let forbidden = app
        .client
        .delete(app.http(&format!("/api/v1/posts/{post_id}")))
        .bearer_auth(&other_token)
        .send()
        .await
        .expect("foreign delete");
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let deleted = app
        .client
        .delete(app.http(&format!("/api/v1/posts/{post_id}")))
        .bearer_auth(&owner_token)
        .send()
        .await
        .expect("delete");
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let missing = app
        .client
        .get(app.http(&format!("/posts/{post_id}")))
        .send()
        .await
        .expect("get deleted");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_post_content_is_rejected() {
    let app = TestApp::spawn().await;
    let (_, token) = app.sign_up_and_login("empty@example.com").await;

    let response = app
        .client
        .post(app.http("/api/v1/posts"))
        .bearer_auth(&token)
        .json(&json!({ "postContent": "   " }))
        .send()
        .await
        .expect("create");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn posts_are_listed_ten_per_page_for_their_author() {
    let app = TestApp::spawn().await;
    let (_, token) = app.sign_up_and_login("pager@example.com").await;
    let (_, other_token) = app.sign_up_and_login("quiet@example.com").await;

    for i in 0..12 {
        let response = app
            .client
            .post(app.http("/api/v1/posts"))
            .bearer_auth(&token)
            .json(&json!({ "postContent": format!("post {i}") }))
            .send()
            .await
            .expect("create");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let list = |page: &'static str, token: String| {
        let client = app.client.clone();
        let url = app.http(&format!("/posts{page}"));
        async move {
            client
                .get(url)
                .bearer_auth(token)
                .send()
                .await
                .expect("list")
                .json::<Vec<Value>>()
                .await
                .expect("list json")
        }
    };

    assert_eq!(list("", token.clone()).await.len(), 10);
    assert_eq!(list("?page=1", token.clone()).await.len(), 10);
    assert_eq!(list("?page=2", token.clone()).await.len(), 2);
    assert!(list("?page=3", token.clone()).await.is_empty());
    assert!(list("", other_token).await.is_empty());
}
