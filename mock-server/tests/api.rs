use axum::http::{self, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use mock_server::{app, app_with_tools, router, AppState, Credentials, Post, Tool, ToolPost};
use serde_json::Value;
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn request(method: &str, uri: &str, token: Option<&str>, body: &str) -> Request<String> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(http::header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(body.to_string()).unwrap()
}

fn tool(id: i64, name: &str, hide: bool) -> Tool {
    Tool {
        id,
        name: name.to_string(),
        url: format!("https://{name}.example"),
        logo: String::new(),
        desc: String::new(),
        catelog: "dev".to_string(),
        content: String::new(),
        sort: 0,
        hide,
    }
}

async fn login(app: &Router) -> String {
    let resp = app
        .clone()
        .oneshot(request(
            "POST",
            "/api/login",
            None,
            r#"{"name":"admin","password":"admin"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["success"], true);
    body["data"]["token"].as_str().unwrap().to_string()
}

// --- auth ---

#[tokio::test]
async fn login_with_wrong_password_reports_failure() {
    let resp = app()
        .oneshot(request(
            "POST",
            "/api/login",
            None,
            r#"{"name":"admin","password":"nope"}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["errorMessage"], "wrong password");
}

#[tokio::test]
async fn login_honours_configured_credentials() {
    let creds = Credentials {
        name: "root".to_string(),
        password: "s3cret".to_string(),
    };
    let app = router(AppState::new(creds, Vec::new()));
    let resp = app
        .oneshot(request(
            "POST",
            "/api/login",
            None,
            r#"{"name":"root","password":"s3cret"}"#,
        ))
        .await
        .unwrap();
    let body: Value = body_json(resp).await;
    assert_eq!(body["data"]["user"]["name"], "root");
}

#[tokio::test]
async fn admin_routes_require_bearer_token() {
    let app = app();
    let resp = app
        .clone()
        .oneshot(request("GET", "/api/admin/posts", None, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app
        .oneshot(request("GET", "/api/admin/posts", Some("made-up"), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_revokes_token() {
    let app = app();
    let token = login(&app).await;

    let resp = app
        .clone()
        .oneshot(request("POST", "/api/logout", Some(&token), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(request("GET", "/api/admin/posts", Some(&token), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_sessions_are_rejected() {
    let state = AppState::new(Credentials::default(), Vec::new());
    let app = router(state.clone());
    let token = login(&app).await;

    state.expire_sessions().await;

    let resp = app
        .oneshot(request("GET", "/api/admin/posts", Some(&token), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

// --- ping ---

#[tokio::test]
async fn ping_is_plain_text() {
    let resp = app()
        .oneshot(request("GET", "/api/ping", None, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let content_type = resp.headers()[http::header::CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("text/plain"));
    assert_eq!(body_bytes(resp).await.as_ref(), b"ok");
}

#[tokio::test]
async fn echo_returns_delete_body() {
    let resp = app()
        .oneshot(request("DELETE", "/api/echo", None, r#"{"reason":"spam"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_bytes(resp).await.as_ref(), br#"{"reason":"spam"}"#);
}

// --- tools ---

#[tokio::test]
async fn get_tool_returns_envelope() {
    let resp = app_with_tools(vec![tool(42, "demo", false)])
        .oneshot(request("GET", "/api/tools/42", None, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "demo");
}

#[tokio::test]
async fn get_tool_not_found() {
    let resp = app()
        .oneshot(request("GET", "/api/tools/7", None, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn get_tool_bad_id_returns_400() {
    let resp = app()
        .oneshot(request("GET", "/api/tools/not-a-number", None, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn hidden_tool_needs_session() {
    let app = app_with_tools(vec![tool(1, "secret", true)]);
    let resp = app
        .clone()
        .oneshot(request("GET", "/api/tools/1", None, ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let token = login(&app).await;
    let resp = app
        .oneshot(request("GET", "/api/tools/1", Some(&token), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn update_tool_applies_partial_fields() {
    let app = app_with_tools(vec![tool(3, "old", false)]);
    let token = login(&app).await;

    let resp = app
        .clone()
        .oneshot(request(
            "PUT",
            "/api/tools/3",
            Some(&token),
            r#"{"content":"new body"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .oneshot(request("GET", "/api/tools/3", None, ""))
        .await
        .unwrap();
    let body: Value = body_json(resp).await;
    assert_eq!(body["data"]["content"], "new body");
    assert_eq!(body["data"]["name"], "old");
}

#[tokio::test]
async fn tool_post_defaults_then_persists() {
    let app = app_with_tools(vec![tool(5, "t", false)]);
    let token = login(&app).await;

    let resp = app
        .clone()
        .oneshot(request("GET", "/api/admin/tool/5/post", Some(&token), ""))
        .await
        .unwrap();
    let post: ToolPost = body_json(resp).await;
    assert_eq!(post, ToolPost::default());

    app.clone()
        .oneshot(request(
            "PUT",
            "/api/admin/tool/5/post",
            Some(&token),
            r#"{"post_title":"Intro","post_content":"Hello"}"#,
        ))
        .await
        .unwrap();

    let resp = app
        .oneshot(request("GET", "/api/admin/tool/5/post", Some(&token), ""))
        .await
        .unwrap();
    let post: ToolPost = body_json(resp).await;
    assert_eq!(post.post_title, "Intro");
}

// --- posts ---

#[tokio::test]
async fn posts_list_newest_first() {
    let app = app();
    let token = login(&app).await;

    for title in ["first", "second"] {
        let resp = app
            .clone()
            .oneshot(request(
                "POST",
                "/api/admin/posts",
                Some(&token),
                &format!(r#"{{"title":"{title}","content":"x"}}"#),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = app
        .oneshot(request("GET", "/api/admin/posts", Some(&token), ""))
        .await
        .unwrap();
    let posts: Vec<Post> = body_json(resp).await;
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].title, "second");
    assert_eq!(posts[1].title, "first");
}

#[tokio::test]
async fn add_post_malformed_json_returns_422() {
    let app = app();
    let token = login(&app).await;
    let resp = app
        .oneshot(request(
            "POST",
            "/api/admin/posts",
            Some(&token),
            r#"{"content":"no title"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn update_and_delete_missing_post_return_404() {
    let app = app();
    let token = login(&app).await;

    let resp = app
        .clone()
        .oneshot(request(
            "PUT",
            "/api/admin/posts/99",
            Some(&token),
            r#"{"title":"t","content":"c"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .oneshot(request("DELETE", "/api/admin/posts/99", Some(&token), ""))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
