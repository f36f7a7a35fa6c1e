//! In-memory catalog backend.
//!
//! Serves the tool, tool-post, blog-post and login endpoints the admin
//! front-end talks to. Everything under `/api/admin`, plus tool updates,
//! needs `Authorization: Bearer <token>` with a token issued by
//! `/api/login`; anything else gets a 401.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use axum::{
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{any, get, post, put},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tool {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub logo: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub catelog: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub sort: i32,
    #[serde(default)]
    pub hide: bool,
}

#[derive(Deserialize)]
pub struct UpdateTool {
    pub name: Option<String>,
    pub url: Option<String>,
    pub logo: Option<String>,
    pub desc: Option<String>,
    pub catelog: Option<String>,
    pub content: Option<String>,
    pub sort: Option<i32>,
    pub hide: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolPost {
    #[serde(default)]
    pub post_title: String,
    #[serde(default)]
    pub post_content: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub create_time: String,
    pub update_time: String,
}

#[derive(Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
}

#[derive(Deserialize)]
pub struct Login {
    pub name: String,
    pub password: String,
}

/// The single admin account.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub name: String,
    pub password: String,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            name: "admin".to_string(),
            password: "admin".to_string(),
        }
    }
}

impl Credentials {
    /// `MOCK_ADMIN_NAME` / `MOCK_ADMIN_PASSWORD`, falling back to admin/admin.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            name: std::env::var("MOCK_ADMIN_NAME").unwrap_or(defaults.name),
            password: std::env::var("MOCK_ADMIN_PASSWORD").unwrap_or(defaults.password),
        }
    }
}

#[derive(Default)]
struct Catalog {
    tools: HashMap<i64, Tool>,
    tool_posts: HashMap<i64, ToolPost>,
    posts: HashMap<i64, Post>,
    next_post_id: i64,
    sessions: HashSet<String>,
}

#[derive(Clone)]
pub struct AppState {
    db: Arc<RwLock<Catalog>>,
    admin: Arc<Credentials>,
}

impl AppState {
    pub fn new(admin: Credentials, tools: Vec<Tool>) -> Self {
        let catalog = Catalog {
            tools: tools.into_iter().map(|t| (t.id, t)).collect(),
            next_post_id: 1,
            ..Catalog::default()
        };
        Self {
            db: Arc::new(RwLock::new(catalog)),
            admin: Arc::new(admin),
        }
    }

    /// Revoke every issued token, as if they all expired.
    pub async fn expire_sessions(&self) {
        self.db.write().await.sessions.clear();
    }
}

type Rejection = (StatusCode, Json<Value>);

pub fn app() -> Router {
    app_with_tools(Vec::new())
}

pub fn app_with_tools(tools: Vec<Tool>) -> Router {
    router(AppState::new(Credentials::default(), tools))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/ping", get(ping))
        .route("/api/echo", any(echo))
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/tools/{id}", get(get_tool).put(update_tool))
        .route(
            "/api/admin/tool/{id}/post",
            get(get_tool_post).put(update_tool_post),
        )
        .route("/api/admin/posts", get(list_posts).post(add_post))
        .route("/api/admin/posts/{id}", put(update_post).delete(delete_post))
        .with_state(state)
}

pub async fn run(listener: TcpListener, app: Router) -> Result<(), std::io::Error> {
    axum::serve(listener, app).await
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

async fn is_authorized(state: &AppState, headers: &HeaderMap) -> bool {
    match bearer(headers) {
        Some(token) => state.db.read().await.sessions.contains(token),
        None => false,
    }
}

async fn require_session(state: &AppState, headers: &HeaderMap) -> Result<(), Rejection> {
    if is_authorized(state, headers).await {
        Ok(())
    } else {
        warn!("rejecting request without a valid session");
        Err(failure(StatusCode::UNAUTHORIZED, "unauthorized"))
    }
}

fn failure(status: StatusCode, message: &str) -> Rejection {
    (
        status,
        Json(json!({"success": false, "errorMessage": message})),
    )
}

async fn ping() -> &'static str {
    "ok"
}

/// Replies with the raw request body as text, whatever the method.
async fn echo(body: String) -> String {
    body
}

async fn login(State(state): State<AppState>, Json(input): Json<Login>) -> Json<Value> {
    if input.name != state.admin.name {
        return Json(json!({"success": false, "errorMessage": "unknown user"}));
    }
    if input.password != state.admin.password {
        return Json(json!({"success": false, "errorMessage": "wrong password"}));
    }
    let token = Uuid::new_v4().to_string();
    state.db.write().await.sessions.insert(token.clone());
    info!(user = %input.name, "login");
    Json(json!({
        "success": true,
        "message": "logged in",
        "data": {"user": {"name": input.name}, "token": token}
    }))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    if let Some(token) = bearer(&headers) {
        state.db.write().await.sessions.remove(token);
    }
    Json(json!({"success": true, "message": "logged out"}))
}

async fn get_tool(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, Rejection> {
    let tool = state
        .db
        .read()
        .await
        .tools
        .get(&id)
        .cloned()
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "tool not found"))?;
    if tool.hide && !is_authorized(&state, &headers).await {
        return Err(failure(StatusCode::FORBIDDEN, "tool is hidden"));
    }
    Ok(Json(json!({"success": true, "data": tool})))
}

async fn update_tool(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<UpdateTool>,
) -> Result<Json<Value>, Rejection> {
    require_session(&state, &headers).await?;
    let mut db = state.db.write().await;
    let tool = db
        .tools
        .get_mut(&id)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "tool not found"))?;
    if let Some(name) = input.name {
        tool.name = name;
    }
    if let Some(url) = input.url {
        tool.url = url;
    }
    if let Some(logo) = input.logo {
        tool.logo = logo;
    }
    if let Some(desc) = input.desc {
        tool.desc = desc;
    }
    if let Some(catelog) = input.catelog {
        tool.catelog = catelog;
    }
    if let Some(content) = input.content {
        tool.content = content;
    }
    if let Some(sort) = input.sort {
        tool.sort = sort;
    }
    if let Some(hide) = input.hide {
        tool.hide = hide;
    }
    Ok(Json(json!({"success": true, "message": "updated"})))
}

async fn get_tool_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<ToolPost>, Rejection> {
    require_session(&state, &headers).await?;
    let db = state.db.read().await;
    if !db.tools.contains_key(&id) {
        return Err(failure(StatusCode::NOT_FOUND, "tool not found"));
    }
    Ok(Json(db.tool_posts.get(&id).cloned().unwrap_or_default()))
}

async fn update_tool_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<ToolPost>,
) -> Result<Json<Value>, Rejection> {
    require_session(&state, &headers).await?;
    let mut db = state.db.write().await;
    if !db.tools.contains_key(&id) {
        return Err(failure(StatusCode::NOT_FOUND, "tool not found"));
    }
    db.tool_posts.insert(id, input);
    Ok(Json(json!({"message": "saved"})))
}

async fn list_posts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Post>>, Rejection> {
    require_session(&state, &headers).await?;
    let db = state.db.read().await;
    let mut posts: Vec<Post> = db.posts.values().cloned().collect();
    posts.sort_by(|a, b| b.id.cmp(&a.id));
    Ok(Json(posts))
}

async fn add_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<NewPost>,
) -> Result<Json<Post>, Rejection> {
    require_session(&state, &headers).await?;
    let mut db = state.db.write().await;
    let now = Utc::now().to_rfc3339();
    let post = Post {
        id: db.next_post_id,
        title: input.title,
        content: input.content,
        create_time: now.clone(),
        update_time: now,
    };
    db.next_post_id += 1;
    db.posts.insert(post.id, post.clone());
    Ok(Json(post))
}

async fn update_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(input): Json<NewPost>,
) -> Result<Json<Value>, Rejection> {
    require_session(&state, &headers).await?;
    let mut db = state.db.write().await;
    let post = db
        .posts
        .get_mut(&id)
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "post not found"))?;
    post.title = input.title;
    post.content = input.content;
    post.update_time = Utc::now().to_rfc3339();
    Ok(Json(json!({"message": "updated"})))
}

async fn delete_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Value>, Rejection> {
    require_session(&state, &headers).await?;
    let mut db = state.db.write().await;
    db.posts
        .remove(&id)
        .map(|_| Json(json!({"message": "deleted"})))
        .ok_or_else(|| failure(StatusCode::NOT_FOUND, "post not found"))
}
