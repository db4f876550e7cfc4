//! JSON API route handlers.
//!
//! Mutating routes require a valid admin session; read routes are public
//! except where drafts would leak.

use crate::content;
use crate::error::AppError;
use crate::posts::{Post, PostDraft, PostFilter};
use crate::server::AppState;
use crate::session::{SESSION_COOKIE, Session};
use axum::extract::rejection::JsonRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Build the JSON API router.
pub fn api_router(state: Arc<AppState>) -> Router {
    // Multipart bodies need headroom beyond the raw file size
    let upload_limit = state.uploads.max_bytes() + 64 * 1024;

    Router::new()
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/posts", get(list_posts).post(create_post))
        .route(
            "/api/posts/{id}",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/api/posts/{id}/fix-images", post(fix_images))
        .route("/api/about", get(get_about).put(put_about))
        .route(
            "/api/uploads",
            post(upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/health/db", get(health))
        .with_state(state)
}

/// Resolve the session presented by the request, or fail with 401.
fn require_admin(state: &AppState, jar: &CookieJar) -> Result<Session, AppError> {
    state
        .gate
        .validate_cookie(jar.get(SESSION_COOKIE).map(|c| c.value()))
        .ok_or(AppError::InvalidSession)
}

/// True when the request carries a valid admin session.
fn is_admin(state: &AppState, jar: &CookieJar) -> bool {
    require_admin(state, jar).is_ok()
}

#[derive(Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

/// `POST /api/login`: check credentials, set the session cookie.
async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(req) = payload.map_err(|e| AppError::MalformedRequest(e.body_text()))?;

    let issued = state.gate.issue(&req.username, &req.password)?;
    info!(subject = %issued.session.subject, "Admin login");

    let mut response = Json(json!({ "success": true })).into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        state
            .gate
            .session_cookie(&issued.token)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid cookie header: {e}"))?,
    );
    Ok(response)
}

/// `POST /api/logout`: clear the session cookie.
async fn logout(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let mut response = Json(json!({ "success": true })).into_response();
    response.headers_mut().insert(
        header::SET_COOKIE,
        state
            .gate
            .clear_cookie()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid cookie header: {e}"))?,
    );
    Ok(response)
}

#[derive(Deserialize)]
struct PostPayload {
    title: String,
    content: String,
    #[serde(default)]
    excerpt: Option<String>,
    #[serde(default = "default_published")]
    published: bool,
    #[serde(default)]
    date: Option<String>,
}

fn default_published() -> bool {
    true
}

impl PostPayload {
    fn into_draft(self) -> Result<PostDraft, AppError> {
        Ok(PostDraft {
            title: self.title,
            content: self.content,
            excerpt: self.excerpt.filter(|e| !e.trim().is_empty()),
            published: self.published,
            post_date: parse_post_date(self.date.as_deref())?,
        })
    }
}

/// Accept either a full RFC 3339 timestamp or a bare `YYYY-MM-DD` date.
pub(crate) fn parse_post_date(value: Option<&str>) -> Result<Option<DateTime<Utc>>, AppError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).expect("valid midnight");
        return Ok(Some(midnight.and_utc()));
    }

    Err(AppError::MalformedRequest(format!("Invalid date: {value}")))
}

/// `GET /api/posts`: every post for the admin, published only otherwise.
async fn list_posts(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<Json<Vec<Post>>, AppError> {
    let posts = if is_admin(&state, &jar) {
        state.posts.list_all().await?
    } else {
        state.posts.list_published(&PostFilter::default()).await?
    };
    Ok(Json(posts))
}

/// `POST /api/posts`: create a post.
async fn create_post(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: Result<Json<PostPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Post>), AppError> {
    require_admin(&state, &jar)?;
    let Json(payload) = payload.map_err(|e| AppError::MalformedRequest(e.body_text()))?;

    let post = state.posts.create(&payload.into_draft()?).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// `GET /api/posts/{id}`
async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Post>, AppError> {
    let post = state.posts.get(&id).await?.ok_or(AppError::NotFound("Post"))?;
    Ok(Json(post))
}

/// `PUT /api/posts/{id}`
async fn update_post(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<String>,
    payload: Result<Json<PostPayload>, JsonRejection>,
) -> Result<Json<Post>, AppError> {
    require_admin(&state, &jar)?;
    let Json(payload) = payload.map_err(|e| AppError::MalformedRequest(e.body_text()))?;

    let post = state
        .posts
        .update(&id, &payload.into_draft()?)
        .await?
        .ok_or(AppError::NotFound("Post"))?;
    Ok(Json(post))
}

/// `DELETE /api/posts/{id}`
async fn delete_post(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state, &jar)?;

    if !state.posts.delete(&id).await? {
        return Err(AppError::NotFound("Post"));
    }
    Ok(Json(json!({ "success": true })))
}

/// `POST /api/posts/{id}/fix-images`: sanitize stored content.
async fn fix_images(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state, &jar)?;

    let post = state.posts.get(&id).await?.ok_or(AppError::NotFound("Post"))?;
    let cleaned = content::clean_post_html(&post.content);
    let changed = cleaned != post.content;
    if changed {
        state.posts.update_content(&id, &cleaned).await?;
    }

    Ok(Json(json!({ "success": true, "changed": changed })))
}

/// `GET /api/about`: public about content (empty string before first write).
async fn get_about(State(state): State<Arc<AppState>>) -> Result<Json<serde_json::Value>, AppError> {
    match state.about.get().await? {
        Some(about) => Ok(Json(json!({ "content": about.content, "id": about.id }))),
        None => Ok(Json(json!({ "content": "" }))),
    }
}

#[derive(Deserialize)]
struct AboutPayload {
    content: String,
}

/// `PUT /api/about`: replace the about content.
async fn put_about(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    payload: Result<Json<AboutPayload>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state, &jar)?;
    let Json(payload) = payload.map_err(|e| AppError::MalformedRequest(e.body_text()))?;

    if payload.content.trim().is_empty() {
        return Err(AppError::MalformedRequest("Content is required".to_string()));
    }

    let about = state.about.upsert(&payload.content).await?;
    Ok(Json(
        json!({ "success": true, "content": about.content, "id": about.id }),
    ))
}

/// `POST /api/uploads`: store one image/video, respond with its URL.
async fn upload(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    require_admin(&state, &jar)?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::MalformedRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::MalformedRequest(e.to_string()))?;

        let url = state.uploads.save(&original_name, &content_type, &data).await?;
        return Ok(Json(json!({ "url": url })));
    }

    Err(AppError::MalformedRequest("No file provided".to_string()))
}

/// `GET /api/health/db`: connectivity probe and table inventory.
async fn health(State(state): State<Arc<AppState>>) -> Response {
    match state.db.health_check().await {
        Ok(tables) => {
            let has = |name: &str| tables.iter().any(|t| t == name);
            Json(json!({
                "status": "ok",
                "database": "connected",
                "tables": {
                    "posts": has("posts"),
                    "about": has("about"),
                    "comments": has("comments"),
                    "users": has("users"),
                    "all": tables,
                },
            }))
            .into_response()
        }
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "error",
                "database": "error",
                "message": err.to_string(),
            })),
        )
            .into_response(),
    }
}
