//! Admin route handlers.
//!
//! Provides HTTP handlers for the admin UI: login, logout, dashboard,
//! post authoring, about editing, comment moderation, and the user list.

use crate::admin::middleware::check_auth;
use crate::admin::templates::{
    AboutEditTemplate, BaseContext, CommentRow, CommentsTemplate, DashboardTemplate, LoginTemplate,
    PostFormTemplate, PostRow, PostsTemplate, UserRow, UsersTemplate,
};
use crate::api::parse_post_date;
use crate::posts::{Post, PostDraft};
use crate::server::AppState;
use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

/// Build the admin router.
pub fn admin_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/login", get(login_page))
        .route("/login", post(login_submit))
        .route("/logout", post(logout))
        .route("/dashboard", get(dashboard))
        .route("/posts", get(posts_page))
        .route("/posts/new", get(post_new_page).post(post_new_submit))
        .route("/posts/{id}/edit", get(post_edit_page).post(post_edit_submit))
        .route("/posts/{id}/delete", post(post_delete))
        .route("/about", get(about_page).post(about_submit))
        .route("/comments", get(comments_page))
        .route("/comments/{id}/delete", post(comment_delete))
        .route("/users", get(users_page))
        .with_state(state)
}

fn render_template<T: Template>(template: T) -> Response {
    Html(
        template
            .render()
            .unwrap_or_else(|e| format!("Template error: {e}")),
    )
    .into_response()
}

fn post_row(post: &Post) -> PostRow {
    PostRow {
        id: post.id.clone(),
        title: post.title.clone(),
        date: post.post_date.format("%Y-%m-%d").to_string(),
        published: post.published,
    }
}

/// Login page handler.
async fn login_page(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    // If already logged in, redirect to dashboard
    if check_auth(&state, &jar).is_some() {
        return Redirect::to("/admin/dashboard").into_response();
    }

    render_template(LoginTemplate { error: None })
}

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    username: String,
    password: String,
}

/// Login form submission handler.
async fn login_submit(
    State(state): State<Arc<AppState>>,
    _jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let issued = match state.gate.issue(&form.username, &form.password) {
        Ok(issued) => issued,
        Err(_) => {
            let template = LoginTemplate {
                error: Some("Invalid username or password".to_string()),
            };
            return render_template(template);
        }
    };

    Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header(header::LOCATION, "/admin/dashboard")
        .header(header::SET_COOKIE, state.gate.session_cookie(&issued.token))
        .body(axum::body::Body::empty())
        .unwrap()
}

/// Logout handler. There is no server-side session state to drop; the
/// cookie is the session.
async fn logout(State(state): State<Arc<AppState>>) -> Response {
    Response::builder()
        .status(StatusCode::SEE_OTHER)
        .header(header::LOCATION, "/admin/login")
        .header(header::SET_COOKIE, state.gate.clear_cookie())
        .body(axum::body::Body::empty())
        .unwrap()
}

/// Dashboard handler.
async fn dashboard(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let session = match check_auth(&state, &jar) {
        Some(s) => s,
        None => return Redirect::to("/admin/login").into_response(),
    };

    let base = BaseContext {
        username: session.subject.clone(),
    };

    let (post_count, published_count) = state.posts.counts().await.unwrap_or((0, 0));
    let comment_count = state.comments.count().await.unwrap_or(0);
    let user_count = state.users.count().await.unwrap_or(0);

    let recent = state
        .posts
        .list_all()
        .await
        .unwrap_or_default()
        .iter()
        .take(5)
        .map(post_row)
        .collect();

    render_template(DashboardTemplate {
        base,
        post_count,
        published_count,
        comment_count,
        user_count,
        recent,
    })
}

/// Post list handler.
async fn posts_page(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let session = match check_auth(&state, &jar) {
        Some(s) => s,
        None => return Redirect::to("/admin/login").into_response(),
    };

    let posts = match state.posts.list_all().await {
        Ok(posts) => posts,
        Err(e) => {
            error!("Failed to list posts: {e:#}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to list posts").into_response();
        }
    };

    render_template(PostsTemplate {
        base: BaseContext {
            username: session.subject,
        },
        posts: posts.iter().map(post_row).collect(),
    })
}

/// Post form data.
#[derive(Deserialize)]
pub struct PostForm {
    title: String,
    content: String,
    #[serde(default)]
    excerpt: String,
    #[serde(default)]
    post_date: String,
    /// Present ("on") when the checkbox is ticked
    #[serde(default)]
    published: Option<String>,
}

impl PostForm {
    fn to_draft(&self) -> Result<PostDraft, String> {
        if self.title.trim().is_empty() {
            return Err("Title is required".to_string());
        }

        let post_date = parse_post_date(Some(&self.post_date))
            .map_err(|_| format!("Invalid date: {}", self.post_date))?;

        Ok(PostDraft {
            title: self.title.trim().to_string(),
            content: self.content.clone(),
            excerpt: Some(self.excerpt.trim().to_string()).filter(|e| !e.is_empty()),
            published: self.published.is_some(),
            post_date,
        })
    }

    /// Re-render the form with the submitted values preserved.
    fn as_template(
        &self,
        base: BaseContext,
        heading: String,
        action: String,
        error: String,
    ) -> PostFormTemplate {
        PostFormTemplate {
            base,
            heading,
            action,
            title_value: self.title.clone(),
            content_value: self.content.clone(),
            excerpt_value: self.excerpt.clone(),
            date_value: self.post_date.clone(),
            published: self.published.is_some(),
            error: Some(error),
        }
    }
}

fn empty_post_form(base: BaseContext) -> PostFormTemplate {
    PostFormTemplate {
        base,
        heading: "New post".to_string(),
        action: "/admin/posts/new".to_string(),
        title_value: String::new(),
        content_value: String::new(),
        excerpt_value: String::new(),
        date_value: String::new(),
        published: true,
        error: None,
    }
}

fn edit_post_form(base: BaseContext, post: &Post) -> PostFormTemplate {
    PostFormTemplate {
        base,
        heading: format!("Edit: {}", post.title),
        action: format!("/admin/posts/{}/edit", post.id),
        title_value: post.title.clone(),
        content_value: post.content.clone(),
        excerpt_value: post.excerpt.clone().unwrap_or_default(),
        date_value: post.post_date.format("%Y-%m-%d").to_string(),
        published: post.published,
        error: None,
    }
}

/// New post form handler.
async fn post_new_page(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let session = match check_auth(&state, &jar) {
        Some(s) => s,
        None => return Redirect::to("/admin/login").into_response(),
    };

    render_template(empty_post_form(BaseContext {
        username: session.subject,
    }))
}

/// New post submission handler.
async fn post_new_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<PostForm>,
) -> Response {
    let session = match check_auth(&state, &jar) {
        Some(s) => s,
        None => return Redirect::to("/admin/login").into_response(),
    };
    let base = BaseContext {
        username: session.subject,
    };

    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(message) => {
            return render_template(form.as_template(
                base,
                "New post".to_string(),
                "/admin/posts/new".to_string(),
                message,
            ));
        }
    };

    match state.posts.create(&draft).await {
        Ok(_) => Redirect::to("/admin/posts").into_response(),
        Err(e) => {
            error!("Failed to create post: {e:#}");
            render_template(form.as_template(
                base,
                "New post".to_string(),
                "/admin/posts/new".to_string(),
                "Failed to save the post. Please try again.".to_string(),
            ))
        }
    }
}

/// Edit post form handler.
async fn post_edit_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    let session = match check_auth(&state, &jar) {
        Some(s) => s,
        None => return Redirect::to("/admin/login").into_response(),
    };

    let post = match state.posts.get(&id).await {
        Ok(Some(post)) => post,
        Ok(None) => return (StatusCode::NOT_FOUND, "Post not found").into_response(),
        Err(e) => {
            error!("Failed to load post {id}: {e:#}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to load post").into_response();
        }
    };

    render_template(edit_post_form(
        BaseContext {
            username: session.subject,
        },
        &post,
    ))
}

/// Edit post submission handler.
async fn post_edit_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<String>,
    Form(form): Form<PostForm>,
) -> Response {
    let session = match check_auth(&state, &jar) {
        Some(s) => s,
        None => return Redirect::to("/admin/login").into_response(),
    };
    let base = BaseContext {
        username: session.subject,
    };

    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(message) => {
            return render_template(form.as_template(
                base,
                "Edit post".to_string(),
                format!("/admin/posts/{id}/edit"),
                message,
            ));
        }
    };

    match state.posts.update(&id, &draft).await {
        Ok(Some(_)) => Redirect::to("/admin/posts").into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Post not found").into_response(),
        Err(e) => {
            error!("Failed to update post {id}: {e:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to update post").into_response()
        }
    }
}

/// Post delete handler.
async fn post_delete(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    if check_auth(&state, &jar).is_none() {
        return Redirect::to("/admin/login").into_response();
    }

    match state.posts.delete(&id).await {
        Ok(true) => Redirect::to("/admin/posts").into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Post not found").into_response(),
        Err(e) => {
            error!("Failed to delete post {id}: {e:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete post").into_response()
        }
    }
}

/// About form data.
#[derive(Deserialize)]
pub struct AboutForm {
    content: String,
}

/// About editor handler.
async fn about_page(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let session = match check_auth(&state, &jar) {
        Some(s) => s,
        None => return Redirect::to("/admin/login").into_response(),
    };

    let content = state
        .about
        .get()
        .await
        .ok()
        .flatten()
        .map(|about| about.content)
        .unwrap_or_default();

    render_template(AboutEditTemplate {
        base: BaseContext {
            username: session.subject,
        },
        content,
        saved: false,
    })
}

/// About editor submission handler.
async fn about_submit(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<AboutForm>,
) -> Response {
    let session = match check_auth(&state, &jar) {
        Some(s) => s,
        None => return Redirect::to("/admin/login").into_response(),
    };
    let base = BaseContext {
        username: session.subject,
    };

    match state.about.upsert(&form.content).await {
        Ok(about) => render_template(AboutEditTemplate {
            base,
            content: about.content,
            saved: true,
        }),
        Err(e) => {
            error!("Failed to save about content: {e:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to save about content").into_response()
        }
    }
}

/// Comment moderation handler.
async fn comments_page(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let session = match check_auth(&state, &jar) {
        Some(s) => s,
        None => return Redirect::to("/admin/login").into_response(),
    };

    let comments = state
        .comments
        .list_recent(50)
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|c| CommentRow {
            id: c.id,
            post_title: c.post_title,
            author: c.author_username.unwrap_or_else(|| "deleted account".to_string()),
            created: c.created_at.format("%Y-%m-%d %H:%M").to_string(),
            content: c.content,
        })
        .collect();

    render_template(CommentsTemplate {
        base: BaseContext {
            username: session.subject,
        },
        comments,
    })
}

/// Comment delete handler.
async fn comment_delete(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Path(id): Path<String>,
) -> Response {
    if check_auth(&state, &jar).is_none() {
        return Redirect::to("/admin/login").into_response();
    }

    match state.comments.delete(&id).await {
        Ok(true) => Redirect::to("/admin/comments").into_response(),
        Ok(false) => (StatusCode::NOT_FOUND, "Comment not found").into_response(),
        Err(e) => {
            error!("Failed to delete comment {id}: {e:#}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete comment").into_response()
        }
    }
}

/// User list handler.
async fn users_page(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let session = match check_auth(&state, &jar) {
        Some(s) => s,
        None => return Redirect::to("/admin/login").into_response(),
    };

    let users = state
        .users
        .list()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|u| UserRow {
            username: u.username,
            name: u.name.unwrap_or_default(),
            email: u.email.unwrap_or_default(),
            role: u.role,
            joined: u.joined_at.format("%Y-%m-%d").to_string(),
            comment_count: u.comment_count,
        })
        .collect();

    render_template(UsersTemplate {
        base: BaseContext {
            username: session.subject,
        },
        users,
    })
}
