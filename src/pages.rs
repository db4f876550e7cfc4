//! Public HTML pages: the blog index, single posts, and the about page.

use crate::error::AppError;
use crate::posts::{ArchiveBucket, Post, PostFilter};
use crate::server::AppState;
use askama::Template;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use serde::Deserialize;
use std::sync::Arc;

/// Build the public pages router.
pub fn pages_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(blog_index))
        .route("/blog", get(blog_index))
        .route("/blog/{slug}", get(blog_post))
        .route("/about", get(about_page))
        .with_state(state)
}

/// A post prepared for list rendering.
pub struct PostCard {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub excerpt: Option<String>,
}

impl PostCard {
    fn from_post(post: &Post) -> Self {
        Self {
            slug: post.slug.clone(),
            title: post.title.clone(),
            date: post.post_date.format("%B %-d, %Y").to_string(),
            excerpt: post.excerpt.clone(),
        }
    }
}

/// Blog index template
#[derive(Template)]
#[template(path = "blog/index.html")]
pub struct BlogIndexTemplate {
    pub site_title: String,
    pub posts: Vec<PostCard>,
    pub archive: Vec<ArchiveBucket>,
    pub search: String,
}

/// Single post template
#[derive(Template)]
#[template(path = "blog/post.html")]
pub struct BlogPostTemplate {
    pub site_title: String,
    pub title: String,
    pub date: String,
    pub content: String,
}

/// About page template
#[derive(Template)]
#[template(path = "blog/about.html")]
pub struct AboutTemplate {
    pub site_title: String,
    pub content: String,
}

fn render<T: Template>(template: T) -> Response {
    Html(
        template
            .render()
            .unwrap_or_else(|e| format!("Template error: {e}")),
    )
    .into_response()
}

#[derive(Deserialize)]
struct BlogQuery {
    year: Option<i32>,
    month: Option<u32>,
    search: Option<String>,
}

/// Blog index handler: published posts with archive/search filters.
async fn blog_index(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BlogQuery>,
) -> Result<Response, AppError> {
    let filter = PostFilter {
        year: query.year,
        month: query.month,
        search: query.search.clone(),
    };

    let posts = state.posts.list_published(&filter).await?;
    let archive = state.posts.archive().await?;

    Ok(render(BlogIndexTemplate {
        site_title: state.site_title.clone(),
        posts: posts.iter().map(PostCard::from_post).collect(),
        archive,
        search: query.search.unwrap_or_default(),
    }))
}

/// Single post handler. Drafts are indistinguishable from missing posts.
async fn blog_post(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Response, AppError> {
    let post = match state.posts.get_by_slug(&slug).await? {
        Some(post) if post.published => post,
        _ => return Ok((StatusCode::NOT_FOUND, "Post not found").into_response()),
    };

    Ok(render(BlogPostTemplate {
        site_title: state.site_title.clone(),
        title: post.title.clone(),
        date: post.post_date.format("%B %-d, %Y").to_string(),
        content: post.content,
    }))
}

/// About page handler.
async fn about_page(State(state): State<Arc<AppState>>) -> Result<Response, AppError> {
    let content = state
        .about
        .get()
        .await?
        .map(|about| about.content)
        .unwrap_or_default();

    Ok(render(AboutTemplate {
        site_title: state.site_title.clone(),
        content,
    }))
}
