//! Askama templates for the admin UI.

use askama::Template;

/// Base data available to all templates
pub struct BaseContext {
    pub username: String,
}

/// Login page template
#[derive(Template)]
#[template(path = "admin/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
}

/// Post summary for list views
pub struct PostRow {
    pub id: String,
    pub title: String,
    pub date: String,
    pub published: bool,
}

/// Dashboard page template
#[derive(Template)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub base: BaseContext,
    pub post_count: i64,
    pub published_count: i64,
    pub comment_count: i64,
    pub user_count: i64,
    pub recent: Vec<PostRow>,
}

/// Post list page template
#[derive(Template)]
#[template(path = "admin/posts.html")]
pub struct PostsTemplate {
    pub base: BaseContext,
    pub posts: Vec<PostRow>,
}

/// Post create/edit form template
#[derive(Template)]
#[template(path = "admin/post_form.html")]
pub struct PostFormTemplate {
    pub base: BaseContext,
    pub heading: String,
    /// Form POST target
    pub action: String,
    pub title_value: String,
    pub content_value: String,
    pub excerpt_value: String,
    /// `YYYY-MM-DD` for the date input
    pub date_value: String,
    pub published: bool,
    pub error: Option<String>,
}

/// About editor template
#[derive(Template)]
#[template(path = "admin/about.html")]
pub struct AboutEditTemplate {
    pub base: BaseContext,
    pub content: String,
    pub saved: bool,
}

/// Comment row for the moderation view
pub struct CommentRow {
    pub id: String,
    pub post_title: String,
    pub author: String,
    pub created: String,
    pub content: String,
}

/// Comment moderation template
#[derive(Template)]
#[template(path = "admin/comments.html")]
pub struct CommentsTemplate {
    pub base: BaseContext,
    pub comments: Vec<CommentRow>,
}

/// User row for the accounts view
pub struct UserRow {
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub joined: String,
    pub comment_count: i64,
}

/// User list template
#[derive(Template)]
#[template(path = "admin/users.html")]
pub struct UsersTemplate {
    pub base: BaseContext,
    pub users: Vec<UserRow>,
}
