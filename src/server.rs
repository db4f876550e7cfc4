//! HTTP server assembly: shared state, router, and the serve loop.

use crate::about::AboutStore;
use crate::comments::CommentStore;
use crate::config::Config;
use crate::db::Database;
use crate::posts::PostStore;
use crate::session::SessionGate;
use crate::uploads::UploadStore;
use crate::users::UserStore;
use anyhow::{Context, Result};
use axum::Router;
use axum::response::Redirect;
use axum::routing::get;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing::info;

/// State shared by every route.
pub struct AppState {
    pub gate: SessionGate,
    pub posts: PostStore,
    pub about: AboutStore,
    pub comments: CommentStore,
    pub users: UserStore,
    pub uploads: UploadStore,
    pub db: Database,
    pub site_title: String,
}

impl AppState {
    /// Wire up stores and the session gate from configuration.
    pub fn new(config: &Config, db: Database, data_dir: &Path) -> Self {
        let pool = db.pool();
        Self {
            gate: SessionGate::new(&config.auth),
            posts: PostStore::new(pool.clone()),
            about: AboutStore::new(pool.clone()),
            comments: CommentStore::new(pool.clone()),
            users: UserStore::new(pool),
            uploads: UploadStore::new(
                config.upload_dir(data_dir),
                config.uploads.max_bytes,
            ),
            db,
            site_title: config.site.title.clone(),
        }
    }
}

/// Build the full application router: public pages, JSON API, admin UI,
/// and the upload file service.
pub fn app_router(state: Arc<AppState>) -> Router {
    let uploads_dir = state.uploads.dir().to_path_buf();

    Router::new()
        .merge(crate::pages::pages_router(state.clone()))
        .merge(crate::api::api_router(state.clone()))
        // Handle both /admin and /admin/ by redirecting to dashboard
        .route("/admin", get(|| async { Redirect::to("/admin/dashboard") }))
        .route("/admin/", get(|| async { Redirect::to("/admin/dashboard") }))
        .nest("/admin", crate::admin::admin_router(state))
        .nest_service("/uploads", ServeDir::new(uploads_dir))
}

/// Run the HTTP server until the process is stopped.
pub async fn run_server(listen_addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let app = app_router(state);

    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("Failed to bind {listen_addr}"))?;

    info!("HTTP server listening on {listen_addr}");

    axum::serve(listener, app)
        .await
        .context("HTTP server exited")
}
