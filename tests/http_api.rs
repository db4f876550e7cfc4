//! Integration tests for the HTTP surface.
//!
//! These tests verify that:
//! - Login/logout issue and revoke the session cookie correctly
//! - Protected routes reject anonymous requests
//! - Post/about CRUD works end-to-end through the JSON API
//! - Uploads are stored and served back
//! - Admin pages redirect anonymous visitors to the login form

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use inkpost::config::{AuthConfig, Config, DatabaseConfig, HttpConfig, SiteConfig, UploadConfig};
use inkpost::db::Database;
use inkpost::server::{AppState, app_router};

/// Test fixture that sets up a router over a temp-dir database
struct TestFixture {
    _temp_dir: TempDir,
    app: Router,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();

        let config = Config {
            http: HttpConfig::default(),
            auth: AuthConfig {
                admin_username: "admin".to_string(),
                admin_password: "hunter2".to_string(),
                session_secret: "integration-test-secret".to_string(),
                session_ttl_days: 7,
                secure_cookies: false,
            },
            database: DatabaseConfig::default(),
            uploads: UploadConfig::default(),
            site: SiteConfig::default(),
        };

        let db = Database::new(&config.database, temp_dir.path()).await.unwrap();
        let state = Arc::new(AppState::new(&config, db, temp_dir.path()));

        Self {
            _temp_dir: temp_dir,
            app: app_router(state),
        }
    }

    async fn request(&self, req: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(req).await.unwrap()
    }

    async fn login(&self) -> String {
        let response = self
            .request(
                Request::post("/api/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        r#"{"username": "admin", "password": "hunter2"}"#,
                    ))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("login must set a cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }
}

async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn text_body(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn json_request(method: &str, uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_login_issues_session_cookie() {
    let fixture = TestFixture::new().await;

    let cookie = fixture.login().await;
    assert!(cookie.starts_with("session="));
    assert!(cookie.len() > "session=".len());
}

#[tokio::test]
async fn test_login_rejects_bad_credentials_without_cookie() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .request(json_request(
            "POST",
            "/api/login",
            None,
            r#"{"username": "admin", "password": "wrong"}"#,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_login_trims_whitespace() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .request(json_request(
            "POST",
            "/api/login",
            None,
            r#"{"username": "  admin ", "password": " hunter2\t"}"#,
        ))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_malformed_login_body_is_400() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .request(json_request("POST", "/api/login", None, "{not json"))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Missing fields are malformed too
    let response = fixture
        .request(json_request(
            "POST",
            "/api/login",
            None,
            r#"{"username": "admin"}"#,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_expires_cookie() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .request(Request::post("/api/logout").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(set_cookie.starts_with("session=;"));
    assert!(set_cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_post_crud_requires_session() {
    let fixture = TestFixture::new().await;
    let body = r#"{"title": "Locked out", "content": "<p>no</p>"}"#;

    let response = fixture
        .request(json_request("POST", "/api/posts", None, body))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // A forged cookie is just as anonymous
    let response = fixture
        .request(json_request(
            "POST",
            "/api/posts",
            Some("session=abc.def"),
            body,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_post_crud_round_trip() {
    let fixture = TestFixture::new().await;
    let cookie = fixture.login().await;

    // Create
    let response = fixture
        .request(json_request(
            "POST",
            "/api/posts",
            Some(&cookie),
            r#"{"title": "Hello world", "content": "<p>first</p>", "date": "2024-12-05"}"#,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_body(response).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["slug"], "hello-world");
    assert_eq!(created["year"], 2024);
    assert_eq!(created["month"], 12);

    // Read
    let response = fixture
        .request(json_request("GET", &format!("/api/posts/{id}"), None, ""))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Update
    let response = fixture
        .request(json_request(
            "PUT",
            &format!("/api/posts/{id}"),
            Some(&cookie),
            r#"{"title": "Hello again", "content": "<p>second</p>", "published": false}"#,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = json_body(response).await;
    assert_eq!(updated["title"], "Hello again");
    assert_eq!(updated["published"], false);

    // Public listing no longer shows the now-draft post
    let response = fixture
        .request(Request::get("/api/posts").body(Body::empty()).unwrap())
        .await;
    let public = json_body(response).await;
    assert_eq!(public.as_array().unwrap().len(), 0);

    // The admin still sees it
    let response = fixture
        .request(json_request("GET", "/api/posts", Some(&cookie), ""))
        .await;
    let admin_view = json_body(response).await;
    assert_eq!(admin_view.as_array().unwrap().len(), 1);

    // Delete
    let response = fixture
        .request(json_request(
            "DELETE",
            &format!("/api/posts/{id}"),
            Some(&cookie),
            "",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = fixture
        .request(json_request("GET", &format!("/api/posts/{id}"), None, ""))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_blog_pages_render_published_posts() {
    let fixture = TestFixture::new().await;
    let cookie = fixture.login().await;

    fixture
        .request(json_request(
            "POST",
            "/api/posts",
            Some(&cookie),
            r#"{"title": "Visible entry", "content": "<p>public body</p>"}"#,
        ))
        .await;
    fixture
        .request(json_request(
            "POST",
            "/api/posts",
            Some(&cookie),
            r#"{"title": "Secret draft", "content": "<p>hidden</p>", "published": false}"#,
        ))
        .await;

    let response = fixture
        .request(Request::get("/blog").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = text_body(response).await;
    assert!(html.contains("Visible entry"));
    assert!(!html.contains("Secret draft"));

    let response = fixture
        .request(Request::get("/blog/visible-entry").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = text_body(response).await;
    assert!(html.contains("public body"));

    // Draft slugs look exactly like missing posts
    let response = fixture
        .request(Request::get("/blog/secret-draft").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_fix_images_endpoint() {
    let fixture = TestFixture::new().await;
    let cookie = fixture.login().await;

    let content =
        r#"<img src="/uploads/a.png" style="transform: translate(2000px, 9px); filter: invert(1)">"#;
    let body = serde_json::json!({ "title": "Broken image", "content": content }).to_string();
    let response = fixture
        .request(json_request("POST", "/api/posts", Some(&cookie), &body))
        .await;
    let id = json_body(response).await["id"].as_str().unwrap().to_string();

    let response = fixture
        .request(json_request(
            "POST",
            &format!("/api/posts/{id}/fix-images"),
            Some(&cookie),
            "",
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["changed"], true);

    let response = fixture
        .request(json_request("GET", &format!("/api/posts/{id}"), None, ""))
        .await;
    let post = json_body(response).await;
    let cleaned = post["content"].as_str().unwrap();
    assert!(!cleaned.contains("transform"));
    assert!(cleaned.contains("filter: invert(1)"));
    assert!(cleaned.contains("display: block"));
}

#[tokio::test]
async fn test_about_round_trip() {
    let fixture = TestFixture::new().await;
    let cookie = fixture.login().await;

    // Empty before first write
    let response = fixture
        .request(Request::get("/api/about").body(Body::empty()).unwrap())
        .await;
    assert_eq!(json_body(response).await["content"], "");

    // Anonymous writes are rejected
    let response = fixture
        .request(json_request(
            "PUT",
            "/api/about",
            None,
            r#"{"content": "<p>me</p>"}"#,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = fixture
        .request(json_request(
            "PUT",
            "/api/about",
            Some(&cookie),
            r#"{"content": "<p>me</p>"}"#,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = fixture
        .request(Request::get("/about").body(Body::empty()).unwrap())
        .await;
    assert!(text_body(response).await.contains("<p>me</p>"));
}

#[tokio::test]
async fn test_upload_and_serve() {
    let fixture = TestFixture::new().await;
    let cookie = fixture.login().await;

    let boundary = "test-boundary";
    let multipart_body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"photo.png\"\r\n\
         Content-Type: image/png\r\n\r\n\
         fake png bytes\r\n\
         --{boundary}--\r\n"
    );

    // Anonymous uploads are rejected
    let response = fixture
        .request(
            Request::post("/api/uploads")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(multipart_body.clone()))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = fixture
        .request(
            Request::post("/api/uploads")
                .header(header::COOKIE, &cookie)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(multipart_body))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let url = json_body(response).await["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/"));
    assert!(url.ends_with(".png"));

    // The stored file is served back
    let response = fixture
        .request(Request::get(url.as_str()).body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text_body(response).await, "fake png bytes");
}

#[tokio::test]
async fn test_admin_pages_redirect_anonymous() {
    let fixture = TestFixture::new().await;

    for path in ["/admin/dashboard", "/admin/posts", "/admin/about"] {
        let response = fixture
            .request(Request::get(path).body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/admin/login"
        );
    }
}

#[tokio::test]
async fn test_admin_login_form_flow() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .request(
            Request::post("/admin/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("username=admin&password=hunter2"))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/admin/dashboard"
    );
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string();

    let response = fixture
        .request(
            Request::get("/admin/dashboard")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(text_body(response).await.contains("signed in as"));
}

#[tokio::test]
async fn test_admin_login_form_rejects_bad_password() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .request(
            Request::post("/admin/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("username=admin&password=nope"))
                .unwrap(),
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(
        text_body(response)
            .await
            .contains("Invalid username or password")
    );
}

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .request(Request::get("/api/health/db").body(Body::empty()).unwrap())
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["tables"]["posts"], true);
    assert_eq!(body["tables"]["about"], true);
}
