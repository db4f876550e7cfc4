//! SQL query constants for the content stores.

pub const INSERT_POST: &str = r#"
    INSERT INTO posts
        (id, slug, title, content, excerpt, published, post_date, year, month, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

pub const UPDATE_POST: &str = r#"
    UPDATE posts SET
        slug = ?,
        title = ?,
        content = ?,
        excerpt = ?,
        published = ?,
        post_date = ?,
        year = ?,
        month = ?,
        updated_at = ?
    WHERE id = ?
"#;

pub const UPDATE_POST_CONTENT: &str = "UPDATE posts SET content = ?, updated_at = ? WHERE id = ?";

pub const SELECT_POST: &str = "SELECT * FROM posts WHERE id = ?";

pub const SELECT_POST_BY_SLUG: &str = "SELECT * FROM posts WHERE slug = ?";

pub const SELECT_ALL_POSTS: &str = "SELECT * FROM posts ORDER BY post_date DESC, created_at DESC";

pub const SELECT_PUBLISHED_POSTS: &str =
    "SELECT * FROM posts WHERE published = 1 ORDER BY post_date DESC, created_at DESC";

pub const SELECT_ARCHIVE_BUCKETS: &str =
    "SELECT year, month FROM posts WHERE published = 1 ORDER BY year DESC, month DESC";

pub const DELETE_POST: &str = "DELETE FROM posts WHERE id = ?";

pub const COUNT_POSTS: &str =
    "SELECT COUNT(*), COALESCE(SUM(published), 0) FROM posts";

pub const SELECT_LATEST_ABOUT: &str =
    "SELECT id, content, updated_at FROM about ORDER BY updated_at DESC LIMIT 1";

pub const INSERT_ABOUT: &str = "INSERT INTO about (id, content, updated_at) VALUES (?, ?, ?)";

pub const UPDATE_ABOUT: &str = "UPDATE about SET content = ?, updated_at = ? WHERE id = ?";

pub const SELECT_RECENT_COMMENTS: &str = r#"
    SELECT
        comments.id, comments.content, comments.created_at,
        comments.post_id, posts.title AS post_title,
        users.username AS author_username
    FROM comments
    JOIN posts ON posts.id = comments.post_id
    LEFT JOIN users ON users.id = comments.author_id
    ORDER BY comments.created_at DESC
    LIMIT ?
"#;

pub const DELETE_COMMENT: &str = "DELETE FROM comments WHERE id = ?";

pub const COUNT_COMMENTS: &str = "SELECT COUNT(*) FROM comments";

pub const SELECT_ALL_USERS: &str = r#"
    SELECT
        users.id, users.username, users.email, users.name, users.role, users.joined_at,
        (SELECT COUNT(*) FROM comments WHERE comments.author_id = users.id) AS comment_count
    FROM users
    ORDER BY users.joined_at DESC
"#;

pub const COUNT_USERS: &str = "SELECT COUNT(*) FROM users";
