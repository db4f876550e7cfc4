//! Post storage: authoring, listing, and the public archive.

use crate::db::DbPool;
use crate::sql;
use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Serialize;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

/// A journal post.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: String,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub published: bool,
    pub post_date: DateTime<Utc>,
    pub year: i32,
    pub month: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating or editing a post.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub published: bool,
    /// Displayed date of the entry; defaults to now when absent.
    pub post_date: Option<DateTime<Utc>>,
}

/// Listing filters for the public blog page.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub search: Option<String>,
}

/// One year of the archive sidebar, with the months that have posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveBucket {
    pub year: i32,
    pub months: Vec<u32>,
}

/// Database-backed storage for posts.
pub struct PostStore {
    pool: DbPool,
}

impl PostStore {
    /// Create a new PostStore using the given database pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Generate a post ID.
    fn generate_id() -> String {
        rand::rng()
            .sample_iter(&Alphanumeric)
            .take(24)
            .map(char::from)
            .collect::<String>()
            .to_lowercase()
    }

    /// Derive a URL slug from a title: lowercase, non-alphanumerics
    /// collapsed into single dashes.
    pub fn slugify(title: &str) -> String {
        let mut slug = String::with_capacity(title.len());
        let mut last_dash = true;
        for c in title.chars() {
            if c.is_alphanumeric() {
                slug.extend(c.to_lowercase());
                last_dash = false;
            } else if !last_dash {
                slug.push('-');
                last_dash = true;
            }
        }
        let slug = slug.trim_end_matches('-').to_string();
        if slug.is_empty() {
            "untitled".to_string()
        } else {
            slug
        }
    }

    /// Create a new post. The slug is derived from the title, with a
    /// random suffix when the derived slug is already taken.
    pub async fn create(&self, draft: &PostDraft) -> Result<Post> {
        let id = Self::generate_id();
        let now = Utc::now();
        let post_date = draft.post_date.unwrap_or(now);

        let mut slug = Self::slugify(&draft.title);
        if self.get_by_slug(&slug).await?.is_some() {
            let suffix: String = rand::rng()
                .sample_iter(&Alphanumeric)
                .take(6)
                .map(char::from)
                .collect::<String>()
                .to_lowercase();
            slug = format!("{slug}-{suffix}");
        }

        let post = Post {
            id,
            slug,
            title: draft.title.clone(),
            content: draft.content.clone(),
            excerpt: draft.excerpt.clone(),
            published: draft.published,
            post_date,
            year: post_date.year(),
            month: post_date.month(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(sql::INSERT_POST)
            .bind(&post.id)
            .bind(&post.slug)
            .bind(&post.title)
            .bind(&post.content)
            .bind(&post.excerpt)
            .bind(post.published as i32)
            .bind(post.post_date.to_rfc3339())
            .bind(post.year)
            .bind(post.month as i32)
            .bind(post.created_at.to_rfc3339())
            .bind(post.updated_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .context("Failed to create post")?;

        Ok(post)
    }

    /// Update an existing post. The slug is preserved so published URLs
    /// keep working across edits.
    pub async fn update(&self, id: &str, draft: &PostDraft) -> Result<Option<Post>> {
        let existing = match self.get(id).await? {
            Some(p) => p,
            None => return Ok(None),
        };

        let now = Utc::now();
        let post_date = draft.post_date.unwrap_or(existing.post_date);

        let post = Post {
            id: existing.id,
            slug: existing.slug,
            title: draft.title.clone(),
            content: draft.content.clone(),
            excerpt: draft.excerpt.clone(),
            published: draft.published,
            post_date,
            year: post_date.year(),
            month: post_date.month(),
            created_at: existing.created_at,
            updated_at: now,
        };

        sqlx::query(sql::UPDATE_POST)
            .bind(&post.slug)
            .bind(&post.title)
            .bind(&post.content)
            .bind(&post.excerpt)
            .bind(post.published as i32)
            .bind(post.post_date.to_rfc3339())
            .bind(post.year)
            .bind(post.month as i32)
            .bind(post.updated_at.to_rfc3339())
            .bind(&post.id)
            .execute(&self.pool)
            .await
            .context("Failed to update post")?;

        Ok(Some(post))
    }

    /// Replace only the stored content of a post (content sanitation).
    pub async fn update_content(&self, id: &str, content: &str) -> Result<bool> {
        let result = sqlx::query(sql::UPDATE_POST_CONTENT)
            .bind(content)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update post content")?;

        Ok(result.rows_affected() > 0)
    }

    /// Get a post by ID.
    pub async fn get(&self, id: &str) -> Result<Option<Post>> {
        let row = sqlx::query(sql::SELECT_POST)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query post")?;

        row.map(row_to_post).transpose()
    }

    /// Get a post by slug.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        let row = sqlx::query(sql::SELECT_POST_BY_SLUG)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query post by slug")?;

        row.map(row_to_post).transpose()
    }

    /// List all posts, drafts included, newest first.
    pub async fn list_all(&self) -> Result<Vec<Post>> {
        let rows = sqlx::query(sql::SELECT_ALL_POSTS)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list posts")?;

        rows.into_iter().map(row_to_post).collect()
    }

    /// List published posts, newest first, with optional year/month/search
    /// filters applied.
    pub async fn list_published(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        let rows = sqlx::query(sql::SELECT_PUBLISHED_POSTS)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list published posts")?;

        let posts: Vec<Post> = rows.into_iter().map(row_to_post).collect::<Result<_>>()?;

        let needle = filter
            .search
            .as_ref()
            .map(|s| s.to_lowercase())
            .filter(|s| !s.is_empty());

        Ok(posts
            .into_iter()
            .filter(|p| filter.year.is_none_or(|y| p.year == y))
            .filter(|p| filter.month.is_none_or(|m| p.month == m))
            .filter(|p| {
                needle.as_ref().is_none_or(|n| {
                    p.title.to_lowercase().contains(n)
                        || p.content.to_lowercase().contains(n)
                        || p.excerpt
                            .as_ref()
                            .is_some_and(|e| e.to_lowercase().contains(n))
                })
            })
            .collect())
    }

    /// The year/month buckets that have published posts, newest first.
    pub async fn archive(&self) -> Result<Vec<ArchiveBucket>> {
        let rows = sqlx::query(sql::SELECT_ARCHIVE_BUCKETS)
            .fetch_all(&self.pool)
            .await
            .context("Failed to query archive buckets")?;

        let mut buckets: Vec<ArchiveBucket> = Vec::new();
        for row in rows {
            let year: i32 = row.get("year");
            let month: u32 = row.get::<i32, _>("month") as u32;
            match buckets.last_mut() {
                Some(bucket) if bucket.year == year => {
                    if !bucket.months.contains(&month) {
                        bucket.months.push(month);
                    }
                }
                _ => buckets.push(ArchiveBucket {
                    year,
                    months: vec![month],
                }),
            }
        }
        Ok(buckets)
    }

    /// Delete a post. Returns false when no such post exists.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let result = sqlx::query(sql::DELETE_POST)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete post")?;

        Ok(result.rows_affected() > 0)
    }

    /// Total and published post counts, for the dashboard.
    pub async fn counts(&self) -> Result<(i64, i64)> {
        let row = sqlx::query(sql::COUNT_POSTS)
            .fetch_one(&self.pool)
            .await
            .context("Failed to count posts")?;

        Ok((row.get(0), row.get(1)))
    }
}

fn row_to_post(row: SqliteRow) -> Result<Post> {
    Ok(Post {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        content: row.get("content"),
        excerpt: row.get("excerpt"),
        published: row.get::<i32, _>("published") != 0,
        post_date: parse_timestamp(row.get("post_date"))?,
        year: row.get("year"),
        month: row.get::<i32, _>("month") as u32,
        created_at: parse_timestamp(row.get("created_at"))?,
        updated_at: parse_timestamp(row.get("updated_at"))?,
    })
}

pub(crate) fn parse_timestamp(value: String) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .with_context(|| format!("Invalid timestamp: {value}"))
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::db::Database;
    use chrono::TimeZone;
    use tempfile::TempDir;

    async fn store() -> (TempDir, PostStore) {
        let temp = TempDir::new().unwrap();
        let db = Database::new(&DatabaseConfig::default(), temp.path())
            .await
            .unwrap();
        (temp, PostStore::new(db.pool()))
    }

    fn draft(title: &str, published: bool) -> PostDraft {
        PostDraft {
            title: title.to_string(),
            content: format!("<p>{title}</p>"),
            excerpt: None,
            published,
            post_date: None,
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(PostStore::slugify("Hello, World!"), "hello-world");
        assert_eq!(PostStore::slugify("  a  b  "), "a-b");
        assert_eq!(PostStore::slugify("???"), "untitled");
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_temp, store) = store().await;
        let post = store.create(&draft("First entry", true)).await.unwrap();

        assert_eq!(post.slug, "first-entry");
        assert_eq!(post.year, post.post_date.year());

        let fetched = store.get(&post.id).await.unwrap().unwrap();
        assert_eq!(fetched.title, "First entry");
        assert!(fetched.published);

        let by_slug = store.get_by_slug("first-entry").await.unwrap().unwrap();
        assert_eq!(by_slug.id, post.id);
    }

    #[tokio::test]
    async fn test_slug_collision_gets_suffix() {
        let (_temp, store) = store().await;
        let a = store.create(&draft("Same title", true)).await.unwrap();
        let b = store.create(&draft("Same title", true)).await.unwrap();

        assert_eq!(a.slug, "same-title");
        assert_ne!(a.slug, b.slug);
        assert!(b.slug.starts_with("same-title-"));
    }

    #[tokio::test]
    async fn test_update_preserves_slug() {
        let (_temp, store) = store().await;
        let post = store.create(&draft("Original", true)).await.unwrap();

        let updated = store
            .update(&post.id, &draft("Renamed entirely", false))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.slug, "original");
        assert_eq!(updated.title, "Renamed entirely");
        assert!(!updated.published);

        assert!(store.update("missing", &draft("x", false)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_published_filtering_and_search() {
        let (_temp, store) = store().await;
        store.create(&draft("Public one", true)).await.unwrap();
        store.create(&draft("Hidden draft", false)).await.unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.len(), 2);

        let published = store.list_published(&PostFilter::default()).await.unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].title, "Public one");

        let hits = store
            .list_published(&PostFilter {
                search: Some("PUBLIC".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);

        let misses = store
            .list_published(&PostFilter {
                search: Some("nothing".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(misses.is_empty());
    }

    #[tokio::test]
    async fn test_archive_buckets() {
        let (_temp, store) = store().await;
        let date = |y, m| Utc.with_ymd_and_hms(y, m, 5, 12, 0, 0).unwrap();

        for (y, m) in [(2024, 12), (2024, 12), (2024, 3), (2023, 7)] {
            store
                .create(&PostDraft {
                    post_date: Some(date(y, m)),
                    ..draft("entry", true)
                })
                .await
                .unwrap();
        }
        // Drafts stay out of the archive
        store
            .create(&PostDraft {
                post_date: Some(date(2022, 1)),
                ..draft("draft", false)
            })
            .await
            .unwrap();

        let archive = store.archive().await.unwrap();
        assert_eq!(
            archive,
            vec![
                ArchiveBucket {
                    year: 2024,
                    months: vec![12, 3]
                },
                ArchiveBucket {
                    year: 2023,
                    months: vec![7]
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_and_counts() {
        let (_temp, store) = store().await;
        let post = store.create(&draft("Going away", true)).await.unwrap();
        store.create(&draft("Staying", false)).await.unwrap();

        assert_eq!(store.counts().await.unwrap(), (2, 1));
        assert!(store.delete(&post.id).await.unwrap());
        assert!(!store.delete(&post.id).await.unwrap());
        assert_eq!(store.counts().await.unwrap(), (1, 0));
    }
}
