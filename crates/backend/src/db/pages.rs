//! Page repository.
//!
//! Pages are looked up by their URL path. Section content is stored as a JSONB
//! array and decoded leniently, so one bad section never hides a whole page.

use serde::Deserialize;
use sqlx::PgPool;

use emporium_core::{Page, PageId, section::Section};

use super::RepositoryError;

/// Page fields accepted when seeding or editing content.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPage {
    pub path: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub content: Vec<serde_json::Value>,
}

#[derive(sqlx::FromRow)]
struct PageRow {
    id: i32,
    path: String,
    title: Option<String>,
    subtitle: Option<String>,
    description: Option<String>,
    keywords: Option<String>,
    content: serde_json::Value,
}

impl TryFrom<PageRow> for Page {
    type Error = RepositoryError;

    fn try_from(row: PageRow) -> Result<Self, Self::Error> {
        let entries = match row.content {
            serde_json::Value::Array(entries) => entries,
            serde_json::Value::Null => Vec::new(),
            other => {
                return Err(RepositoryError::DataCorruption(format!(
                    "page {} content is not an array: {other}",
                    row.id
                )));
            }
        };

        Ok(Self {
            id: PageId::new(row.id),
            path: Some(row.path),
            title: row.title,
            subtitle: row.subtitle,
            description: row.description,
            keywords: row.keywords,
            content: entries.into_iter().map(Section::from_value).collect(),
        })
    }
}

/// Repository for page database operations.
pub struct PageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PageRepository<'a> {
    /// Create a new page repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the page published at `path`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored content is not an array.
    pub async fn get_by_path(&self, path: &str) -> Result<Option<Page>, RepositoryError> {
        let row = sqlx::query_as::<_, PageRow>(
            r"
            SELECT id, path, title, subtitle, description, keywords, content
            FROM cms.pages
            WHERE path = $1
            ",
        )
        .bind(normalize_path(path))
        .fetch_optional(self.pool)
        .await?;

        row.map(Page::try_from).transpose()
    }

    /// Insert a page or replace the one at the same path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert(&self, page: &NewPage) -> Result<Page, RepositoryError> {
        let row = sqlx::query_as::<_, PageRow>(
            r"
            INSERT INTO cms.pages (path, title, subtitle, description, keywords, content)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (path) DO UPDATE SET
                title = EXCLUDED.title,
                subtitle = EXCLUDED.subtitle,
                description = EXCLUDED.description,
                keywords = EXCLUDED.keywords,
                content = EXCLUDED.content,
                updated_at = NOW()
            RETURNING id, path, title, subtitle, description, keywords, content
            ",
        )
        .bind(normalize_path(&page.path))
        .bind(&page.title)
        .bind(&page.subtitle)
        .bind(&page.description)
        .bind(&page.keywords)
        .bind(serde_json::Value::Array(page.content.clone()))
        .fetch_one(self.pool)
        .await?;

        Page::try_from(row)
    }
}

/// Paths are stored without leading or trailing slashes.
fn normalize_path(path: &str) -> &str {
    path.trim_matches('/')
}
