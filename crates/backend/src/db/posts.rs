//! Post repository.
//!
//! Listings are built with [`QueryBuilder`] because search, topic and sort are
//! all optional. Sort columns come from a fixed whitelist and are the only
//! values spliced into SQL text.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};

use emporium_core::{Author, Image, Post, PostId, PostQuery};

use super::{RepositoryError, decode_json, like_pattern, sort_column};
use crate::hooks;

const POST_COLUMNS: &str = "id, identifier, title, subtitle, description, keywords, content, \
                            duration, topic, author, image, created_at, updated_at";

const POST_LIST_COLUMNS: &str = "id, identifier, title, subtitle, description, keywords, \
                                 NULL::text AS content, duration, topic, author, image, \
                                 created_at, updated_at";

const POST_SORT_COLUMNS: &[&str] = &[
    "id",
    "title",
    "topic",
    "duration",
    "created_at",
    "updated_at",
];

/// Post fields accepted on creation; identifier and duration are derived.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub image: Option<Image>,
}

/// Partial post update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i32,
    identifier: String,
    title: String,
    subtitle: Option<String>,
    description: Option<String>,
    keywords: Option<String>,
    content: Option<String>,
    duration: i32,
    topic: Option<String>,
    author: Option<serde_json::Value>,
    image: Option<serde_json::Value>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for Post {
    type Error = RepositoryError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PostId::new(row.id),
            identifier: row.identifier,
            title: row.title,
            subtitle: row.subtitle,
            description: row.description,
            keywords: row.keywords,
            content: row.content,
            duration: Some(row.duration),
            topic: row.topic,
            author: decode_json(row.author, "author")?,
            image: decode_json(row.image, "image")?,
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
        })
    }
}

/// Repository for post database operations.
pub struct PostRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PostRepository<'a> {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List posts matching `query`, without their content.
    ///
    /// Unknown sort fields fall back to newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a JSON column cannot be decoded.
    pub async fn list(&self, query: &PostQuery) -> Result<Vec<Post>, RepositoryError> {
        let list = query.list();
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {POST_LIST_COLUMNS} FROM cms.posts"));
        push_filters(&mut builder, query);

        match sort_column(list.sort.as_ref(), POST_SORT_COLUMNS) {
            Some((column, direction)) => {
                builder.push(format!(" ORDER BY {column} {direction}, id {direction}"));
            }
            None => {
                builder.push(" ORDER BY created_at DESC, id DESC");
            }
        }

        builder
            .push(" LIMIT ")
            .push_bind(list.effective_limit())
            .push(" OFFSET ")
            .push_bind(list.offset());

        let rows = builder
            .build_query_as::<PostRow>()
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(Post::try_from).collect()
    }

    /// Count posts matching the filters of `query`; window and sort are ignored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, query: &PostQuery) -> Result<i64, RepositoryError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM cms.posts");
        push_filters(&mut builder, query);

        let count = builder
            .build_query_scalar::<i64>()
            .fetch_one(self.pool)
            .await?;

        Ok(count)
    }

    /// Get a full post, including content, by its identifier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a JSON column cannot be decoded.
    pub async fn get_by_identifier(&self, identifier: &str) -> Result<Option<Post>, RepositoryError> {
        let row = sqlx::query_as::<_, PostRow>(&format!(
            "SELECT {POST_COLUMNS} FROM cms.posts WHERE identifier = $1"
        ))
        .bind(identifier)
        .fetch_optional(self.pool)
        .await?;

        row.map(Post::try_from).transpose()
    }

    /// Create a post, deriving its identifier and reading time.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the derived identifier already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, post: &NewPost) -> Result<Post, RepositoryError> {
        let derived = hooks::before_post_create(&post.title, &post.content, Utc::now());

        let row = sqlx::query_as::<_, PostRow>(&format!(
            r"
            INSERT INTO cms.posts
                (identifier, title, subtitle, description, keywords, content, duration, topic, author, image)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {POST_COLUMNS}
            "
        ))
        .bind(&derived.identifier)
        .bind(&post.title)
        .bind(&post.subtitle)
        .bind(&post.description)
        .bind(&post.keywords)
        .bind(&post.content)
        .bind(derived.duration)
        .bind(&post.topic)
        .bind(post.author.as_ref().map(sqlx::types::Json))
        .bind(post.image.as_ref().map(sqlx::types::Json))
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "post identifier"))?;

        tracing::info!(post_id = row.id, identifier = %row.identifier, "Post created");
        Post::try_from(row)
    }

    /// Apply a partial update, re-deriving identifier and duration as needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the post does not exist.
    /// Returns `RepositoryError::Conflict` if the re-derived identifier already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(&self, id: PostId, update: &PostUpdate) -> Result<Post, RepositoryError> {
        let previous: Option<String> =
            sqlx::query_scalar("SELECT identifier FROM cms.posts WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;
        let previous = previous.ok_or(RepositoryError::NotFound)?;

        let rederived = hooks::before_post_update(
            update.title.as_deref(),
            update.content.as_deref(),
            &previous,
            Utc::now(),
        );

        let row = sqlx::query_as::<_, PostRow>(&format!(
            r"
            UPDATE cms.posts SET
                identifier = COALESCE($2, identifier),
                title = COALESCE($3, title),
                subtitle = COALESCE($4, subtitle),
                description = COALESCE($5, description),
                keywords = COALESCE($6, keywords),
                content = COALESCE($7, content),
                duration = COALESCE($8, duration),
                topic = COALESCE($9, topic),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&rederived.identifier)
        .bind(&update.title)
        .bind(&update.subtitle)
        .bind(&update.description)
        .bind(&update.keywords)
        .bind(&update.content)
        .bind(rederived.duration)
        .bind(&update.topic)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "post identifier"))?
        .ok_or(RepositoryError::NotFound)?;

        Post::try_from(row)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &PostQuery) {
    builder.push(" WHERE TRUE");

    if let Some(term) = query.list().search() {
        let pattern = like_pattern(term);
        builder.push(" AND (");
        let mut columns = builder.separated(" OR ");
        for column in ["title", "subtitle", "description", "content"] {
            columns
                .push(format!("{column} ILIKE "))
                .push_bind_unseparated(pattern.clone());
        }
        builder.push(")");
    }

    if let Some(topic) = query.topic() {
        builder.push(" AND topic = ").push_bind(topic.to_owned());
    }
}
