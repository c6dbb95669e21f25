//! Contact message repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use emporium_core::{Message, MessageId};

use super::RepositoryError;

/// Repository for contact-form messages.
pub struct MessageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MessageRepository<'a> {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a submitted message and return it with its id and timestamp.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, message: &Message) -> Result<Message, RepositoryError> {
        let (id, created_at): (i32, DateTime<Utc>) = sqlx::query_as(
            r"
            INSERT INTO cms.messages (salutation, first_name, last_name, email, subject, content)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, created_at
            ",
        )
        .bind(&message.salutation)
        .bind(message.first_name.trim())
        .bind(message.last_name.trim())
        .bind(message.email.as_str())
        .bind(&message.subject)
        .bind(&message.content)
        .fetch_one(self.pool)
        .await?;

        Ok(Message {
            id: Some(MessageId::new(id)),
            created_at: Some(created_at),
            ..message.clone()
        })
    }
}
