//! Single-type configuration blobs.
//!
//! Each single type has exactly one JSONB row. A type that was never saved
//! reads as its default value.

use core::fmt;
use core::str::FromStr;

use serde::de::DeserializeOwned;
use sqlx::PgPool;

use super::RepositoryError;

/// The configuration blobs the CMS keeps exactly one instance of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SingleType {
    Global,
    Integrations,
    Cookies,
    Shop,
}

impl SingleType {
    pub const ALL: [Self; 4] = [Self::Global, Self::Integrations, Self::Cookies, Self::Shop];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Integrations => "integrations",
            Self::Cookies => "cookies",
            Self::Shop => "shop",
        }
    }
}

impl fmt::Display for SingleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown single type: {0}")]
pub struct UnknownSingleType(pub String);

impl FromStr for SingleType {
    type Err = UnknownSingleType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownSingleType(s.to_owned()))
    }
}

/// Repository for single-type blobs.
pub struct SingleTypeRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> SingleTypeRepository<'a> {
    /// Create a new single-type repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the raw JSON stored for `kind`, if any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_raw(
        &self,
        kind: SingleType,
    ) -> Result<Option<serde_json::Value>, RepositoryError> {
        let data = sqlx::query_scalar("SELECT data FROM cms.single_types WHERE name = $1")
            .bind(kind.as_str())
            .fetch_optional(self.pool)
            .await?;

        Ok(data)
    }

    /// Get `kind` decoded into `T`, or `T::default()` when it was never saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored JSON does not fit `T`.
    pub async fn get<T>(&self, kind: SingleType) -> Result<T, RepositoryError>
    where
        T: DeserializeOwned + Default,
    {
        match self.get_raw(kind).await? {
            Some(data) => serde_json::from_value(data).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid {kind} single type: {e}"))
            }),
            None => Ok(T::default()),
        }
    }

    /// Replace the blob stored for `kind`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn put(&self, kind: SingleType, data: &serde_json::Value) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO cms.single_types (name, data)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()
            ",
        )
        .bind(kind.as_str())
        .bind(data)
        .execute(self.pool)
        .await?;

        tracing::info!(single_type = %kind, "Single type saved");
        Ok(())
    }
}
