//! Listing query parameters understood by the content backend.
//!
//! The backend accepts CMS-style parameters: `_q` (free-text search),
//! `_sort` (`field` or `field:DESC`), `_start` (offset) and `_limit`, plus
//! per-collection filters. The storefront builds the same structs and turns
//! them into URL pairs with `to_query_pairs`.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Page size when `_limit` is not given.
pub const DEFAULT_LIMIT: u32 = 100;

/// Largest page a single listing request may return.
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A `_sort` value: a field name and a direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SortParseError {
    #[error("sort field cannot be empty")]
    EmptyField,
    #[error("sort field must be alphanumeric or underscore: {0}")]
    InvalidField(String),
    #[error("unknown sort direction: {0}")]
    InvalidDirection(String),
}

impl FromStr for Sort {
    type Err = SortParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (field, direction) = s.trim().split_once(':').unwrap_or((s.trim(), "ASC"));
        let field = field.trim();

        if field.is_empty() {
            return Err(SortParseError::EmptyField);
        }
        if !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(SortParseError::InvalidField(field.to_owned()));
        }

        let direction = match direction.trim().to_ascii_uppercase().as_str() {
            "ASC" | "" => SortDirection::Asc,
            "DESC" => SortDirection::Desc,
            other => return Err(SortParseError::InvalidDirection(other.to_owned())),
        };

        Ok(Self {
            field: field.to_owned(),
            direction,
        })
    }
}

impl TryFrom<String> for Sort {
    type Error = SortParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Sort> for String {
    fn from(sort: Sort) -> Self {
        sort.to_string()
    }
}

impl fmt::Display for Sort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.direction.as_sql())
    }
}

/// Search, sort and window parameters shared by every listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "_q", default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(rename = "_sort", default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
    #[serde(rename = "_start", default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    #[serde(rename = "_limit", default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl ListQuery {
    /// Query for page `page` (zero-based) of `page_size` items.
    #[must_use]
    pub fn page(page: u32, page_size: u32) -> Self {
        Self {
            start: Some(page.saturating_mul(page_size)),
            limit: Some(page_size),
            ..Self::default()
        }
    }

    /// Search term with surrounding whitespace removed; blank means none.
    #[must_use]
    pub fn search(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.start.unwrap_or(0))
    }

    /// Requested limit, defaulted and capped.
    #[must_use]
    pub fn effective_limit(&self) -> i64 {
        i64::from(self.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT))
    }

    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(q) = self.search() {
            pairs.push(("_q", q.to_owned()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("_sort", sort.to_string()));
        }
        if let Some(start) = self.start {
            pairs.push(("_start", start.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("_limit", limit.to_string()));
        }
        pairs
    }
}

/// Product listing parameters: the shared window plus a price range.
///
/// Fields are repeated rather than flattened because URL-encoded query
/// strings cannot carry typed numbers through `#[serde(flatten)]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQuery {
    #[serde(rename = "_q", default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(rename = "_sort", default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
    #[serde(rename = "_start", default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    #[serde(rename = "_limit", default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_gte: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_lte: Option<Decimal>,
}

impl ProductQuery {
    #[must_use]
    pub fn list(&self) -> ListQuery {
        ListQuery {
            q: self.q.clone(),
            sort: self.sort.clone(),
            start: self.start,
            limit: self.limit,
        }
    }

    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = self.list().to_query_pairs();
        if let Some(gte) = self.price_gte {
            pairs.push(("price_gte", gte.to_string()));
        }
        if let Some(lte) = self.price_lte {
            pairs.push(("price_lte", lte.to_string()));
        }
        pairs
    }
}

/// Post listing parameters: the shared window plus a topic filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostQuery {
    #[serde(rename = "_q", default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(rename = "_sort", default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
    #[serde(rename = "_start", default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    #[serde(rename = "_limit", default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
}

impl PostQuery {
    /// Newest-first page of posts matching `q`.
    #[must_use]
    pub fn newest(q: Option<String>, page: u32, page_size: u32) -> Self {
        let window = ListQuery::page(page, page_size);
        Self {
            q,
            sort: Some(Sort::desc("created_at")),
            start: window.start,
            limit: window.limit,
            topic: None,
        }
    }

    #[must_use]
    pub fn list(&self) -> ListQuery {
        ListQuery {
            q: self.q.clone(),
            sort: self.sort.clone(),
            start: self.start,
            limit: self.limit,
        }
    }

    #[must_use]
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = self.list().to_query_pairs();
        if let Some(topic) = self.topic() {
            pairs.push(("topic", topic.to_owned()));
        }
        pairs
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_parse() {
        assert_eq!("price:DESC".parse::<Sort>().unwrap(), Sort::desc("price"));
        assert_eq!("name".parse::<Sort>().unwrap(), Sort::asc("name"));
        assert_eq!("name:asc".parse::<Sort>().unwrap(), Sort::asc("name"));
        assert_eq!(
            "name:sideways".parse::<Sort>(),
            Err(SortParseError::InvalidDirection("SIDEWAYS".to_string()))
        );
        assert!(matches!(
            "name;drop table".parse::<Sort>(),
            Err(SortParseError::InvalidField(_))
        ));
        assert_eq!(":DESC".parse::<Sort>(), Err(SortParseError::EmptyField));
    }

    #[test]
    fn test_limit_defaults_and_caps() {
        assert_eq!(ListQuery::default().effective_limit(), 100);
        let query = ListQuery {
            limit: Some(5000),
            ..ListQuery::default()
        };
        assert_eq!(query.effective_limit(), 100);
        assert_eq!(ListQuery::page(2, 30).offset(), 60);
    }

    #[test]
    fn test_blank_search_is_none() {
        let query = ListQuery {
            q: Some("   ".to_string()),
            ..ListQuery::default()
        };
        assert_eq!(query.search(), None);
        assert!(query.to_query_pairs().is_empty());
    }

    #[test]
    fn test_post_query_pairs() {
        let mut query = PostQuery::newest(Some("rust".to_string()), 1, 30);
        query.topic = Some("news".to_string());
        assert_eq!(
            query.to_query_pairs(),
            vec![
                ("_q", "rust".to_string()),
                ("_sort", "created_at:DESC".to_string()),
                ("_start", "30".to_string()),
                ("_limit", "30".to_string()),
                ("topic", "news".to_string()),
            ]
        );
    }

    #[test]
    fn test_product_query_from_json() {
        let query: ProductQuery = serde_json::from_value(serde_json::json!({
            "_q": "lamp",
            "_sort": "price:DESC",
            "price_gte": "10",
            "price_lte": 50
        }))
        .unwrap();
        assert_eq!(query.sort, Some(Sort::desc("price")));
        assert_eq!(query.price_gte, Some(Decimal::from(10)));
        assert_eq!(query.price_lte, Some(Decimal::from(50)));
        assert_eq!(query.list().search(), Some("lamp"));
    }
}
