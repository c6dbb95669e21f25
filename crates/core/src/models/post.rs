//! Blog posts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::media::Image;
use crate::types::PostId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub id: Option<i32>,
    pub name: String,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
}

/// A blog post. List endpoints omit `content`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub identifier: String,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    /// Estimated reading time in minutes.
    #[serde(default)]
    pub duration: Option<i32>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
