//! CMS pages composed from sections.

use serde::{Deserialize, Serialize};

use crate::section::{Section, deserialize_sections};
use crate::types::PageId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default, deserialize_with = "deserialize_sections")]
    pub content: Vec<Section>,
}
