//! Seed the content database from a YAML file.
//!
//! Entries go through the backend repositories, so posts and products get the
//! same derived identifiers and reading times as when they are created through
//! the API. Pages are upserted by path and single types are replaced, so those
//! two are safe to re-seed; posts and products are always inserted.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{error, info};

use emporium_backend::BackendConfig;
use emporium_backend::db::{
    self, NewPage, NewPost, NewProduct, PageRepository, PostRepository, ProductRepository,
    SingleType, SingleTypeRepository,
};
use emporium_core::{CookieConfig, GlobalData, Integrations, Section, ShopConfig};

/// Contents of a seed file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedFile {
    /// Keyed by single type name (`global`, `integrations`, `cookies`, `shop`)
    pub single_types: BTreeMap<String, serde_json::Value>,
    pub pages: Vec<NewPage>,
    pub posts: Vec<NewPost>,
    pub products: Vec<NewProduct>,
}

/// Counts reported after seeding.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub single_types: usize,
    pub pages: usize,
    pub posts: usize,
    pub products: usize,
}

impl SeedFile {
    /// Parse a seed file from YAML text.
    ///
    /// # Errors
    ///
    /// Returns the YAML error if the text does not match the seed layout.
    pub fn parse(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Check the file before anything is written; returns one line per problem.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for (name, value) in &self.single_types {
            match name.parse::<SingleType>() {
                Ok(kind) => {
                    if let Err(e) = check_single_type(kind, value) {
                        errors.push(format!("single type {name}: {e}"));
                    }
                }
                Err(e) => errors.push(e.to_string()),
            }
        }

        for page in &self.pages {
            if page.path.trim().is_empty() {
                errors.push("page with an empty path".to_owned());
            }
            for (index, raw) in page.content.iter().enumerate() {
                if Section::from_value(raw.clone()) == Section::Unknown {
                    errors.push(format!("page {}: section {index} is not a known section", page.path));
                }
            }
        }

        for (index, post) in self.posts.iter().enumerate() {
            if post.title.trim().is_empty() {
                errors.push(format!("post {index}: empty title"));
            }
        }

        for (index, product) in self.products.iter().enumerate() {
            if product.name.trim().is_empty() {
                errors.push(format!("product {index}: empty name"));
            }
        }

        errors
    }
}

fn check_single_type(kind: SingleType, value: &serde_json::Value) -> Result<(), serde_json::Error> {
    fn decode<T: DeserializeOwned>(value: &serde_json::Value) -> Result<(), serde_json::Error> {
        T::deserialize(value).map(drop)
    }

    match kind {
        SingleType::Global => decode::<GlobalData>(value),
        SingleType::Integrations => decode::<Integrations>(value),
        SingleType::Cookies => decode::<CookieConfig>(value),
        SingleType::Shop => decode::<ShopConfig>(value),
    }
}

/// Validate `file` and, unless `dry_run`, write its entries.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, validation fails,
/// the configuration is incomplete, or a database write fails.
pub async fn run(file: &Path, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    info!(path = %file.display(), "Loading seed file");
    let text = tokio::fs::read_to_string(file).await?;
    let seed = SeedFile::parse(&text)?;

    let errors = seed.validate();
    if !errors.is_empty() {
        error!("Seed file validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    info!(
        single_types = seed.single_types.len(),
        pages = seed.pages.len(),
        posts = seed.posts.len(),
        products = seed.products.len(),
        "Seed file validated"
    );
    if dry_run {
        return Ok(());
    }

    let config = BackendConfig::from_env()?;
    let pool = db::create_pool(&config.database_url).await?;
    info!("Connected to content database");

    let summary = apply(&pool, &seed).await?;

    info!("Seeding complete!");
    info!("  Single types: {}", summary.single_types);
    info!("  Pages: {}", summary.pages);
    info!("  Posts: {}", summary.posts);
    info!("  Products: {}", summary.products);
    Ok(())
}

async fn apply(pool: &sqlx::PgPool, seed: &SeedFile) -> Result<SeedSummary, db::RepositoryError> {
    let mut summary = SeedSummary::default();

    let single_types = SingleTypeRepository::new(pool);
    for (name, value) in &seed.single_types {
        // Names were checked by validate()
        if let Ok(kind) = name.parse::<SingleType>() {
            single_types.put(kind, value).await?;
            summary.single_types += 1;
        }
    }

    let pages = PageRepository::new(pool);
    for page in &seed.pages {
        pages.upsert(page).await?;
        summary.pages += 1;
    }

    let posts = PostRepository::new(pool);
    for post in &seed.posts {
        let created = posts.create(post).await?;
        info!(identifier = %created.identifier, "Seeded post");
        summary.posts += 1;
    }

    let products = ProductRepository::new(pool);
    for product in &seed.products {
        let created = products.create(product).await?;
        info!(identifier = created.identifier.as_deref().unwrap_or_default(), "Seeded product");
        summary.products += 1;
    }

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_seed_is_valid() {
        let seed = SeedFile::parse(include_str!("../../seed/demo.yaml")).unwrap();
        assert_eq!(seed.validate(), Vec::<String>::new());
        assert_eq!(seed.single_types.len(), 4);
        assert!(seed.pages.iter().any(|page| page.path == "index"));
        assert!(!seed.products[1].available);
    }

    #[test]
    fn test_empty_file_is_valid() {
        let seed = SeedFile::parse("{}").unwrap();
        assert!(seed.validate().is_empty());
        assert!(seed.posts.is_empty());
    }

    #[test]
    fn test_validation_reports_every_problem() {
        let seed = SeedFile::parse(
            r"
single_types:
  colors: {}
  shop:
    maxQuantity: many
pages:
  - path: index
    content:
      - __component: section.carousel
        id: 1
posts:
  - title: '  '
",
        )
        .unwrap();

        let errors = seed.validate();
        assert_eq!(errors.len(), 4, "{errors:?}");
        assert!(errors.iter().any(|e| e.contains("colors")));
        assert!(errors.iter().any(|e| e.starts_with("single type shop")));
        assert!(errors.iter().any(|e| e.contains("section 0")));
        assert!(errors.iter().any(|e| e.contains("empty title")));
    }
}
