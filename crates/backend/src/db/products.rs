//! Product repository.
//!
//! Products are addressed publicly by `identifier` (`"{slug}-{id}"`), which
//! can only be assigned after the insert has produced the row id.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, QueryBuilder};

use emporium_core::{File, Image, Product, ProductId, ProductQuery};

use super::{RepositoryError, decode_json, like_pattern, sort_column};
use crate::hooks;

const PRODUCT_COLUMNS: &str =
    "id, identifier, name, description, image, price, images, details, available, documents";

const PRODUCT_LIST_COLUMNS: &str = "id, identifier, name, description, image, price, images, \
                                    NULL::text AS details, available, documents";

const PRODUCT_SORT_COLUMNS: &[&str] = &["id", "name", "price", "created_at", "updated_at"];

/// Product fields accepted on creation; the identifier is derived.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub images: Vec<Image>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default = "default_available", alias = "availible")]
    pub available: bool,
    #[serde(default)]
    pub documents: Vec<File>,
}

const fn default_available() -> bool {
    true
}

/// Partial product update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default, alias = "availible")]
    pub available: Option<bool>,
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    identifier: Option<String>,
    name: String,
    description: Option<String>,
    image: Option<serde_json::Value>,
    price: Option<Decimal>,
    images: serde_json::Value,
    details: Option<String>,
    available: bool,
    documents: serde_json::Value,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ProductId::new(row.id),
            identifier: row.identifier,
            name: Some(row.name),
            description: row.description,
            image: decode_json(row.image, "image")?,
            price: row.price,
            images: decode_json(Some(row.images), "images")?.unwrap_or_default(),
            details: row.details,
            available: Some(row.available),
            documents: decode_json(Some(row.documents), "documents")?.unwrap_or_default(),
        })
    }
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching `query`, without their details.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a JSON column cannot be decoded.
    pub async fn list(&self, query: &ProductQuery) -> Result<Vec<Product>, RepositoryError> {
        let list = query.list();
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_LIST_COLUMNS} FROM cms.products"
        ));
        push_filters(&mut builder, query);

        match sort_column(list.sort.as_ref(), PRODUCT_SORT_COLUMNS) {
            Some((column, direction)) => {
                builder.push(format!(" ORDER BY {column} {direction}, id {direction}"));
            }
            None => {
                builder.push(" ORDER BY id ASC");
            }
        }

        builder
            .push(" LIMIT ")
            .push_bind(list.effective_limit())
            .push(" OFFSET ")
            .push_bind(list.offset());

        let rows = builder
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Get a product by identifier, falling back to its numeric id.
    ///
    /// An exact identifier match wins over an id match.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a JSON column cannot be decoded.
    pub async fn get_by_identifier(&self, key: &str) -> Result<Option<Product>, RepositoryError> {
        let numeric_id = key.parse::<i32>().ok();

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM cms.products
            WHERE identifier = $1 OR id = $2
            ORDER BY COALESCE(identifier = $1, FALSE) DESC
            LIMIT 1
            "
        ))
        .bind(key)
        .bind(numeric_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Get every product whose id is in `ids`; missing ids are simply absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a JSON column cannot be decoded.
    pub async fn get_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let ids: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM cms.products WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Create a product and assign its identifier once the id is known.
    ///
    /// Both statements run in one transaction so a product is never visible
    /// without an identifier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the derived identifier already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO cms.products
                (name, description, image, price, images, details, available, documents)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            ",
        )
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.image.as_ref().map(sqlx::types::Json))
        .bind(product.price)
        .bind(sqlx::types::Json(&product.images))
        .bind(&product.details)
        .bind(product.available)
        .bind(sqlx::types::Json(&product.documents))
        .fetch_one(&mut *tx)
        .await?;

        let identifier = hooks::after_product_create(&product.name, ProductId::new(id));

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "UPDATE cms.products SET identifier = $2 WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(&identifier)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepositoryError::from_write(e, "product identifier"))?;

        tx.commit().await?;

        tracing::info!(product_id = id, identifier = %identifier, "Product created");
        Product::try_from(row)
    }

    /// Apply a partial update; a new name re-derives the identifier.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if the re-derived identifier already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let identifier = hooks::before_product_update(update.name.as_deref(), id);

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE cms.products SET
                identifier = COALESCE($2, identifier),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                details = COALESCE($6, details),
                available = COALESCE($7, available),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&identifier)
        .bind(&update.name)
        .bind(&update.description)
        .bind(update.price)
        .bind(&update.details)
        .bind(update.available)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, "product identifier"))?
        .ok_or(RepositoryError::NotFound)?;

        Product::try_from(row)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ProductQuery) {
    builder.push(" WHERE TRUE");

    if let Some(term) = query.list().search() {
        let pattern = like_pattern(term);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(gte) = query.price_gte {
        builder.push(" AND price >= ").push_bind(gte);
    }
    if let Some(lte) = query.price_lte {
        builder.push(" AND price <= ").push_bind(lte);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_price_range() {
        let query = ProductQuery {
            q: Some("lamp".to_string()),
            price_gte: Some(Decimal::from(10)),
            price_lte: Some(Decimal::from(50)),
            ..ProductQuery::default()
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT id FROM cms.products");
        push_filters(&mut builder, &query);

        assert_eq!(
            builder.sql(),
            "SELECT id FROM cms.products WHERE TRUE AND (name ILIKE $1 OR description ILIKE $2) \
             AND price >= $3 AND price <= $4"
        );
    }

    #[test]
    fn test_new_product_defaults_to_available() {
        let product: NewProduct =
            serde_json::from_value(serde_json::json!({ "name": "Chair", "price": "49.90" }))
                .unwrap();
        assert!(product.available);
        assert_eq!(product.price, Some(Decimal::new(4990, 2)));

        let hidden: NewProduct =
            serde_json::from_value(serde_json::json!({ "name": "Chair", "availible": false }))
                .unwrap();
        assert!(!hidden.available);
    }

    #[test]
    fn test_row_decodes_media_lists() {
        let row = ProductRow {
            id: 5,
            identifier: Some("chair-5".to_string()),
            name: "Chair".to_string(),
            description: None,
            image: None,
            price: Some(Decimal::from(49)),
            images: serde_json::json!([{ "url": "/uploads/chair.jpg" }]),
            details: None,
            available: false,
            documents: serde_json::json!([]),
        };
        let product = Product::try_from(row).unwrap();
        assert_eq!(product.images.len(), 1);
        assert_eq!(product.available, Some(false));
        assert_eq!(product.route_key(), "chair-5");
    }
}
