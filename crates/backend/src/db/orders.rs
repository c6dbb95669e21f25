//! Order repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use emporium_core::{Order, OrderId};

use super::RepositoryError;

/// Repository for checkout orders.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store an order as given; totals must already be computed by the caller.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, order: &Order) -> Result<Order, RepositoryError> {
        let (id, created_at): (i32, DateTime<Utc>) = sqlx::query_as(
            r"
            INSERT INTO cms.orders
                (first_name, last_name, email, shipping_country, total_price, shipping_price, items)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, created_at
            ",
        )
        .bind(order.first_name.trim())
        .bind(order.last_name.trim())
        .bind(order.email.as_str())
        .bind(&order.shipping_country)
        .bind(order.total_price)
        .bind(order.shipping_price)
        .bind(sqlx::types::Json(&order.items))
        .fetch_one(self.pool)
        .await?;

        tracing::info!(
            order_id = id,
            items = order.item_count(),
            total_price = %order.total_price,
            "Order stored"
        );

        Ok(Order {
            id: Some(OrderId::new(id)),
            created_at: Some(created_at),
            ..order.clone()
        })
    }
}
