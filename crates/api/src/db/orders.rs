//! Order repository.
//!
//! [`OrderStore`] is the seam between the HTTP layer and persistence, so route
//! tests can run against an in-memory store. [`PgOrderStore`] is the real one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fresh_cart_core::{Amount, OrderId, ProductId, Quantity, Uid};
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::{NewOrder, Order};

/// Persistence operations for orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Store a validated order and return it with its generated id.
    async fn insert(&self, order: NewOrder) -> Result<Order, RepositoryError>;

    /// All orders owned by `user_id`, newest first.
    async fn list_by_user(&self, user_id: &Uid) -> Result<Vec<Order>, RepositoryError>;

    /// Total number of orders across all users.
    async fn count(&self) -> Result<i64, RepositoryError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// `PostgreSQL`-backed order store.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Create a new order store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: String,
    product_id: String,
    quantity: i32,
    amount: Decimal,
    order_time: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, e: &dyn std::fmt::Display| {
            RepositoryError::DataCorruption(format!("invalid {field} in order {}: {e}", row.id))
        };

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: Uid::parse(&row.user_id).map_err(|e| corrupt("user_id", &e))?,
            product_id: ProductId::parse(&row.product_id).map_err(|e| corrupt("product_id", &e))?,
            quantity: Quantity::new(row.quantity).map_err(|e| corrupt("quantity", &e))?,
            amount: Amount::new(row.amount).map_err(|e| corrupt("amount", &e))?,
            order_time: row.order_time,
        })
    }
}

const ORDER_COLUMNS: &str = "id, user_id, product_id, quantity, amount, order_time";

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO orders (user_id, product_id, quantity, amount, order_time)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order.user_id.as_str())
        .bind(order.product_id.as_str())
        .bind(order.quantity.get())
        .bind(order.amount.value())
        .bind(order.order_time)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn list_by_user(&self, user_id: &Uid) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE user_id = $1
            ORDER BY order_time DESC, id DESC
            "
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
