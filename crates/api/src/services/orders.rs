//! Order service.
//!
//! The owner of an order is always the verified identity of the request,
//! and the timestamp is always the server clock. Nothing the client sends
//! can change either.

use chrono::Utc;
use fresh_cart_core::Identity;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::db::{OrderStore, RepositoryError};
use crate::error::{AppError, add_breadcrumb};
use crate::models::{InvalidOrder, Order, PlaceOrderRequest};

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The order contents failed validation.
    #[error(transparent)]
    Invalid(#[from] InvalidOrder),

    /// The store failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Invalid(e) => Self::BadRequest(e.to_string()),
            OrderError::Repository(e) => Self::Database(e),
        }
    }
}

/// Order operations on behalf of one verified caller.
pub struct OrderService<'a> {
    store: &'a dyn OrderStore,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(store: &'a dyn OrderStore) -> Self {
        Self { store }
    }

    /// Place an order owned by `identity`.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Invalid` if the request fails validation.
    /// Returns `OrderError::Repository` if the order cannot be stored.
    #[instrument(skip_all, fields(uid = %identity.uid()))]
    pub async fn place_order(
        &self,
        identity: &Identity,
        request: PlaceOrderRequest,
    ) -> Result<Order, OrderError> {
        let new_order = request.into_new_order(identity.uid().clone(), Utc::now())?;

        add_breadcrumb(
            "orders",
            "Placing order",
            &[("product_id", new_order.product_id.to_string())],
        );

        let order = self.store.insert(new_order).await.inspect_err(|e| {
            error!(error = %e, "Failed to save order");
        })?;

        info!(order_id = %order.id, "Order saved");
        Ok(order)
    }

    /// Orders owned by `identity`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the store fails.
    #[instrument(skip_all, fields(uid = %identity.uid()))]
    pub async fn history(&self, identity: &Identity) -> Result<Vec<Order>, OrderError> {
        let orders = self
            .store
            .list_by_user(identity.uid())
            .await
            .inspect_err(|e| {
                error!(error = %e, "Failed to fetch order history");
            })?;

        info!(count = orders.len(), "Fetched order history");
        Ok(orders)
    }
}
