//! Orders as stored and as sent over the wire.
//!
//! Clients send a [`PlaceOrderRequest`]; the server stamps it with the caller's
//! uid and the current time to get a [`NewOrder`], and the store hands back the
//! persisted [`Order`]. Orders are never updated or deleted.

use chrono::{DateTime, Utc};
use fresh_cart_core::{
    Amount, AmountError, OrderId, ProductId, ProductIdError, Quantity, QuantityError, Uid,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A placed order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// Owner, always taken from the verified identity.
    pub user_id: Uid,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub amount: Amount,
    /// Server clock at placement.
    pub order_time: DateTime<Utc>,
}

/// Body of `POST /api/orders`.
///
/// Only the fields a client may choose. Anything else in the body
/// (`id`, `userId`, `orderTime`) is ignored.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub product_id: String,
    pub quantity: i32,
    pub amount: Decimal,
}

/// A validated order that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: Uid,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub amount: Amount,
    pub order_time: DateTime<Utc>,
}

/// Order contents that fail validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidOrder {
    #[error(transparent)]
    ProductId(#[from] ProductIdError),
    #[error(transparent)]
    Quantity(#[from] QuantityError),
    #[error(transparent)]
    Amount(#[from] AmountError),
}

impl PlaceOrderRequest {
    /// Validate the request and stamp it with owner and time.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOrder` if the product id is blank, the quantity is not
    /// positive, or the amount is negative, finer than a cent or too large to
    /// store.
    pub fn into_new_order(
        self,
        user_id: Uid,
        order_time: DateTime<Utc>,
    ) -> Result<NewOrder, InvalidOrder> {
        Ok(NewOrder {
            user_id,
            product_id: ProductId::parse(&self.product_id)?,
            quantity: Quantity::new(self.quantity)?,
            amount: Amount::new(self.amount)?,
            order_time,
        })
    }
}
