//! Core types for Fresh Cart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod amount;
pub mod id;
pub mod identity;
pub mod product;
pub mod quantity;

pub use amount::{Amount, AmountError};
pub use id::*;
pub use identity::{Identity, Uid, UidError};
pub use product::{ProductId, ProductIdError};
pub use quantity::{Quantity, QuantityError};
