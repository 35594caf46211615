//! Business logic services.
//!
//! - `orders` - Placing orders and reading order history for the verified caller

pub mod orders;

pub use orders::{OrderError, OrderService};
