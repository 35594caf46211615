//! Domain models for the order API.

pub mod order;

pub use order::{InvalidOrder, NewOrder, Order, PlaceOrderRequest};
