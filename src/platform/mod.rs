//! E-commerce platform integration: webhook signatures, order wire types and
//! the order-detail API client.

mod client;
mod order;
mod signature;

pub use client::*;
pub use order::*;
pub use signature::*;
