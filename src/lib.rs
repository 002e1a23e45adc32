//! Affiliate order attribution for the storefront.
//!
//! Receives signed order webhooks from the e-commerce platform, fetches the
//! authoritative order, resolves which partner referred it, and records (or
//! reverses) the partner's commission.

pub mod attribution;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod platform;
