//! Notion side: the database client with exhaustive query pagination,
//! typed property payloads, and normalization from pages into
//! [`DatabaseRecord`]s.
//!
//! [`DatabaseRecord`]: crate::event::DatabaseRecord

pub mod client;
pub mod models;
pub mod normalize;

pub use client::NotionClient;
