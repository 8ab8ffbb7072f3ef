//! Google Calendar side: service-account auth, the events client, and
//! normalization from the provider's event shape into [`CanonicalEvent`].
//!
//! [`CanonicalEvent`]: crate::event::CanonicalEvent

pub mod auth;
pub mod client;
pub mod models;
pub mod normalize;

pub use client::CalendarClient;
