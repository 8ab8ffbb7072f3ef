pub mod config;
pub mod credentials;
pub mod error;
pub mod event;
pub mod google;
pub mod notion;
pub mod reconcile;
pub mod retry;
pub mod startup;
pub mod window;
