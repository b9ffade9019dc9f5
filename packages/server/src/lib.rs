//! Leadline server core.
//!
//! Bulk lead-personalization backend: accepts an uploaded batch of leads,
//! runs a rate-limited fetch + generate pipeline per lead in the background,
//! exposes polling progress, and serves the assembled CSV export.

pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::Config;
