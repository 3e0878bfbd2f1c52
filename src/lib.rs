//! AdCraft ad-composition service library
//!
//! Modules:
//! - `api`: Axum HTTP handlers, shared state and router setup.
//! - `supabase`: Thin client for the hosted tables and storage buckets.
//! - `webhook`: Outbound call to the image-composition webhook.
//! - `service`: Template, execution, upload and result operations used by
//!   both the server and `adcraftctl`.
//! - `models`: Table row shapes.
//! - `utils`: Object naming, data URLs and image reference extraction.
//! - `config`: Env-driven configuration loader.
//! - `error`: Common error type and alias.
//!
//! Re-exports are provided for common types: `Config`, `AppState`,
//! `SupabaseClient` and `WebhookClient`.
pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod supabase;
pub mod utils;
pub mod webhook;

pub use api::routes::{build_router, AppState};
pub use config::Config;
pub use supabase::client::SupabaseClient;
pub use webhook::client::WebhookClient;
