//! telectl-server: PostgreSQL repositories and HTTP API
//!
//! Stores log pipelines and ingestion rules, tracks their deployment state
//! and serves them over a small JSON API.

pub mod db;
pub mod http;

pub use db::{create_pool, DbError};
pub use http::{run_server, ServerConfig};
