//! Command implementations for the telectl CLI

pub mod attributes;
pub mod client;
#[cfg(feature = "server")]
pub mod migrate;
pub mod pipelines;
pub mod rules;
#[cfg(feature = "server")]
pub mod serve;

// Re-export main dispatcher functions for flat access from main.rs
pub use attributes::run_attributes;
#[cfg(feature = "server")]
pub use migrate::run_migrate;
pub use pipelines::run_pipelines;
pub use rules::run_rules;
#[cfg(feature = "server")]
pub use serve::run_serve;
