//! Database layer - connection pool, schema and repositories
//!
//! - One shared PgPool; repositories borrow it per request
//! - One statement per repository call, except agent config version creation
//! - Rely on DB constraints (primary keys, unique version numbers) for
//!   conflicts instead of check-then-insert

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repos;
pub mod rows;

pub use error::DbError;
pub use pool::{create_pool, create_pool_with_options};
pub use repos::*;
pub use rows::{Listing, RowError};
