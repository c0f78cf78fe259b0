//! Database layer - connection pool, error classification, repositories
//!
//! - Connection pool with a bounded size and startup retries
//! - Every sqlx failure becomes a `StoreError` kind
//! - Schema changes are raw SQL files applied by `migrate`

pub mod migrate;
pub mod pool;
pub mod repos;
pub mod store;

pub use pool::create_pool;
pub use repos::*;
pub use store::{BackendDetail, StoreError};
