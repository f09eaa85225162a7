//! SQLite backend for the ZTRACK contact inbox.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Every call is executed in order on
//! that thread, so each transaction runs to completion before the next one
//! starts.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
