//! SQLite backend for the turnstile record store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Change notification is push-based:
//! every successful mutation re-queries the ordered record list and
//! broadcasts it to subscribers.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
