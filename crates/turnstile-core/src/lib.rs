//! Core types and trait definitions for the turnstile check-in tracker.
//!
//! This crate is deliberately free of UI and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

pub mod error;
pub mod payload;
pub mod record;
pub mod scan;
pub mod store;
pub mod validate;

pub use error::{Error, Result};
