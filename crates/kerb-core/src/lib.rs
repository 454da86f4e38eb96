//! Core types for the Kerb household waste and wastewater survey.
//!
//! This crate is deliberately free of HTTP and terminal dependencies. It owns
//! the record model, the fixed survey vocabularies, the derived views over a
//! record set, and the coordinator that keeps an in-memory snapshot in step
//! with the remote store.

pub mod coordinator;
pub mod error;
pub mod record;
pub mod stats;
pub mod store;
pub mod table;
pub mod vocab;

#[cfg(any(test, feature = "testing"))]
pub mod memory;

pub use error::{Error, Result, StoreError, ValidationError};
