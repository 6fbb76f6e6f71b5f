//! Testing utilities for the crudcheck harness.
//!
//! Provides an in-process items service speaking the same HTTP contract as the
//! real one, backed by an in-memory store the harness can also query directly.

pub mod error;
pub mod server;
pub mod store;

pub use error::TestError;
pub use server::{ItemsService, RunningService};
pub use store::InMemoryItemStore;
