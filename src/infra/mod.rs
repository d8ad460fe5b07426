//! Infrastructure adapters for request and allocation storage backends.

pub mod store;

pub use store::memory::{InMemoryAllocations, InMemoryLedger};
pub use store::postgres::{PostgresAllocations, PostgresLedger};
