//! Store adapters that live inside the domain crate for convenience.
//!
//! The in-memory store backs unit tests and local runs. The DynamoDB client
//! lives in its own adapter crate.

pub mod memory_store;
