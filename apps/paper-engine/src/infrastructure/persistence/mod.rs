//! Persistence Adapters
//!
//! Implementations of the store ports.

pub mod in_memory;

pub use in_memory::{InMemoryTradeStore, StoreOperation};
