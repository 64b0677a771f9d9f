//! Domain Layer
//!
//! The innermost layer containing business logic with zero infrastructure dependencies.
//! This layer defines:
//!
//! - **Aggregates**: Consistency boundaries with invariants
//! - **Value Objects**: Immutable domain types with equality by value
//! - **Domain Services**: Stateless business logic
//!
//! # Bounded Contexts
//!
//! - [`order_execution`]: Simulated order lifecycle
//! - [`position_tracking`]: Position lifecycle and P&L accounting

pub mod order_execution;
pub mod position_tracking;
pub mod shared;
