//! Order Execution Bounded Context
//!
//! Manages the lifecycle of simulated orders from placement to a terminal
//! status.
//!
//! # Key Concepts
//!
//! - **Order Aggregate**: The root entity guarding status transitions
//! - **Fills**: Immutable executions, keyed by `(order_id, sequence)`

pub mod aggregate;
pub mod errors;
pub mod services;
pub mod value_objects;

pub use aggregate::{MAX_FILLS_PER_ORDER, Order};
pub use errors::OrderError;
pub use services::OrderStateMachine;
pub use value_objects::{
    Fill, FillKey, Liquidity, MAX_ORDER_NOTIONAL, OrderSide, OrderStatus, OrderTicket, OrderType,
    bounded_notional, weighted_average_price,
};
