//! Application Ports (Driven)
//!
//! Ports define interfaces for interacting with external systems.
//! - **Driven Ports** (Secondary/Outbound): How our application uses external systems

mod order_store_port;
mod position_store_port;
mod store_error;

pub use order_store_port::{OrderStatusUpdate, OrderStorePort};
pub use position_store_port::PositionStorePort;
pub use store_error::StoreError;
