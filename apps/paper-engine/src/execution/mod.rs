//! Order execution simulation and position reconciliation.
//!
//! - [`Exchange`]: validates, stores and fills simulated orders
//! - [`FillModel`]: deterministic slippage and fill synthesis
//! - [`PositionManager`]: turns fills into position lifecycle events

mod exchange;
mod fill_model;
mod position_manager;

pub use exchange::{Exchange, ExchangeError};
pub use fill_model::FillModel;
pub use position_manager::{FeeSchedule, PositionError, PositionManager};
