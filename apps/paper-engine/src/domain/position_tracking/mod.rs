//! Position Tracking Bounded Context
//!
//! Turns filled orders into position lifecycle events: open, average,
//! partial close, full close and flip.

pub mod aggregate;
pub mod errors;
pub mod services;
pub mod value_objects;

pub use aggregate::{Position, ReconstitutedPositionParams};
pub use errors::PositionDomainError;
pub use services::{PositionReconciler, ReconcileAction};
pub use value_objects::{ClosedLeg, CloseReason, FillSummary, PositionEvent, PositionSide};
