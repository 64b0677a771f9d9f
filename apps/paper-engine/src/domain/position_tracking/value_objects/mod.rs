//! Position Tracking Value Objects

mod closed_leg;
mod fill_summary;
mod position_event;
mod position_side;

pub use closed_leg::ClosedLeg;
pub use fill_summary::FillSummary;
pub use position_event::{CloseReason, PositionEvent};
pub use position_side::PositionSide;
