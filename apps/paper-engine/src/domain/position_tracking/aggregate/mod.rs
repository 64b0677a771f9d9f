//! Position Aggregate

mod position;

pub use position::{Position, ReconstitutedPositionParams};
