//! Shared value objects.

mod identifiers;
mod timestamp;

pub use identifiers::{OrderId, PositionId, SessionId, Symbol, TradeId};
pub use timestamp::Timestamp;
