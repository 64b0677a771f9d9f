//! Position tracking domain errors.

use rust_decimal::Decimal;
use thiserror::Error;

/// Invariant violations on the position aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PositionDomainError {
    /// Quantity must be strictly positive.
    #[error("position quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),

    /// Price must be strictly positive.
    #[error("position price must be positive, got {0}")]
    NonPositivePrice(Decimal),

    /// A reduction would close the whole position or more.
    #[error("cannot reduce {requested} from open quantity {open}")]
    ReduceExceedsOpen {
        /// Quantity requested.
        requested: Decimal,
        /// Quantity open.
        open: Decimal,
    },
}
