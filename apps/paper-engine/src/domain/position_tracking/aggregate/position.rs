//! Position Aggregate
//!
//! An open position in one symbol within one session. Quantity is always
//! strictly positive; the direction is carried by [`PositionSide`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::position_tracking::errors::PositionDomainError;
use crate::domain::position_tracking::services::pnl;
use crate::domain::position_tracking::value_objects::PositionSide;
use crate::domain::shared::{PositionId, SessionId, Symbol, Timestamp};

/// Parameters for reconstituting a position from storage.
#[derive(Debug, Clone)]
pub struct ReconstitutedPositionParams {
    /// Position identifier.
    pub id: PositionId,
    /// Owning session.
    pub session_id: SessionId,
    /// Symbol.
    pub symbol: Symbol,
    /// Direction.
    pub side: PositionSide,
    /// Volume-weighted entry price.
    pub entry_price: Decimal,
    /// Open quantity.
    pub quantity: Decimal,
    /// Entry time.
    pub entry_time: Timestamp,
    /// Cumulative fees.
    pub fees: Decimal,
    /// Last mark-to-market P&L.
    pub unrealized_pnl: Option<Decimal>,
}

/// Position aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    id: PositionId,
    session_id: SessionId,
    symbol: Symbol,
    side: PositionSide,
    entry_price: Decimal,
    quantity: Decimal,
    entry_time: Timestamp,
    fees: Decimal,
    unrealized_pnl: Option<Decimal>,
}

impl Position {
    /// Open a new position.
    ///
    /// # Errors
    ///
    /// Returns error if quantity or price is not positive.
    pub fn open(
        session_id: SessionId,
        symbol: Symbol,
        side: PositionSide,
        entry_price: Decimal,
        quantity: Decimal,
        fees: Decimal,
    ) -> Result<Self, PositionDomainError> {
        if quantity <= Decimal::ZERO {
            return Err(PositionDomainError::NonPositiveQuantity(quantity));
        }
        if entry_price <= Decimal::ZERO {
            return Err(PositionDomainError::NonPositivePrice(entry_price));
        }

        Ok(Self {
            id: PositionId::generate(),
            session_id,
            symbol,
            side,
            entry_price,
            quantity,
            entry_time: Timestamp::now(),
            fees,
            unrealized_pnl: None,
        })
    }

    /// Rebuild a position from stored state.
    #[must_use]
    pub fn reconstitute(params: ReconstitutedPositionParams) -> Self {
        Self {
            id: params.id,
            session_id: params.session_id,
            symbol: params.symbol,
            side: params.side,
            entry_price: params.entry_price,
            quantity: params.quantity,
            entry_time: params.entry_time,
            fees: params.fees,
            unrealized_pnl: params.unrealized_pnl,
        }
    }

    /// Get the position ID.
    #[must_use]
    pub const fn id(&self) -> &PositionId {
        &self.id
    }

    /// Owning session.
    #[must_use]
    pub const fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Get the symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Get the direction.
    #[must_use]
    pub const fn side(&self) -> PositionSide {
        self.side
    }

    /// Volume-weighted entry price.
    #[must_use]
    pub const fn entry_price(&self) -> Decimal {
        self.entry_price
    }

    /// Open quantity (always > 0).
    #[must_use]
    pub const fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// Time the position was opened.
    #[must_use]
    pub const fn entry_time(&self) -> Timestamp {
        self.entry_time
    }

    /// Cumulative fees.
    #[must_use]
    pub const fn fees(&self) -> Decimal {
        self.fees
    }

    /// Last mark-to-market P&L, if marked.
    #[must_use]
    pub const fn unrealized_pnl(&self) -> Option<Decimal> {
        self.unrealized_pnl
    }

    /// Add a same-direction fill, blending the entry price.
    ///
    /// # Errors
    ///
    /// Returns error if quantity or price is not positive.
    pub fn average_in(
        &mut self,
        price: Decimal,
        quantity: Decimal,
        fee: Decimal,
    ) -> Result<(), PositionDomainError> {
        if quantity <= Decimal::ZERO {
            return Err(PositionDomainError::NonPositiveQuantity(quantity));
        }
        if price <= Decimal::ZERO {
            return Err(PositionDomainError::NonPositivePrice(price));
        }

        self.entry_price =
            pnl::weighted_entry_price(self.entry_price, self.quantity, price, quantity);
        self.quantity += quantity;
        self.fees += fee;
        Ok(())
    }

    /// Close part of the position. Only quantity and fees change.
    ///
    /// # Errors
    ///
    /// Returns error unless `0 < quantity < self.quantity`.
    pub fn reduce(&mut self, quantity: Decimal, fee: Decimal) -> Result<(), PositionDomainError> {
        if quantity <= Decimal::ZERO {
            return Err(PositionDomainError::NonPositiveQuantity(quantity));
        }
        if quantity >= self.quantity {
            return Err(PositionDomainError::ReduceExceedsOpen {
                requested: quantity,
                open: self.quantity,
            });
        }

        self.quantity -= quantity;
        self.fees += fee;
        Ok(())
    }

    /// Mark the position to `price`, returning the new unrealized P&L.
    pub fn mark(&mut self, price: Decimal) -> Decimal {
        let unrealized = pnl::gross_pnl(self.side, self.entry_price, price, self.quantity);
        self.unrealized_pnl = Some(unrealized);
        unrealized
    }
}
