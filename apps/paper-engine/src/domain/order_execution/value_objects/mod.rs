//! Order Execution Value Objects
//!
//! Immutable types for order management.

mod fill;
mod order_side;
mod order_status;
mod order_ticket;
mod order_type;

pub use fill::{Fill, FillKey, Liquidity, weighted_average_price};
pub use order_side::OrderSide;
pub use order_status::OrderStatus;
pub use order_ticket::{MAX_ORDER_NOTIONAL, OrderTicket, bounded_notional};
pub use order_type::OrderType;
