// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::items_after_statements
    )
)]

//! Paper Engine - Rust Core Library
//!
//! Order-execution simulator and position reconciliation for a
//! paper-trading backend.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic (aggregates, value objects)
//!   - `order_execution`: Order aggregate, status lifecycle, fills
//!   - `position_tracking`: Position aggregate, P&L, fill reconciliation plan
//!
//! - **Application**: Ports and DTOs
//!   - `ports`: `OrderStorePort`, `PositionStorePort`
//!   - `dto`: `PlaceOrderRequest`, `PlaceOrderResult`
//!
//! - **Execution**: Stateful services
//!   - `Exchange`: simulated venue (slippage, depth walk, cancel)
//!   - `PositionManager`: fills into position lifecycle events
//!
//! - **Resilience**: Error classification and cancellable retry/backoff
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `persistence`: In-memory trade store
//!   - `config`: Dependency injection container

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Port and DTO definitions.
pub mod application;

/// Execution layer - Exchange simulator and position manager.
pub mod execution;

/// Infrastructure layer - Adapters and wiring.
pub mod infrastructure;

// =============================================================================
// Cross-cutting
// =============================================================================

/// YAML configuration with environment interpolation.
pub mod config;

/// Stable error codes for external adapters.
pub mod error;

/// Error classification and retry with backoff.
pub mod resilience;

/// Tracing subscriber setup.
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

// Domain re-exports
pub use domain::order_execution::{
    Fill, FillKey, Order, OrderSide, OrderStatus, OrderTicket, OrderType,
};
pub use domain::position_tracking::{ClosedLeg, CloseReason, Position, PositionEvent, PositionSide};
pub use domain::shared::{OrderId, PositionId, SessionId, Symbol, Timestamp, TradeId};

// Application re-exports
pub use application::dto::{PlaceOrderRequest, PlaceOrderResult};
pub use application::ports::{OrderStorePort, PositionStorePort, StoreError};

// Execution re-exports
pub use execution::{
    Exchange, ExchangeError, FeeSchedule, FillModel, PositionError, PositionManager,
};

// Cross-cutting re-exports
pub use config::{Config, ConfigError, load_config, load_config_from_string};
pub use error::{EngineError, ErrorCode, ErrorResponse};
pub use resilience::{ErrorKind, Retryability, RetryConfig, RetryError, RetryExecutor};

// Infrastructure re-exports
pub use infrastructure::config::Engine;
pub use infrastructure::persistence::InMemoryTradeStore;
