//! Position Tracking Domain Services

pub mod pnl;
mod position_reconciler;

pub use position_reconciler::{PositionReconciler, ReconcileAction};
