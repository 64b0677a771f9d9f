//! Dependency Injection Container
//!
//! Wires the exchange simulator, the position manager and the retry executor
//! around one shared store.

use std::sync::Arc;

use crate::application::ports::{OrderStorePort, PositionStorePort};
use crate::config::Config;
use crate::domain::shared::SessionId;
use crate::execution::{Exchange, FeeSchedule, PositionError, PositionManager};
use crate::infrastructure::persistence::InMemoryTradeStore;
use crate::resilience::RetryExecutor;

/// Dependency injection container.
///
/// The exchange and the position manager are independent: they share the
/// store but not state. Sequencing a fill into the position manager is the
/// caller's job.
pub struct Engine<S>
where
    S: OrderStorePort + PositionStorePort + 'static,
{
    store: Arc<S>,
    exchange: Arc<Exchange<S>>,
    positions: Arc<PositionManager<S>>,
    retry: RetryExecutor,
}

impl<S> Engine<S>
where
    S: OrderStorePort + PositionStorePort + 'static,
{
    /// Create a new container over `store`.
    pub fn new(config: &Config, store: Arc<S>) -> Self {
        let exchange = Exchange::new(config.simulator.clone(), Arc::clone(&store));
        let positions =
            PositionManager::new(FeeSchedule::from(&config.simulator), Arc::clone(&store));

        Self {
            store,
            exchange: Arc::new(exchange),
            positions: Arc::new(positions),
            retry: RetryExecutor::new(config.retry.to_retry_config()),
        }
    }

    /// Get the store.
    pub fn store(&self) -> Arc<S> {
        Arc::clone(&self.store)
    }

    /// Get the exchange simulator.
    pub fn exchange(&self) -> Arc<Exchange<S>> {
        Arc::clone(&self.exchange)
    }

    /// Get the position manager.
    pub fn positions(&self) -> Arc<PositionManager<S>> {
        Arc::clone(&self.positions)
    }

    /// Get the retry executor.
    pub const fn retry(&self) -> &RetryExecutor {
        &self.retry
    }

    /// Point both components at `session`.
    ///
    /// # Errors
    ///
    /// Returns the position manager's error if its reload fails; the exchange
    /// is then left on its previous session.
    pub async fn set_session(&self, session: Option<SessionId>) -> Result<(), PositionError> {
        self.positions.set_session(session.clone()).await?;
        self.exchange.set_session(session);
        Ok(())
    }
}

impl Engine<InMemoryTradeStore> {
    /// Container backed by a fresh in-memory store.
    #[must_use]
    pub fn in_memory(config: &Config) -> Self {
        Self::new(config, Arc::new(InMemoryTradeStore::new()))
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::application::dto::PlaceOrderRequest;
    use crate::domain::order_execution::OrderStatus;

    #[tokio::test]
    async fn components_share_the_store() {
        let engine = Engine::in_memory(&Config::default());
        engine
            .set_session(Some(SessionId::new("s-1")))
            .await
            .unwrap();
        assert_eq!(engine.exchange().session(), Some(SessionId::new("s-1")));

        let request = PlaceOrderRequest {
            symbol: "BTCUSDT".to_string(),
            side: "buy".to_string(),
            order_type: "market".to_string(),
            quantity: dec!(0.5),
            price: None,
        };
        let result = engine.exchange().place_order(&request).await;
        assert_eq!(result.status, OrderStatus::Filled);
        assert_eq!(engine.store().order_count(), 1);

        let order_id = result.order_id.unwrap();
        let order = engine.exchange().get_order(&order_id).unwrap();
        let fills = engine.exchange().get_order_fills(&order_id).unwrap();
        engine.positions().on_order_filled(&order, &fills).await.unwrap();
        assert_eq!(engine.store().open_position_count(), 1);
    }

    #[test]
    fn retry_executor_follows_config() {
        let mut config = Config::default();
        config.retry.max_retries = 9;
        let engine = Engine::in_memory(&config);
        assert_eq!(engine.retry().config().max_retries, 9);
    }
}
