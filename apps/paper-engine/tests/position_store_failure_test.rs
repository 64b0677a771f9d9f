//! Store failures must surface to the caller and leave positions untouched.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use async_trait::async_trait;
use mockall::mock;
use mockall::predicate::eq;
use paper_engine::domain::position_tracking::{
    ClosedLeg, CloseReason, Position, PositionEvent, PositionSide,
};
use paper_engine::{
    FeeSchedule, Fill, Order, OrderSide, OrderTicket, PositionError, PositionId, PositionManager,
    PositionStorePort, SessionId, StoreError, Symbol,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

mock! {
    pub PositionStore {}

    #[async_trait]
    impl PositionStorePort for PositionStore {
        async fn get_open_positions(&self, session_id: &SessionId)
            -> Result<Vec<Position>, StoreError>;
        async fn create_position(&self, position: &Position) -> Result<(), StoreError>;
        async fn close_position(
            &self,
            id: &PositionId,
            exit_price: Decimal,
            reason: CloseReason,
            fees: Decimal,
        ) -> Result<Decimal, StoreError>;
        async fn partial_close_position(
            &self,
            id: &PositionId,
            quantity: Decimal,
            exit_price: Decimal,
            reason: CloseReason,
            fees: Decimal,
        ) -> Result<ClosedLeg, StoreError>;
        async fn update_position_averaging(
            &self,
            id: &PositionId,
            new_entry_price: Decimal,
            new_quantity: Decimal,
            fees_delta: Decimal,
        ) -> Result<(), StoreError>;
        async fn update_unrealized_pnl(
            &self,
            id: &PositionId,
            current_price: Decimal,
        ) -> Result<(), StoreError>;
    }
}

fn session() -> SessionId {
    SessionId::new("session-1")
}

fn unavailable() -> StoreError {
    StoreError::Unavailable("connection refused".to_string())
}

fn filled_limit(side: OrderSide, quantity: Decimal, price: Decimal) -> (Order, Vec<Fill>) {
    let mut order =
        Order::new(OrderTicket::limit("BTCUSDT", side, quantity, price), Some(session())).unwrap();
    order.open().unwrap();
    let fills = vec![Fill::new(order.id().clone(), 0, quantity, price)];
    order.fill(&fills).unwrap();
    (order, fills)
}

fn long_position(quantity: Decimal, price: Decimal) -> Position {
    Position::open(
        session(),
        "BTCUSDT".into(),
        PositionSide::Long,
        price,
        quantity,
        Decimal::ZERO,
    )
    .unwrap()
}

async fn manager_with(store: MockPositionStore) -> PositionManager<MockPositionStore> {
    let manager = PositionManager::new(FeeSchedule::default(), Arc::new(store));
    manager.set_session(Some(session())).await.unwrap();
    manager
}

#[tokio::test]
async fn failed_create_leaves_no_position() {
    let mut store = MockPositionStore::new();
    store
        .expect_get_open_positions()
        .with(eq(session()))
        .returning(|_| Ok(Vec::new()));
    store
        .expect_create_position()
        .times(1)
        .returning(|_| Err(unavailable()));
    let manager = manager_with(store).await;

    let (order, fills) = filled_limit(OrderSide::Buy, dec!(1), dec!(100));
    let err = manager.on_order_filled(&order, &fills).await.unwrap_err();

    assert!(matches!(err, PositionError::Store(StoreError::Unavailable(_))));
    assert!(manager.get_open_positions().await.is_empty());
}

#[tokio::test]
async fn failed_fill_can_be_retried() {
    let mut store = MockPositionStore::new();
    store
        .expect_get_open_positions()
        .returning(|_| Ok(Vec::new()));
    let mut attempts = 0;
    store.expect_create_position().times(2).returning(move |_| {
        attempts += 1;
        if attempts == 1 { Err(unavailable()) } else { Ok(()) }
    });
    let manager = manager_with(store).await;

    let (order, fills) = filled_limit(OrderSide::Buy, dec!(1), dec!(100));
    assert!(manager.on_order_filled(&order, &fills).await.is_err());
    let event = manager.on_order_filled(&order, &fills).await.unwrap();

    assert!(matches!(event, PositionEvent::Opened { .. }));
    assert_eq!(manager.get_open_positions().await.len(), 1);
}

#[tokio::test]
async fn failed_averaging_keeps_previous_entry() {
    let existing = long_position(dec!(10), dec!(100));
    let seeded = existing.clone();
    let mut store = MockPositionStore::new();
    store
        .expect_get_open_positions()
        .returning(move |_| Ok(vec![seeded.clone()]));
    store
        .expect_update_position_averaging()
        .times(1)
        .returning(|_, _, _, _| Err(unavailable()));
    let manager = manager_with(store).await;

    let (order, fills) = filled_limit(OrderSide::Buy, dec!(5), dec!(110));
    assert!(manager.on_order_filled(&order, &fills).await.is_err());

    let position = manager.get_position_by_id(existing.id()).await.unwrap();
    assert_eq!(position.quantity(), dec!(10));
    assert_eq!(position.entry_price(), dec!(100));
}

#[tokio::test]
async fn failed_close_keeps_the_position_open() {
    let existing = long_position(dec!(1), dec!(100));
    let seeded = existing.clone();
    let mut store = MockPositionStore::new();
    store
        .expect_get_open_positions()
        .returning(move |_| Ok(vec![seeded.clone()]));
    store
        .expect_close_position()
        .withf(|_, price, reason, _| *price == dec!(120) && *reason == CloseReason::FullClose)
        .times(1)
        .returning(|_, _, _, _| Err(unavailable()));
    let manager = manager_with(store).await;

    let (order, fills) = filled_limit(OrderSide::Sell, dec!(1), dec!(120));
    assert!(manager.on_order_filled(&order, &fills).await.is_err());

    assert_eq!(manager.get_open_positions().await, vec![existing]);
}

#[tokio::test]
async fn mark_failure_aborts_the_batch() {
    let existing = long_position(dec!(1), dec!(100));
    let seeded = existing.clone();
    let mut store = MockPositionStore::new();
    store
        .expect_get_open_positions()
        .returning(move |_| Ok(vec![seeded.clone()]));
    store
        .expect_update_unrealized_pnl()
        .times(1)
        .returning(|_, _| Err(unavailable()));
    let manager = manager_with(store).await;

    let prices = std::collections::HashMap::from([(Symbol::new("BTCUSDT"), dec!(150))]);
    let err = manager.update_unrealized_pnl(&prices).await.unwrap_err();

    assert!(matches!(err, PositionError::Store(_)));
    assert_eq!(manager.get_total_unrealized_pnl().await, Decimal::ZERO);
    let position = manager.get_position_by_id(existing.id()).await.unwrap();
    assert_eq!(position.unrealized_pnl(), None);
}

#[tokio::test]
async fn session_load_failure_keeps_previous_scope() {
    let mut store = MockPositionStore::new();
    let mut calls = 0;
    store.expect_get_open_positions().returning(move |_| {
        calls += 1;
        if calls == 1 {
            Ok(Vec::new())
        } else {
            Err(unavailable())
        }
    });
    let manager = manager_with(store).await;

    let err = manager
        .set_session(Some(SessionId::new("session-2")))
        .await
        .unwrap_err();

    assert!(matches!(err, PositionError::Store(_)));
    assert_eq!(manager.session().await, Some(session()));
}
