//! Exchange behavior under concurrent callers.
//!
//! Runs on the multi-threaded runtime so readers, placements and cancels
//! genuinely interleave.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use paper_engine::application::ports::OrderStatusUpdate;
use paper_engine::config::SimulatorConfig;
use paper_engine::{
    Exchange, ExchangeError, Fill, InMemoryTradeStore, Order, OrderId, OrderStatus,
    OrderStorePort, PlaceOrderRequest, StoreError,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn market(side: &str, quantity: Decimal) -> PlaceOrderRequest {
    PlaceOrderRequest {
        symbol: "BTCUSDT".to_string(),
        side: side.to_string(),
        order_type: "market".to_string(),
        quantity,
        price: None,
    }
}

fn limit(quantity: Decimal, price: Decimal) -> PlaceOrderRequest {
    PlaceOrderRequest {
        symbol: "BTCUSDT".to_string(),
        side: "buy".to_string(),
        order_type: "limit".to_string(),
        quantity,
        price: Some(price),
    }
}

/// Store that records every call and stalls on order inserts.
struct SlowStore {
    insert_delay: Duration,
    log: Mutex<Vec<String>>,
}

impl SlowStore {
    fn new(insert_delay: Duration) -> Self {
        Self {
            insert_delay,
            log: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderStorePort for SlowStore {
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        tokio::time::sleep(self.insert_delay).await;
        self.record(format!("insert {}", order.status()));
        Ok(())
    }

    async fn update_order_status(&self, update: &OrderStatusUpdate) -> Result<(), StoreError> {
        self.record(format!("update {}", update.status));
        Ok(())
    }

    async fn insert_trade(&self, fill: &Fill) -> Result<(), StoreError> {
        self.record(format!("trade {}", fill.sequence));
        Ok(())
    }
}

fn exchange_with<S: OrderStorePort>(store: &Arc<S>) -> Arc<Exchange<S>> {
    let exchange = Exchange::new(SimulatorConfig::default(), Arc::clone(store));
    exchange.set_market_price("BTCUSDT", dec!(50000));
    Arc::new(exchange)
}

/// Fill-level consistency of a filled order.
fn assert_fully_filled(order: &Order, fills: &[Fill]) {
    assert!(
        !fills.is_empty() && fills.len() <= 5,
        "order {} is FILLED with {} fills",
        order.id(),
        fills.len()
    );
    let total: Decimal = fills.iter().map(|f| f.quantity).sum();
    assert_eq!(total, order.quantity(), "fills of {} do not cover it", order.id());
    assert!(fills.iter().all(|f| f.order_id == *order.id()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancel_during_slow_insert_is_stored_last() {
    let store = Arc::new(SlowStore::new(Duration::from_millis(50)));
    let exchange = exchange_with(&store);

    let placing = {
        let exchange = Arc::clone(&exchange);
        tokio::spawn(async move { exchange.place_order(&limit(dec!(1), dec!(49000))).await })
    };

    // The order is visible in memory while its insert is still in flight.
    let order_id = loop {
        if let Some(order) = exchange.list_orders().first() {
            break order.id().clone();
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    };

    let cancelled = exchange.cancel_order(&order_id).await.unwrap();
    assert_eq!(cancelled.status(), OrderStatus::Cancelled);

    let placed = placing.await.unwrap();
    assert_eq!(placed.status, OrderStatus::Open);
    assert_eq!(
        store.log(),
        vec!["insert PENDING", "update OPEN", "update CANCELLED"]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_see_a_filled_order_without_its_fills() {
    let store = Arc::new(InMemoryTradeStore::new());
    let exchange = exchange_with(&store);
    let done = Arc::new(AtomicBool::new(false));

    let mut readers = Vec::new();
    for _ in 0..4 {
        let exchange = Arc::clone(&exchange);
        let done = Arc::clone(&done);
        readers.push(tokio::spawn(async move {
            while !done.load(Ordering::Acquire) {
                for order in exchange.list_orders() {
                    assert_eq!(order.status(), OrderStatus::Filled);
                    let fills = exchange.get_order_fills(order.id()).unwrap();
                    assert_fully_filled(&order, &fills);
                }
                tokio::task::yield_now().await;
            }
        }));
    }

    let mut writers = Vec::new();
    for worker in 0..4_u32 {
        let exchange = Arc::clone(&exchange);
        writers.push(tokio::spawn(async move {
            for i in 0..50_u32 {
                let quantity = if (worker + i) % 2 == 0 { dec!(0.5) } else { dec!(3) };
                let side = if i % 3 == 0 { "sell" } else { "buy" };
                let result = exchange.place_order(&market(side, quantity)).await;
                assert_eq!(result.status, OrderStatus::Filled);
            }
        }));
    }
    for writer in writers {
        writer.await.unwrap();
    }
    done.store(true, Ordering::Release);
    for reader in readers {
        reader.await.unwrap();
    }

    let orders = exchange.list_orders();
    assert_eq!(orders.len(), 200);
    for order in &orders {
        let fills = exchange.get_order_fills(order.id()).unwrap();
        assert_fully_filled(order, &fills);
        assert_eq!(store.trades_for(order.id()).len(), fills.len());
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_cancels_and_matches_settle_each_order_once() {
    let store = Arc::new(InMemoryTradeStore::new());
    let exchange = exchange_with(&store);

    let mut ids: Vec<OrderId> = Vec::new();
    for _ in 0..40 {
        let result = exchange.place_order(&limit(dec!(2), dec!(49500))).await;
        assert_eq!(result.status, OrderStatus::Open);
        ids.push(result.order_id.unwrap());
    }

    let mut settlers = Vec::new();
    let mut readers = Vec::new();
    for id in &ids {
        for attempt in 0..3 {
            let exchange = Arc::clone(&exchange);
            let id = id.clone();
            settlers.push(tokio::spawn(async move {
                if attempt == 1 {
                    exchange.fill_resting_order(&id).await.map(|_| ())
                } else {
                    exchange.cancel_order(&id).await.map(|_| ())
                }
            }));
        }
        let exchange = Arc::clone(&exchange);
        let id = id.clone();
        readers.push(tokio::spawn(async move {
            let order = exchange.get_order(&id).unwrap();
            let fills = exchange.get_order_fills(&id).unwrap();
            if order.status() == OrderStatus::Filled {
                assert_fully_filled(&order, &fills);
            }
        }));
    }

    let mut successes = 0;
    for settler in settlers {
        match settler.await.unwrap() {
            Ok(()) => successes += 1,
            Err(ExchangeError::Conflict { .. } | ExchangeError::InvalidState(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    for reader in readers {
        reader.await.unwrap();
    }
    assert_eq!(successes, ids.len());

    for id in &ids {
        let order = exchange.get_order(id).unwrap();
        let fills = exchange.get_order_fills(id).unwrap();
        match order.status() {
            OrderStatus::Filled => assert_fully_filled(&order, &fills),
            OrderStatus::Cancelled => assert!(fills.is_empty()),
            other => panic!("order {id} left in {other}"),
        }
        assert_eq!(store.order_status(id).unwrap().status, order.status());
    }
}
