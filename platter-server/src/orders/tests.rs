use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use shared::models::{
    CreateOrderRequest, Customer, OrderItemInput, OrderStatus, PaymentMethod, PaymentStatus,
};

use super::*;
use crate::db::flaky::FlakyStore;
use crate::db::{DocumentStore, MemoryStore, StoreError};
use crate::resilience::{BatchConfig, RecordingSleeper, ResilientAccess, RetryPolicy};
use crate::utils::DateRange;

const THROTTLE: Duration = Duration::from_millis(10);
const BATCH_DELAY: Duration = Duration::from_millis(50);

struct Harness {
    service: OrderService,
    store: Arc<FlakyStore>,
    sleeper: RecordingSleeper,
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl Harness {
    fn new() -> Self {
        Self::with_pricing(PricingPolicy::default())
    }

    fn with_pricing(pricing: PricingPolicy) -> Self {
        let memory: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let store = Arc::new(FlakyStore::new(memory));
        let sleeper = RecordingSleeper::new();
        let access = ResilientAccess::new(
            RetryPolicy::new(3, Duration::from_millis(100)),
            THROTTLE,
            BatchConfig {
                size: 2,
                delay_between: BATCH_DELAY,
            },
        )
        .with_sleeper(Arc::new(sleeper.clone()));

        let now = Arc::new(Mutex::new(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()));
        let clock_now = now.clone();
        let service = OrderService::new(OrderRepository::new(store.clone(), access), pricing)
            .with_clock(Arc::new(move || *clock_now.lock()));

        Self {
            service,
            store,
            sleeper,
            now,
        }
    }

    fn advance(&self, minutes: i64) {
        *self.now.lock() += chrono::Duration::minutes(minutes);
    }

    fn set_now(&self, at: DateTime<Utc>) {
        *self.now.lock() = at;
    }

    async fn create(&self, prices: &[(f64, i32)]) -> shared::models::Order {
        self.service.create_order(request("p1", prices)).await.unwrap()
    }
}

fn request(portal_id: &str, prices: &[(f64, i32)]) -> CreateOrderRequest {
    CreateOrderRequest {
        portal_id: portal_id.to_string(),
        items: prices
            .iter()
            .enumerate()
            .map(|(i, (price, quantity))| OrderItemInput {
                menu_item_id: format!("m{i}"),
                name: format!("Dish {i}"),
                price: *price,
                quantity: *quantity,
                ..Default::default()
            })
            .collect(),
        customer: Customer {
            name: "Grace".to_string(),
            ..Default::default()
        },
        payment_method: Some(PaymentMethod::Card),
        ..Default::default()
    }
}

fn flat_pricing() -> PricingPolicy {
    PricingPolicy {
        tax_rate: Decimal::ZERO,
        delivery_fee: Decimal::ZERO,
        prep_time_minutes: 20,
    }
}

// ========================================================================
// Creation
// ========================================================================

#[tokio::test]
async fn test_create_order_derives_totals() {
    let h = Harness::new();
    let created_at = *h.now.lock();
    let order = h.create(&[(8.99, 2), (5.99, 1)]).await;

    assert_eq!(order.subtotal, 23.97);
    assert_eq!(order.tax, 2.397);
    assert_eq!(order.delivery_fee, 3.99);
    assert!((order.total - 30.357).abs() < 1e-9);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(order.created_at, created_at);
    assert_eq!(order.updated_at, created_at);
    assert_eq!(
        order.estimated_ready_time,
        Some(created_at + chrono::Duration::minutes(20))
    );
    assert!(money::totals_consistent(&order));

    let stored = h.service.get_order(&order.id).await.unwrap();
    assert_eq!(stored, order);
}

#[tokio::test]
async fn test_create_rejects_empty_items_without_writing() {
    let h = Harness::new();
    let err = h.service.create_order(request("p1", &[])).await.unwrap_err();

    match err {
        OrderError::Validation(violations) => {
            assert_eq!(violations, vec!["items must contain at least one item".to_string()]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    let listed = h
        .service
        .list_orders(&OrderQuery::for_portal("p1"))
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn test_create_reports_every_violation() {
    let h = Harness::new();
    let mut req = request("", &[(-1.0, 0)]);
    req.customer.name = String::new();

    let Err(OrderError::Validation(violations)) = h.service.create_order(req).await else {
        panic!("expected validation error");
    };
    assert!(violations.contains(&"portalId is required".to_string()));
    assert!(violations.contains(&"customer.name is required".to_string()));
    assert!(violations.contains(&"items[0].price must be a non-negative number".to_string()));
    assert!(violations.contains(&"items[0].quantity must be greater than 0".to_string()));
}

#[tokio::test]
async fn test_top_level_table_and_tip() {
    let h = Harness::new();
    let mut req = request("p1", &[(10.0, 1)]);
    req.customer.table = Some("4".to_string());
    req.table = Some("12".to_string());
    req.tip = Some(2.0);
    req.notes = Some("no onions".to_string());

    let order = h.service.create_order(req).await.unwrap();
    assert_eq!(order.customer.table.as_deref(), Some("12"));
    assert_eq!(order.tip, Some(2.0));
    assert_eq!(order.notes.as_deref(), Some("no onions"));
    // 10 + 1 + 3.99 + 2
    assert!((order.total - 16.99).abs() < 1e-9);
}

// ========================================================================
// Status & payment
// ========================================================================

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let h = Harness::new();
    assert!(matches!(
        h.service.get_order("missing").await,
        Err(OrderError::NotFound(id)) if id == "missing"
    ));
    assert!(matches!(
        h.service.update_status("missing", OrderStatus::Ready).await,
        Err(OrderError::NotFound(_))
    ));
    assert!(matches!(
        h.service.update_payment_status("missing", PaymentStatus::Paid).await,
        Err(OrderError::NotFound(_))
    ));
    assert!(matches!(
        h.service.cancel_order("missing", None).await,
        Err(OrderError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_completing_stamps_completed_at() {
    let h = Harness::new();
    let order = h.create(&[(10.0, 1)]).await;
    h.advance(30);
    let completed_at = *h.now.lock();

    let updated = h
        .service
        .update_status(&order.id, OrderStatus::Completed)
        .await
        .unwrap();
    assert_eq!(updated.status, OrderStatus::Completed);
    assert_eq!(updated.completed_at, Some(completed_at));
    assert_eq!(updated.updated_at, completed_at);
    assert_eq!(updated.created_at, order.created_at);
}

#[tokio::test]
async fn test_status_updates_are_permissive() {
    let h = Harness::new();
    let order = h.create(&[(10.0, 1)]).await;

    for status in [OrderStatus::Ready, OrderStatus::Confirmed, OrderStatus::Preparing] {
        let updated = h.service.update_status(&order.id, status).await.unwrap();
        assert_eq!(updated.status, status);
    }
}

#[tokio::test]
async fn test_same_status_skips_write() {
    let h = Harness::new();
    let order = h.create(&[(10.0, 1)]).await;
    h.advance(5);

    let calls_before = h.store.calls();
    let unchanged = h
        .service
        .update_status(&order.id, OrderStatus::Pending)
        .await
        .unwrap();

    // Only the lookup reached the store
    assert_eq!(h.store.calls(), calls_before + 1);
    assert_eq!(unchanged.updated_at, order.updated_at);

    let calls_before = h.store.calls();
    h.service
        .update_payment_status(&order.id, PaymentStatus::Pending)
        .await
        .unwrap();
    assert_eq!(h.store.calls(), calls_before + 1);
}

#[tokio::test]
async fn test_payment_status_update() {
    let h = Harness::new();
    let order = h.create(&[(10.0, 1)]).await;

    let paid = h
        .service
        .update_payment_status(&order.id, PaymentStatus::Paid)
        .await
        .unwrap();
    assert_eq!(paid.payment_status, PaymentStatus::Paid);
    assert_eq!(paid.status, OrderStatus::Pending);
}

// ========================================================================
// Cancellation
// ========================================================================

#[tokio::test]
async fn test_cancel_pending_order_records_reason() {
    let h = Harness::new();
    let order = h.create(&[(10.0, 1)]).await;

    let cancelled = h
        .service
        .cancel_order(&order.id, Some("customer left".to_string()))
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.cancellation_reason.as_deref(), Some("customer left"));
}

#[tokio::test]
async fn test_cancel_terminal_orders_refused() {
    let h = Harness::new();
    let completed = h.create(&[(10.0, 1)]).await;
    h.service
        .update_status(&completed.id, OrderStatus::Completed)
        .await
        .unwrap();

    let err = h.service.cancel_order(&completed.id, None).await.unwrap_err();
    assert!(matches!(err, OrderError::Invariant(_)), "{err:?}");
    assert_eq!(
        h.service.get_order(&completed.id).await.unwrap().status,
        OrderStatus::Completed
    );

    let cancelled = h.create(&[(10.0, 1)]).await;
    h.service.cancel_order(&cancelled.id, None).await.unwrap();
    assert!(matches!(
        h.service.cancel_order(&cancelled.id, None).await,
        Err(OrderError::Invariant(_))
    ));
}

// ========================================================================
// Listing & bulk
// ========================================================================

#[tokio::test]
async fn test_list_filters_by_status_newest_first() {
    let h = Harness::new();
    let first = h.create(&[(10.0, 1)]).await;
    h.advance(1);
    let second = h.create(&[(10.0, 1)]).await;
    h.advance(1);
    let third = h.create(&[(10.0, 1)]).await;
    h.service
        .update_status(&second.id, OrderStatus::Preparing)
        .await
        .unwrap();

    let all = h.service.list_orders(&OrderQuery::for_portal("p1")).await.unwrap();
    let ids: Vec<_> = all.iter().map(|o| o.id.clone()).collect();
    assert_eq!(ids, vec![third.id.clone(), second.id.clone(), first.id.clone()]);

    let pending = h
        .service
        .list_orders(&OrderQuery::for_portal("p1").with_statuses([OrderStatus::Pending]))
        .await
        .unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|o| o.status == OrderStatus::Pending));

    assert!(matches!(
        h.service.list_orders(&OrderQuery::for_portal(" ")).await,
        Err(OrderError::Validation(_))
    ));
}

#[tokio::test]
async fn test_bulk_update_runs_in_paced_batches() {
    let h = Harness::new();
    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(h.create(&[(10.0, 1)]).await.id);
    }
    h.sleeper.clear();

    let updated = h
        .service
        .bulk_update_status(ids.clone(), OrderStatus::Confirmed)
        .await
        .unwrap();

    let updated_ids: Vec<_> = updated.iter().map(|o| o.id.clone()).collect();
    assert_eq!(updated_ids, ids);
    assert!(updated.iter().all(|o| o.status == OrderStatus::Confirmed));
    // 3 orders in batches of 2: one pause between the batches
    assert_eq!(h.sleeper.delays(), vec![BATCH_DELAY]);
}

#[tokio::test]
async fn test_bulk_update_aborts_on_failing_batch() {
    let h = Harness::new();
    let a = h.create(&[(10.0, 1)]).await.id;
    let b = h.create(&[(10.0, 1)]).await.id;
    let c = h.create(&[(10.0, 1)]).await.id;

    let err = h
        .service
        .bulk_update_status(
            vec![
                a.clone(),
                b.clone(),
                "missing".to_string(),
                "missing-too".to_string(),
                c.clone(),
            ],
            OrderStatus::Ready,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::NotFound(_)));

    // First batch landed, the batch after the failure never ran
    assert_eq!(h.service.get_order(&a).await.unwrap().status, OrderStatus::Ready);
    assert_eq!(h.service.get_order(&b).await.unwrap().status, OrderStatus::Ready);
    assert_eq!(h.service.get_order(&c).await.unwrap().status, OrderStatus::Pending);

    assert!(matches!(
        h.service.bulk_update_status(vec![], OrderStatus::Ready).await,
        Err(OrderError::Validation(_))
    ));
}

// ========================================================================
// Statistics
// ========================================================================

#[tokio::test]
async fn test_stats_include_cancelled_orders() {
    let h = Harness::with_pricing(flat_pricing());
    h.create(&[(10.0, 1)]).await;
    let cancelled = h.create(&[(20.0, 1)]).await;
    h.create(&[(15.0, 2)]).await;
    h.service.cancel_order(&cancelled.id, None).await.unwrap();

    let stats = h
        .service
        .get_order_stats("p1", &DateRange::default())
        .await
        .unwrap();
    assert_eq!(stats.total_orders, 3);
    assert_eq!(stats.total_revenue, 60.0);
    assert_eq!(stats.average_order_value, 20.0);
    assert_eq!(stats.status_breakdown.get(&OrderStatus::Cancelled), Some(&1));
    assert_eq!(stats.status_breakdown.get(&OrderStatus::Pending), Some(&2));
}

#[tokio::test]
async fn test_stats_respect_date_range() {
    let h = Harness::with_pricing(flat_pricing());
    h.set_now(Utc.with_ymd_and_hms(2026, 3, 1, 23, 59, 0).unwrap());
    h.create(&[(10.0, 1)]).await;
    h.set_now(Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap());
    h.create(&[(20.0, 1)]).await;

    let range = DateRange::parse(Some("2026-03-01"), Some("2026-03-01")).unwrap();
    let stats = h.service.get_order_stats("p1", &range).await.unwrap();
    assert_eq!(stats.total_orders, 1);
    assert_eq!(stats.total_revenue, 10.0);

    let empty = h
        .service
        .get_order_stats("other-portal", &DateRange::default())
        .await
        .unwrap();
    assert_eq!(empty.total_orders, 0);
    assert_eq!(empty.total_revenue, 0.0);
    assert_eq!(empty.average_order_value, 0.0);
}

#[tokio::test]
async fn test_timestamp_end_bound_is_exclusive() {
    let h = Harness::with_pricing(flat_pricing());
    h.set_now(Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap());
    h.create(&[(10.0, 1)]).await;
    h.set_now(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
    h.create(&[(20.0, 1)]).await;

    let range =
        DateRange::parse(Some("2026-03-01T10:00:00Z"), Some("2026-03-01T12:00:00Z")).unwrap();
    let stats = h.service.get_order_stats("p1", &range).await.unwrap();
    assert_eq!(stats.total_orders, 1);
    assert_eq!(stats.total_revenue, 10.0);

    let range =
        DateRange::parse(Some("2026-03-01T10:00:00Z"), Some("2026-03-01T12:00:00.001Z")).unwrap();
    let stats = h.service.get_order_stats("p1", &range).await.unwrap();
    assert_eq!(stats.total_orders, 2);
}

// ========================================================================
// Resilience
// ========================================================================

#[tokio::test]
async fn test_transient_failures_are_retried_with_backoff() {
    let h = Harness::new();
    h.store.fail_next(2);

    let order = h.create(&[(10.0, 1)]).await;

    assert_eq!(
        h.sleeper.delays(),
        vec![THROTTLE, Duration::from_millis(100), Duration::from_millis(200)]
    );
    assert!(h.service.get_order(&order.id).await.is_ok());
}

#[tokio::test]
async fn test_retry_exhaustion_surfaces_store_error() {
    let h = Harness::new();
    let order = h.create(&[(10.0, 1)]).await;
    h.store.fail_next(10);
    let calls_before = h.store.calls();

    let err = h.service.get_order(&order.id).await.unwrap_err();
    assert!(matches!(err, OrderError::Store(StoreError::Backend(_))), "{err:?}");
    // one attempt + three retries
    assert_eq!(h.store.calls(), calls_before + 4);
}
