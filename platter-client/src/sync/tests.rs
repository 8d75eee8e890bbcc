use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::TimeZone;
use shared::models::{Customer, PaymentStatus};

use super::*;
use crate::ClientError;

#[derive(Clone, Default)]
struct ScriptedFeed {
    responses: Arc<Mutex<VecDeque<ClientResult<Vec<Order>>>>>,
    requested: Arc<Mutex<Vec<Vec<OrderStatus>>>>,
}

impl ScriptedFeed {
    fn push_ok(&self, orders: Vec<Order>) {
        self.responses.lock().unwrap().push_back(Ok(orders));
    }

    fn push_err(&self, message: &str) {
        self.responses.lock().unwrap().push_back(Err(ClientError::Api {
            status: 503,
            message: message.to_string(),
        }));
    }
}

#[async_trait]
impl OrderFeed for ScriptedFeed {
    async fn fetch_orders(&self, _portal_id: &str, statuses: &[OrderStatus]) -> ClientResult<Vec<Order>> {
        self.requested.lock().unwrap().push(statuses.to_vec());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap() + chrono::Duration::seconds(secs)
}

fn order(id: &str, status: OrderStatus) -> Order {
    Order {
        id: id.to_string(),
        portal_id: "p1".to_string(),
        customer: Customer {
            name: "Ada".to_string(),
            ..Default::default()
        },
        items: Vec::new(),
        subtotal: 10.0,
        tax: 1.0,
        delivery_fee: 3.99,
        tip: None,
        total: 14.99,
        status,
        payment_method: None,
        payment_status: PaymentStatus::Pending,
        notes: None,
        cancellation_reason: None,
        created_at: at(0),
        updated_at: at(0),
        completed_at: None,
        estimated_ready_time: None,
    }
}

fn poller(feed: ScriptedFeed, role: StaffRole) -> OrderPoller<ScriptedFeed> {
    OrderPoller::new(feed, "p1", role, PollConfig::default())
}

#[test]
fn test_role_statuses() {
    assert_eq!(
        StaffRole::Kitchen.statuses(),
        &[OrderStatus::Confirmed, OrderStatus::Preparing]
    );
    assert_eq!(
        StaffRole::Cashier.statuses(),
        &[OrderStatus::Pending, OrderStatus::Confirmed, OrderStatus::Ready]
    );
    assert!(StaffRole::Admin.statuses().is_empty());
    assert_eq!("kitchen".parse::<StaffRole>().unwrap(), StaffRole::Kitchen);
    assert!("chef".parse::<StaffRole>().is_err());
}

#[tokio::test]
async fn test_poll_requests_role_statuses() {
    let feed = ScriptedFeed::default();
    let mut poller = poller(feed.clone(), StaffRole::Kitchen);
    poller.poll_once(at(0)).await.unwrap();

    assert_eq!(
        feed.requested.lock().unwrap().clone(),
        vec![vec![OrderStatus::Confirmed, OrderStatus::Preparing]]
    );
}

#[tokio::test]
async fn test_new_orders_raise_notice_for_window() {
    let feed = ScriptedFeed::default();
    feed.push_ok(vec![order("a", OrderStatus::Pending), order("b", OrderStatus::Ready)]);
    let mut poller = poller(feed, StaffRole::Cashier);

    poller.poll_once(at(0)).await.unwrap();
    let view = poller.view();
    assert_eq!(view.orders.len(), 2);
    assert_eq!(view.last_synced, Some(at(0)));

    let notice = view.active_notice(at(4)).unwrap();
    assert_eq!(notice.order_ids, vec!["a".to_string()]);
    assert_eq!(notice.count(), 1);
    assert!(view.active_notice(at(5)).is_none());
}

#[tokio::test]
async fn test_every_poll_with_new_orders_reraises() {
    let feed = ScriptedFeed::default();
    feed.push_ok(vec![order("a", OrderStatus::Pending)]);
    feed.push_ok(vec![order("a", OrderStatus::Confirmed)]);
    let mut poller = poller(feed, StaffRole::Cashier);

    poller.poll_once(at(0)).await.unwrap();
    poller.poll_once(at(30)).await.unwrap();

    // Same order, still new: the notice is raised again
    let notice = poller.view().active_notice(at(32)).unwrap();
    assert_eq!(notice.raised_at, at(30));
}

#[tokio::test]
async fn test_empty_new_subset_clears_notice() {
    let feed = ScriptedFeed::default();
    feed.push_ok(vec![order("a", OrderStatus::Pending)]);
    feed.push_ok(vec![order("a", OrderStatus::Ready)]);
    let mut poller = poller(feed, StaffRole::Cashier);

    poller.poll_once(at(0)).await.unwrap();
    poller.poll_once(at(1)).await.unwrap();

    assert!(poller.view().active_notice(at(2)).is_none());
    assert_eq!(poller.view().new_orders().count(), 0);
}

#[tokio::test]
async fn test_failed_poll_keeps_stale_view() {
    let feed = ScriptedFeed::default();
    feed.push_ok(vec![order("a", OrderStatus::Preparing)]);
    feed.push_err("service unavailable");
    feed.push_ok(vec![]);
    let mut poller = poller(feed, StaffRole::Kitchen);

    poller.poll_once(at(0)).await.unwrap();
    assert!(poller.poll_once(at(30)).await.is_err());

    let view = poller.view();
    assert_eq!(view.orders.len(), 1);
    assert_eq!(view.last_synced, Some(at(0)));
    assert!(view.is_stale());
    assert!(view.last_error.as_deref().unwrap().contains("service unavailable"));

    poller.poll_once(at(60)).await.unwrap();
    assert!(!poller.view().is_stale());
    assert!(poller.view().orders.is_empty());
}

#[tokio::test]
async fn test_run_publishes_until_cancelled() {
    let feed = ScriptedFeed::default();
    feed.push_ok(vec![order("a", OrderStatus::Pending)]);
    let config = PollConfig::default().with_interval(Duration::from_millis(10));
    let poller = OrderPoller::new(feed, "p1", StaffRole::Admin, config);

    let (tx, mut rx) = watch::channel(OrderView::default());
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn(poller.run(shutdown.clone(), tx));

    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().orders.len(), 1);

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}
