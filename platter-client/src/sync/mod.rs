//! Staff order synchronization
//!
//! Each staff screen polls the server for the orders its role cares about and
//! replaces its local [`OrderView`] wholesale on every successful poll. There
//! is no push channel; staleness is bounded by [`PollConfig::interval`].
//!
//! A new-order notice is raised whenever a poll returns at least one
//! `pending`/`confirmed` order and stays visible for the notice window.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::{Order, OrderStatus};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::PollConfig;
use crate::http::{HttpClient, ListOptions};
use crate::ClientResult;

/// Staff role, deciding which statuses a screen polls for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StaffRole {
    /// Orders to cook
    Kitchen,
    /// Orders to accept, hand out and settle
    Cashier,
    /// Everything
    Admin,
}

impl StaffRole {
    /// Statuses polled by this role; empty means all
    pub fn statuses(&self) -> &'static [OrderStatus] {
        match self {
            StaffRole::Kitchen => &[OrderStatus::Confirmed, OrderStatus::Preparing],
            StaffRole::Cashier => &[
                OrderStatus::Pending,
                OrderStatus::Confirmed,
                OrderStatus::Ready,
            ],
            StaffRole::Admin => &[],
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Kitchen => "kitchen",
            StaffRole::Cashier => "cashier",
            StaffRole::Admin => "admin",
        }
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StaffRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "kitchen" => Ok(StaffRole::Kitchen),
            "cashier" => Ok(StaffRole::Cashier),
            "admin" => Ok(StaffRole::Admin),
            other => Err(format!("unknown staff role '{other}'")),
        }
    }
}

/// Source of a portal's current order list
#[async_trait]
pub trait OrderFeed: Send + Sync {
    async fn fetch_orders(&self, portal_id: &str, statuses: &[OrderStatus]) -> ClientResult<Vec<Order>>;
}

#[async_trait]
impl OrderFeed for HttpClient {
    async fn fetch_orders(&self, portal_id: &str, statuses: &[OrderStatus]) -> ClientResult<Vec<Order>> {
        let options = ListOptions::statuses(statuses.iter().copied());
        self.list_orders(portal_id, &options).await
    }
}

/// "New orders arrived" signal
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderNotice {
    /// Ids of the `pending`/`confirmed` orders seen by the raising poll
    pub order_ids: Vec<String>,
    pub raised_at: DateTime<Utc>,
}

impl NewOrderNotice {
    pub fn count(&self) -> usize {
        self.order_ids.len()
    }
}

/// A staff screen's local copy of the order list
#[derive(Debug, Clone, Default)]
pub struct OrderView {
    pub orders: Vec<Order>,
    /// Time of the last successful poll
    pub last_synced: Option<DateTime<Utc>>,
    /// Error of the last poll, if it failed; `orders` is then stale
    pub last_error: Option<String>,
    notice: Option<NewOrderNotice>,
    notice_window: std::time::Duration,
}

impl OrderView {
    pub fn new(notice_window: std::time::Duration) -> Self {
        Self {
            notice_window,
            ..Default::default()
        }
    }

    /// Notice visible at `now`, i.e. raised less than the notice window ago
    pub fn active_notice(&self, now: DateTime<Utc>) -> Option<&NewOrderNotice> {
        self.notice.as_ref().filter(|notice| {
            (now - notice.raised_at)
                .to_std()
                .map_or(true, |elapsed| elapsed < self.notice_window)
        })
    }

    /// `pending` and `confirmed` orders
    pub fn new_orders(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter().filter(|o| o.status.is_new())
    }

    pub fn is_stale(&self) -> bool {
        self.last_error.is_some()
    }

    fn replace(&mut self, orders: Vec<Order>, now: DateTime<Utc>) {
        let new_ids: Vec<String> = orders
            .iter()
            .filter(|o| o.status.is_new())
            .map(|o| o.id.clone())
            .collect();

        self.notice = if new_ids.is_empty() {
            None
        } else {
            Some(NewOrderNotice {
                order_ids: new_ids,
                raised_at: now,
            })
        };
        self.orders = orders;
        self.last_synced = Some(now);
        self.last_error = None;
    }
}

/// Polls an [`OrderFeed`] for one portal and role
pub struct OrderPoller<F> {
    feed: F,
    portal_id: String,
    role: StaffRole,
    config: PollConfig,
    view: OrderView,
}

impl<F: OrderFeed> OrderPoller<F> {
    pub fn new(feed: F, portal_id: impl Into<String>, role: StaffRole, config: PollConfig) -> Self {
        Self {
            feed,
            portal_id: portal_id.into(),
            role,
            config,
            view: OrderView::new(config.notice_window),
        }
    }

    pub fn view(&self) -> &OrderView {
        &self.view
    }

    pub fn role(&self) -> StaffRole {
        self.role
    }

    /// Fetch once and replace the view. On failure the previous view is kept
    /// and the error recorded on it.
    pub async fn poll_once(&mut self, now: DateTime<Utc>) -> ClientResult<()> {
        match self
            .feed
            .fetch_orders(&self.portal_id, self.role.statuses())
            .await
        {
            Ok(orders) => {
                tracing::debug!(
                    portal_id = %self.portal_id,
                    role = %self.role,
                    count = orders.len(),
                    "Order view refreshed"
                );
                self.view.replace(orders, now);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    portal_id = %self.portal_id,
                    role = %self.role,
                    error = %e,
                    "Order poll failed, keeping previous view"
                );
                self.view.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Poll on the configured interval, publishing every view on `tx`,
    /// until `shutdown` fires or all receivers are gone.
    pub async fn run(mut self, shutdown: CancellationToken, tx: watch::Sender<OrderView>) {
        let mut interval = tokio::time::interval(self.config.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(portal_id = %self.portal_id, role = %self.role, "Order poller stopped");
                    break;
                }
                _ = interval.tick() => {
                    let _ = self.poll_once(Utc::now()).await;
                    if tx.send(self.view.clone()).is_err() {
                        break;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
