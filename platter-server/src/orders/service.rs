//! Order Service
//!
//! Business operations over orders. All persistence goes through
//! [`OrderRepository`], so every store call is retried on transient failure.
//!
//! # Status rules
//!
//! - `update_status` accepts any valid status (no transition graph is enforced).
//!   Writing the current value is a no-op.
//! - `completed` stamps `completedAt`.
//! - `cancel_order` is refused on `completed` / `cancelled` orders. The write is
//!   guarded on the status still being non-terminal, so a concurrent completion
//!   wins over a cancel.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use shared::models::{
    CreateOrderRequest, Order, OrderItem, OrderStats, OrderStatus, PaymentStatus,
};
use tracing::{debug, info, warn};

use super::error::{OrderError, OrderResult};
use super::money::{PricingPolicy, calculate_totals};
use super::repository::{OrderQuery, OrderRepository, portal_filter};
use super::stats::{compute_stats, stats_aggregation};
use super::validator::validate_order;
use crate::db::{Filter, Update};
use crate::utils::DateRange;
use crate::utils::time::format_timestamp;

/// Source of "now"; replaced in tests
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Clone)]
pub struct OrderService {
    repo: OrderRepository,
    pricing: PricingPolicy,
    clock: Clock,
}

impl std::fmt::Debug for OrderService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderService")
            .field("repo", &self.repo)
            .field("pricing", &self.pricing)
            .finish_non_exhaustive()
    }
}

impl OrderService {
    pub fn new(repo: OrderRepository, pricing: PricingPolicy) -> Self {
        Self {
            repo,
            pricing,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn repository(&self) -> &OrderRepository {
        &self.repo
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Build, validate and persist a new `pending` order
    pub async fn create_order(&self, request: CreateOrderRequest) -> OrderResult<Order> {
        let order = self.build_order(request);
        validate_order(&order).map_err(OrderError::Validation)?;

        self.repo.throttle().await;
        self.repo.insert(&order).await?;

        info!(
            order_id = %order.id,
            portal_id = %order.portal_id,
            items = order.items.len(),
            total = order.total,
            "Order created"
        );
        Ok(order)
    }

    fn build_order(&self, request: CreateOrderRequest) -> Order {
        let now = self.now();
        let CreateOrderRequest {
            portal_id,
            items,
            mut customer,
            payment_method,
            table,
            tip,
            notes,
        } = request;

        if table.is_some() {
            customer.table = table;
        }

        let items: Vec<OrderItem> = items
            .into_iter()
            .map(|input| OrderItem {
                menu_item_id: input.menu_item_id,
                name: input.name,
                price: input.price,
                quantity: input.quantity,
                image: input.image,
                notes: input.notes,
            })
            .collect();
        let totals = calculate_totals(&items, tip, &self.pricing);

        Order {
            id: uuid::Uuid::new_v4().to_string(),
            portal_id,
            customer,
            items,
            subtotal: totals.subtotal,
            tax: totals.tax,
            delivery_fee: totals.delivery_fee,
            tip: totals.tip,
            total: totals.total,
            status: OrderStatus::Pending,
            payment_method,
            payment_status: PaymentStatus::Pending,
            notes,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            estimated_ready_time: Some(now + Duration::minutes(self.pricing.prep_time_minutes)),
        }
    }

    pub async fn get_order(&self, id: &str) -> OrderResult<Order> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| OrderError::NotFound(id.to_string()))
    }

    /// Orders of one portal, newest first
    pub async fn list_orders(&self, query: &OrderQuery) -> OrderResult<Vec<Order>> {
        if query.portal_id.trim().is_empty() {
            return Err(OrderError::validation("portalId is required"));
        }
        Ok(self.repo.find(query).await?)
    }

    pub async fn update_status(&self, id: &str, status: OrderStatus) -> OrderResult<Order> {
        let current = self.get_order(id).await?;
        if current.status == status {
            debug!(order_id = %id, %status, "Status unchanged, skipping write");
            return Ok(current);
        }

        let now = format_timestamp(self.now());
        let mut update = Update::new()
            .set("status", status.as_str())
            .set("updatedAt", now.clone());
        if status == OrderStatus::Completed {
            update = update.set("completedAt", now);
        }

        let updated = self.apply(id, &Filter::by_id(id), &update).await?;
        info!(order_id = %id, from = %current.status, to = %status, "Order status updated");
        Ok(updated)
    }

    pub async fn update_payment_status(
        &self,
        id: &str,
        payment_status: PaymentStatus,
    ) -> OrderResult<Order> {
        let current = self.get_order(id).await?;
        if current.payment_status == payment_status {
            debug!(order_id = %id, %payment_status, "Payment status unchanged, skipping write");
            return Ok(current);
        }

        let update = Update::new()
            .set("paymentStatus", payment_status.as_str())
            .set("updatedAt", format_timestamp(self.now()));

        let updated = self.apply(id, &Filter::by_id(id), &update).await?;
        info!(
            order_id = %id,
            from = %current.payment_status,
            to = %payment_status,
            "Payment status updated"
        );
        Ok(updated)
    }

    pub async fn cancel_order(&self, id: &str, reason: Option<String>) -> OrderResult<Order> {
        let current = self.get_order(id).await?;
        if current.status.is_terminal() {
            return Err(already_terminal(id, current.status));
        }

        let mut update = Update::new()
            .set("status", OrderStatus::Cancelled.as_str())
            .set("updatedAt", format_timestamp(self.now()));
        if let Some(reason) = reason.filter(|r| !r.trim().is_empty()) {
            update = update.set("cancellationReason", reason);
        }

        let guard = Filter::by_id(id).one_of("status", OrderStatus::non_terminal().map(|s| s.as_str()));
        let outcome = self.repo.update(&guard, &update).await?;
        if outcome.matched == 0 {
            // Lost a race with another terminal write
            let latest = self.get_order(id).await?;
            warn!(order_id = %id, status = %latest.status, "Cancel lost to concurrent update");
            return Err(already_terminal(id, latest.status));
        }

        info!(order_id = %id, from = %current.status, "Order cancelled");
        self.get_order(id).await
    }

    /// Apply one status to many orders in paced batches.
    ///
    /// Aborts on the first failing batch; orders in earlier batches keep
    /// their new status.
    pub async fn bulk_update_status(
        &self,
        ids: Vec<String>,
        status: OrderStatus,
    ) -> OrderResult<Vec<Order>> {
        if ids.is_empty() {
            return Err(OrderError::validation("ids must contain at least one order id"));
        }
        let count = ids.len();
        let orders = self
            .repo
            .access()
            .batch_process(ids, |id: String| async move { self.update_status(&id, status).await })
            .await?;
        info!(count, %status, "Bulk status update finished");
        Ok(orders)
    }

    /// Count, revenue and average over a portal's orders, cancelled included
    pub async fn get_order_stats(&self, portal_id: &str, range: &DateRange) -> OrderResult<OrderStats> {
        if portal_id.trim().is_empty() {
            return Err(OrderError::validation("portalId is required"));
        }
        let output = self
            .repo
            .aggregate(&portal_filter(portal_id, range), &stats_aggregation())
            .await?;
        Ok(compute_stats(&output))
    }

    async fn apply(&self, id: &str, filter: &Filter, update: &Update) -> OrderResult<Order> {
        let outcome = self.repo.update(filter, update).await?;
        if outcome.matched == 0 {
            return Err(OrderError::NotFound(id.to_string()));
        }
        self.get_order(id).await
    }
}

fn already_terminal(id: &str, status: OrderStatus) -> OrderError {
    OrderError::Invariant(format!("Order {id} is already {status} and cannot be cancelled"))
}
