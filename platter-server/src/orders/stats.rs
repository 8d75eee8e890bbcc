//! Statistics over an aggregate snapshot

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use shared::models::{OrderStats, OrderStatus};
use tracing::warn;

use super::money::{round_money, to_decimal};
use crate::db::{AggregateOutput, Aggregation};

pub(crate) const REVENUE_FIELD: &str = "total";
pub(crate) const STATUS_FIELD: &str = "status";

pub(crate) fn stats_aggregation() -> Aggregation {
    Aggregation::new().sum(REVENUE_FIELD).count_by(STATUS_FIELD)
}

/// `(count, Σ total, Σ total / count)` plus per-status counts.
/// Cancelled orders are counted like any other.
pub(crate) fn compute_stats(output: &AggregateOutput) -> OrderStats {
    if output.count == 0 {
        return OrderStats::default();
    }

    let revenue = to_decimal(output.sums.get(REVENUE_FIELD).copied().unwrap_or(0.0));
    let average = revenue / Decimal::from(output.count);

    let mut status_breakdown = BTreeMap::new();
    if let Some(counts) = output.counts_by.get(STATUS_FIELD) {
        for (value, count) in counts {
            match value.parse::<OrderStatus>() {
                Ok(status) => {
                    status_breakdown.insert(status, *count);
                }
                Err(_) => warn!(status = %value, count, "Skipping unknown status in stats"),
            }
        }
    }

    OrderStats {
        total_orders: output.count,
        total_revenue: round_money(revenue),
        average_order_value: round_money(average),
        status_breakdown,
    }
}
