//! Money calculation utilities using rust_decimal for precision
//!
//! All calculations are done using `Decimal` internally, then converted to `f64`
//! for storage/serialization. Derived order amounts are stored unrounded;
//! only reported aggregates are rounded to 2 decimal places.

use rust_decimal::prelude::*;
use shared::models::OrderItem;

/// Rounding for reported amounts (2 decimal places, half away from zero)
const DECIMAL_PLACES: u32 = 2;

/// Pricing constants applied when an order is created
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingPolicy {
    /// Fraction of the subtotal, e.g. 0.10
    pub tax_rate: Decimal,
    pub delivery_fee: Decimal,
    /// Offset of `estimatedReadyTime` from creation
    pub prep_time_minutes: i64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(10, 2),
            delivery_fee: Decimal::new(399, 2),
            prep_time_minutes: 20,
        }
    }
}

/// Derived monetary fields of an order
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub subtotal: f64,
    pub tax: f64,
    pub delivery_fee: f64,
    pub tip: Option<f64>,
    pub total: f64,
}

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, without rounding
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value.normalize().to_f64().unwrap_or_default()
}

/// Round to 2 decimal places for reporting
#[inline]
pub fn round_money(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Line total: price * quantity
pub fn line_total(item: &OrderItem) -> Decimal {
    to_decimal(item.price) * Decimal::from(item.quantity)
}

/// `subtotal = Σ(price × quantity)`, `tax = subtotal × rate`,
/// `total = subtotal + tax + delivery_fee + tip`
pub fn calculate_totals(items: &[OrderItem], tip: Option<f64>, policy: &PricingPolicy) -> Totals {
    let subtotal: Decimal = items.iter().map(line_total).sum();
    let tax = subtotal * policy.tax_rate;
    let tip_amount = tip.map(to_decimal).unwrap_or_default();
    let total = subtotal + tax + policy.delivery_fee + tip_amount;

    Totals {
        subtotal: to_f64(subtotal),
        tax: to_f64(tax),
        delivery_fee: to_f64(policy.delivery_fee),
        tip,
        total: to_f64(total),
    }
}

/// Whether `order.total` equals its components at 2-decimal precision
#[cfg(test)]
pub fn totals_consistent(order: &shared::models::Order) -> bool {
    let expected = to_decimal(order.subtotal)
        + to_decimal(order.tax)
        + to_decimal(order.delivery_fee)
        + order.tip.map(to_decimal).unwrap_or_default();
    // equal at 2-decimal precision
    (expected - to_decimal(order.total)).abs() < Decimal::new(5, 3)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: f64, quantity: i32) -> OrderItem {
        OrderItem {
            menu_item_id: "m1".to_string(),
            name: "Dish".to_string(),
            price,
            quantity,
            image: None,
            notes: None,
        }
    }

    #[test]
    fn test_reference_order_totals() {
        let totals = calculate_totals(
            &[item(8.99, 2), item(5.99, 1)],
            None,
            &PricingPolicy::default(),
        );

        assert_eq!(totals.subtotal, 23.97);
        assert_eq!(totals.tax, 2.397);
        assert_eq!(totals.delivery_fee, 3.99);
        assert!((totals.total - 30.357).abs() < 1e-9);
        assert_eq!(totals.tip, None);
    }

    #[test]
    fn test_tip_is_included_in_total() {
        let totals = calculate_totals(&[item(10.0, 1)], Some(2.5), &PricingPolicy::default());
        // 10 + 1 + 3.99 + 2.5
        assert!((totals.total - 17.49).abs() < 1e-9);
        assert_eq!(totals.tip, Some(2.5));
    }

    #[test]
    fn test_decimal_avoids_float_drift() {
        let totals = calculate_totals(&[item(0.1, 3)], None, &PricingPolicy::default());
        assert_eq!(totals.subtotal, 0.3);
    }

    #[test]
    fn test_round_money() {
        assert_eq!(round_money(Decimal::new(20005, 3)), 20.01);
        assert_eq!(round_money(Decimal::new(60, 0)), 60.0);
    }
}
