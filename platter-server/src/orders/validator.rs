//! Structural order validation
//!
//! Pure and side-effect free. Every violation is collected so the caller can
//! report them all at once.

use shared::models::{Order, OrderItem, OrderStatus, PaymentStatus};

// ── Limits ──────────────────────────────────────────────────────────

/// Customer and item names
pub const MAX_NAME_LEN: usize = 200;

/// Order and item notes, cancellation reasons
pub const MAX_NOTE_LEN: usize = 500;

/// Phone, table labels
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

/// Maximum allowed price per item
pub const MAX_PRICE: f64 = 1_000_000.0;

/// Maximum allowed quantity per item
pub const MAX_QUANTITY: i32 = 9999;

/// Maximum number of line items per order
pub const MAX_ITEMS: usize = 200;

// ── Helpers ─────────────────────────────────────────────────────────

fn require_text(errors: &mut Vec<String>, value: &str, field: &str, max_len: usize) {
    if value.trim().is_empty() {
        errors.push(format!("{field} is required"));
    } else if value.len() > max_len {
        errors.push(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        ));
    }
}

fn optional_text(errors: &mut Vec<String>, value: &Option<String>, field: &str, max_len: usize) {
    if let Some(v) = value
        && v.len() > max_len
    {
        errors.push(format!("{field} is too long ({} chars, max {max_len})", v.len()));
    }
}

fn non_negative(errors: &mut Vec<String>, value: f64, field: &str) {
    if !value.is_finite() || value < 0.0 {
        errors.push(format!("{field} must be a non-negative number"));
    }
}

// ── Validators ──────────────────────────────────────────────────────

/// Violations of a single line item, prefixed with `items[index]`
pub fn validate_item(index: usize, item: &OrderItem) -> Vec<String> {
    let mut errors = Vec::new();
    let prefix = format!("items[{index}]");

    require_text(&mut errors, &item.menu_item_id, &format!("{prefix}.menuItemId"), MAX_NAME_LEN);
    require_text(&mut errors, &item.name, &format!("{prefix}.name"), MAX_NAME_LEN);

    if !item.price.is_finite() || item.price < 0.0 {
        errors.push(format!("{prefix}.price must be a non-negative number"));
    } else if item.price > MAX_PRICE {
        errors.push(format!("{prefix}.price exceeds maximum allowed ({MAX_PRICE})"));
    }

    if item.quantity <= 0 {
        errors.push(format!("{prefix}.quantity must be greater than 0"));
    } else if item.quantity > MAX_QUANTITY {
        errors.push(format!("{prefix}.quantity exceeds maximum allowed ({MAX_QUANTITY})"));
    }

    optional_text(&mut errors, &item.notes, &format!("{prefix}.notes"), MAX_NOTE_LEN);
    errors
}

/// Validate a fully-built order before it is persisted
pub fn validate_order(order: &Order) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if order.portal_id.trim().is_empty() {
        errors.push("portalId is required".to_string());
    }

    require_text(&mut errors, &order.customer.name, "customer.name", MAX_NAME_LEN);
    optional_text(&mut errors, &order.customer.email, "customer.email", MAX_EMAIL_LEN);
    optional_text(&mut errors, &order.customer.phone, "customer.phone", MAX_SHORT_TEXT_LEN);
    optional_text(&mut errors, &order.customer.table, "customer.table", MAX_SHORT_TEXT_LEN);
    optional_text(&mut errors, &order.notes, "notes", MAX_NOTE_LEN);

    if order.items.is_empty() {
        errors.push("items must contain at least one item".to_string());
    } else if order.items.len() > MAX_ITEMS {
        errors.push(format!("items exceeds maximum allowed ({MAX_ITEMS})"));
    }
    for (index, item) in order.items.iter().enumerate() {
        errors.extend(validate_item(index, item));
    }

    non_negative(&mut errors, order.subtotal, "subtotal");
    non_negative(&mut errors, order.total, "total");
    if let Some(tip) = order.tip {
        non_negative(&mut errors, tip, "tip");
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Parse a wire status value, reporting the allowed set on failure
pub fn parse_status(value: &str) -> Result<OrderStatus, String> {
    value.parse::<OrderStatus>().map_err(|_| {
        let allowed: Vec<_> = OrderStatus::ALL.iter().map(|s| s.as_str()).collect();
        format!("Invalid status '{value}', expected one of: {}", allowed.join(", "))
    })
}

/// Parse a comma-separated status filter (`pending,confirmed`)
pub fn parse_status_filter(value: &str) -> Result<Vec<OrderStatus>, String> {
    let mut statuses = Vec::new();
    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let status = parse_status(part)?;
        if !statuses.contains(&status) {
            statuses.push(status);
        }
    }
    Ok(statuses)
}

pub fn parse_payment_status(value: &str) -> Result<PaymentStatus, String> {
    value
        .parse::<PaymentStatus>()
        .map_err(|_| format!("Invalid payment status '{value}', expected one of: pending, paid, failed"))
}
