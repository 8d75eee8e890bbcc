//! Order API Handlers

use axum::{
    Json,
    body::Bytes,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
};
use serde::Deserialize;
use shared::ApiResponse;
use shared::models::{
    BulkStatusRequest, CancelOrderRequest, CreateOrderRequest, Order, OrderStats,
    UpdatePaymentRequest, UpdateStatusRequest,
};

use crate::core::ServerState;
use crate::orders::OrderQuery;
use crate::orders::validator::{parse_payment_status, parse_status, parse_status_filter};
use crate::utils::{AppError, AppResult, DateRange};

/// Query params for listing orders
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub portal_id: Option<String>,
    /// Comma-separated statuses
    pub status: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// List a portal's orders, newest first
pub async fn list(
    State(state): State<ServerState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<Vec<Order>>>> {
    let Query(query) = query?;
    let portal_id = query
        .portal_id
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::validation("portalId is required"))?;

    let statuses = match query.status.as_deref() {
        Some(raw) => parse_status_filter(raw).map_err(AppError::Validation)?,
        None => Vec::new(),
    };

    let orders = state
        .orders
        .list_orders(&OrderQuery {
            statuses,
            limit: query.limit,
            offset: query.offset.unwrap_or(0),
            ..OrderQuery::for_portal(portal_id)
        })
        .await?;
    Ok(Json(ApiResponse::ok(orders)))
}

/// Get order by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = state.orders.get_order(&id).await?;
    Ok(Json(ApiResponse::ok(order)))
}

/// Create an order
pub async fn create(
    State(state): State<ServerState>,
    payload: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<ApiResponse<Order>>)> {
    let Json(payload) = payload?;
    let order = state.orders.create_order(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(order, "Order created")),
    ))
}

/// Update order status
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let Json(payload) = payload?;
    let status = parse_status(&payload.status).map_err(AppError::Validation)?;
    let order = state.orders.update_status(&id, status).await?;
    Ok(Json(ApiResponse::ok(order)))
}

/// Update payment status
pub async fn update_payment(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePaymentRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let Json(payload) = payload?;
    let payment_status =
        parse_payment_status(&payload.payment_status).map_err(AppError::Validation)?;
    let order = state
        .orders
        .update_payment_status(&id, payment_status)
        .await?;
    Ok(Json(ApiResponse::ok(order)))
}

/// Cancel an order; an absent or empty body means no reason
pub async fn cancel(
    State(state): State<ServerState>,
    Path(id): Path<String>,
    body: Bytes,
) -> AppResult<Json<ApiResponse<Order>>> {
    let reason = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        serde_json::from_slice::<CancelOrderRequest>(&body)
            .map_err(|e| AppError::validation(format!("Invalid cancel body: {e}")))?
            .reason
    };
    let order = state.orders.cancel_order(&id, reason).await?;
    Ok(Json(ApiResponse::ok_with_message(order, "Order cancelled")))
}

/// Apply one status to many orders
pub async fn bulk_update_status(
    State(state): State<ServerState>,
    payload: Result<Json<BulkStatusRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<Vec<Order>>>> {
    let Json(payload) = payload?;
    let status = parse_status(&payload.status).map_err(AppError::Validation)?;
    let orders = state
        .orders
        .bulk_update_status(payload.ids, status)
        .await?;
    Ok(Json(ApiResponse::ok(orders)))
}

/// Order statistics for one portal
pub async fn stats(
    State(state): State<ServerState>,
    Path(portal_id): Path<String>,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> AppResult<Json<ApiResponse<OrderStats>>> {
    let Query(query) = query?;
    let range = DateRange::parse(query.start_date.as_deref(), query.end_date.as_deref())?;
    let stats = state.orders.get_order_stats(&portal_id, &range).await?;
    Ok(Json(ApiResponse::ok(stats)))
}
