//! Order tracking and the admin order desk.
//!
//! Status changes reconcile stock in the same transaction as the status
//! update: cancelling puts items back, un-cancelling takes them again.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use sqlx::PgConnection;
use std::collections::BTreeMap;
use uuid::Uuid;
use validator::Validate;

use super::{like_pattern, PaginatedResponse, Pagination};
use crate::auth::{AdminSection, AdminUser};
use crate::domain::aggregates::{Order, OrderItem, OrderStatus, OrderWithItems, StockAdjustment};
use crate::domain::events::DomainEvent;
use crate::domain::value_objects::PhoneNumber;
use crate::{AppState, Result, StoreError};

async fn load_items(conn: &mut PgConnection, order_id: Uuid) -> Result<Vec<OrderItem>> {
    let items = sqlx::query_as::<_, OrderItem>("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(&mut *conn)
        .await?;
    Ok(items)
}

/// Units per product across an order's lines, in a stable order so
/// concurrent reconciliations lock product rows in the same sequence.
fn units_by_product(items: &[OrderItem]) -> BTreeMap<Uuid, i32> {
    let mut units = BTreeMap::new();
    for item in items {
        *units.entry(item.product_id).or_insert(0) += item.quantity;
    }
    units
}

/// Applies a stock movement for the order's items. Returns the number of
/// units moved. A short deduction fails with `InsufficientStock`; the caller's
/// transaction is then dropped and nothing changes.
async fn reconcile_stock(conn: &mut PgConnection, items: &[OrderItem], adjustment: StockAdjustment) -> Result<u32> {
    let function = match adjustment {
        StockAdjustment::None => return Ok(0),
        StockAdjustment::Restore => "increase_product_stock",
        StockAdjustment::Deduct => "decrease_product_stock",
    };
    let mut moved = 0u32;
    for (product_id, quantity) in units_by_product(items) {
        let done: bool = sqlx::query_scalar(&format!("SELECT {function}($1, $2)"))
            .bind(product_id)
            .bind(quantity)
            .fetch_one(&mut *conn)
            .await?;
        match (done, adjustment) {
            (true, _) => moved += quantity.unsigned_abs(),
            (false, StockAdjustment::Deduct) => {
                let product = items
                    .iter()
                    .find(|i| i.product_id == product_id)
                    .map(|i| i.product_name.clone())
                    .unwrap_or_default();
                return Err(StoreError::InsufficientStock { product });
            }
            // Product row is gone; nothing to put back.
            (false, _) => tracing::warn!(%product_id, quantity, "stock restore skipped for missing product"),
        }
    }
    Ok(moved)
}

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub order_number: String,
    pub phone: String,
}

/// Customers look up an order by its number and the phone it was placed with.
/// A mismatch is reported as not found so numbers cannot be probed.
pub async fn track_order(State(s): State<AppState>, Query(q): Query<TrackQuery>) -> Result<Json<OrderWithItems>> {
    let phone = PhoneNumber::parse(&q.phone).map_err(|_| StoreError::NotFound("order"))?;
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE order_number = $1 AND customer_phone = $2")
        .bind(q.order_number.trim().to_uppercase())
        .bind(phone.as_str())
        .fetch_optional(&s.db)
        .await?
        .ok_or(StoreError::NotFound("order"))?;
    let mut conn = s.db.acquire().await?;
    let items = load_items(&mut conn, order.id).await?;
    Ok(Json(OrderWithItems { order, items }))
}

// =============================================================================
// Admin
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub search: Option<String>,
}

const ORDER_FILTER: &str = "($1::text IS NULL OR status = $1) \
     AND ($2::text IS NULL OR order_number ILIKE $2 OR customer_name ILIKE $2 OR customer_phone ILIKE $2)";

pub async fn admin_list_orders(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Query(page): Query<Pagination>,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<PaginatedResponse<Order>>> {
    user.require(AdminSection::Orders)?;
    let status = filter.status.map(|st| st.as_str());
    let search = filter.search.as_deref().filter(|t| !t.trim().is_empty()).map(like_pattern);
    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT * FROM orders WHERE {ORDER_FILTER} ORDER BY created_at DESC LIMIT $3 OFFSET $4"
    ))
    .bind(status)
    .bind(&search)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&s.db)
    .await?;
    let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM orders WHERE {ORDER_FILTER}"))
        .bind(status)
        .bind(&search)
        .fetch_one(&s.db)
        .await?;
    Ok(Json(PaginatedResponse::new(orders, total.0, &page)))
}

pub async fn admin_get_order(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderWithItems>> {
    user.require(AdminSection::Orders)?;
    let mut conn = s.db.acquire().await?;
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(StoreError::NotFound("order"))?;
    let items = load_items(&mut conn, order.id).await?;
    Ok(Json(OrderWithItems { order, items }))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

pub async fn update_status(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Path(id): Path<Uuid>,
    Json(r): Json<StatusRequest>,
) -> Result<Json<Order>> {
    user.require(AdminSection::Orders)?;
    let mut tx = s.db.begin().await?;
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound("order"))?;
    if order.status == r.status {
        return Ok(Json(order));
    }

    let adjustment = StockAdjustment::for_transition(order.status, r.status);
    let items = load_items(&mut tx, order.id).await?;
    let units = reconcile_stock(&mut tx, &items, adjustment).await?;

    let updated = sqlx::query_as::<_, Order>("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *")
        .bind(order.id)
        .bind(r.status.as_str())
        .fetch_one(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!(
        order_id = %order.id,
        from = %order.status,
        to = %updated.status,
        ?adjustment,
        units,
        by = %user.user_id,
        "order status changed"
    );
    s.events
        .publish(DomainEvent::OrderStatusChanged { order_id: order.id, from: order.status, to: updated.status })
        .await;
    if adjustment != StockAdjustment::None {
        s.events.publish(DomainEvent::StockAdjusted { order_id: order.id, adjustment, units }).await;
    }
    Ok(Json(updated))
}

#[derive(Debug, Deserialize, Validate)]
pub struct NotesRequest {
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

pub async fn update_notes(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Path(id): Path<Uuid>,
    Json(r): Json<NotesRequest>,
) -> Result<Json<Order>> {
    user.require(AdminSection::Orders)?;
    r.validate()?;
    let notes = r.notes.as_deref().map(str::trim).filter(|n| !n.is_empty());
    sqlx::query_as::<_, Order>("UPDATE orders SET notes = $2, updated_at = NOW() WHERE id = $1 RETURNING *")
        .bind(id)
        .bind(notes)
        .fetch_optional(&s.db)
        .await?
        .map(Json)
        .ok_or(StoreError::NotFound("order"))
}

/// Deleting an order that still holds stock gives that stock back first.
pub async fn delete_order(State(s): State<AppState>, AdminUser(user): AdminUser, Path(id): Path<Uuid>) -> Result<StatusCode> {
    user.require(AdminSection::Orders)?;
    let mut tx = s.db.begin().await?;
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StoreError::NotFound("order"))?;
    let adjustment = if order.status.holds_stock() { StockAdjustment::Restore } else { StockAdjustment::None };
    let items = load_items(&mut tx, order.id).await?;
    let units = reconcile_stock(&mut tx, &items, adjustment).await?;
    sqlx::query("DELETE FROM orders WHERE id = $1").bind(order.id).execute(&mut *tx).await?;
    tx.commit().await?;

    tracing::info!(order_id = %order.id, order_number = %order.order_number, units, by = %user.user_id, "order deleted");
    if adjustment != StockAdjustment::None {
        s.events.publish(DomainEvent::StockAdjusted { order_id: order.id, adjustment, units }).await;
    }
    Ok(StatusCode::NO_CONTENT)
}
