//! Admin dashboard figures.

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::auth::{AdminSection, AdminUser};
use crate::domain::aggregates::OrderStatus;
use crate::{AppState, Result};

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct LowStockProduct {
    pub id: Uuid,
    pub name_ar: String,
    pub name_en: String,
    pub stock: i32,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub orders_by_status: BTreeMap<&'static str, i64>,
    pub total_orders: i64,
    pub delivered_revenue: Decimal,
    pub orders_today: i64,
    pub pending_reviews: i64,
    pub low_stock_threshold: i32,
    pub low_stock: Vec<LowStockProduct>,
}

/// Every status is present in the result, with zero when no order has it.
fn status_counts(rows: Vec<(String, i64)>) -> BTreeMap<&'static str, i64> {
    let mut counts: BTreeMap<&'static str, i64> = OrderStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
    for (status, n) in rows {
        match status.parse::<OrderStatus>() {
            Ok(status) => *counts.entry(status.as_str()).or_insert(0) += n,
            Err(e) => tracing::warn!(error = %e, "order with unknown status skipped"),
        }
    }
    counts
}

pub async fn dashboard(State(s): State<AppState>, AdminUser(user): AdminUser) -> Result<Json<Dashboard>> {
    user.require(AdminSection::Dashboard)?;
    let rows: Vec<(String, i64)> = sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status")
        .fetch_all(&s.db)
        .await?;
    let orders_by_status = status_counts(rows);
    let total_orders = orders_by_status.values().sum();

    let (delivered_revenue,): (Option<Decimal>,) =
        sqlx::query_as("SELECT SUM(total) FROM orders WHERE status = $1")
            .bind(OrderStatus::Delivered.as_str())
            .fetch_one(&s.db)
            .await?;
    let (orders_today,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE created_at >= date_trunc('day', NOW())")
        .fetch_one(&s.db)
        .await?;
    let (pending_reviews,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reviews WHERE NOT is_approved")
        .fetch_one(&s.db)
        .await?;

    let low_stock_threshold = s.config.low_stock_threshold;
    let low_stock = sqlx::query_as::<_, LowStockProduct>(
        "SELECT id, name_ar, name_en, stock FROM products WHERE is_active AND stock <= $1 ORDER BY stock, name_en LIMIT 50",
    )
    .bind(low_stock_threshold)
    .fetch_all(&s.db)
    .await?;

    Ok(Json(Dashboard {
        orders_by_status,
        total_orders,
        delivered_revenue: delivered_revenue.unwrap_or(Decimal::ZERO),
        orders_today,
        pending_reviews,
        low_stock_threshold,
        low_stock,
    }))
}
