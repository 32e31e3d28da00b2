//! Server-side session carts.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::checkout::{check_line_quantity, MAX_LINE_QUANTITY};
use crate::domain::aggregates::cart::normalize_option;
use crate::domain::aggregates::{CartItem, CartItemView, Product};
use crate::{AppState, Result, StoreError};

const CART_VIEW: &str = "SELECT c.id, c.product_id, c.size, c.color, c.quantity, p.name_ar, p.name_en, p.price, p.stock, \
     p.images[1] AS image FROM cart_items c JOIN products p ON p.id = c.product_id";

#[derive(Debug, Serialize)]
pub struct CartView {
    pub session_id: String,
    pub items: Vec<CartItemView>,
    pub item_count: i64,
    pub subtotal: Decimal,
}

fn check_session(session: &str) -> Result<()> {
    if session.is_empty() || session.len() > 128 {
        return Err(StoreError::Validation("session id must be 1 to 128 characters".into()));
    }
    Ok(())
}

pub async fn get_cart(State(s): State<AppState>, Path(session): Path<String>) -> Result<Json<CartView>> {
    check_session(&session)?;
    let items = sqlx::query_as::<_, CartItemView>(&format!("{CART_VIEW} WHERE c.session_id = $1 AND p.is_active ORDER BY c.created_at"))
        .bind(&session)
        .fetch_all(&s.db)
        .await?;
    let item_count = items.iter().map(|i| i64::from(i.quantity)).sum();
    let subtotal = items.iter().map(|i| i.price * Decimal::from(i.quantity)).sum();
    Ok(Json(CartView { session_id: session, items, item_count, subtotal }))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub size: Option<String>,
    pub color: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub quantity: i32,
}

async fn in_cart(s: &AppState, session: &str, product_id: Uuid, excluding: Option<Uuid>) -> Result<i64> {
    let held: (Option<i64>,) = sqlx::query_as(
        "SELECT SUM(quantity)::BIGINT FROM cart_items WHERE session_id = $1 AND product_id = $2 AND ($3::uuid IS NULL OR id <> $3)",
    )
    .bind(session)
    .bind(product_id)
    .bind(excluding)
    .fetch_one(&s.db)
    .await?;
    Ok(held.0.unwrap_or(0))
}

fn ensure_stock(product: &Product, wanted: i64) -> Result<()> {
    if wanted > i64::from(product.stock) {
        return Err(StoreError::InsufficientStock { product: product.name_en.clone() });
    }
    Ok(())
}

pub async fn add_to_cart(
    State(s): State<AppState>,
    Path(session): Path<String>,
    Json(r): Json<AddToCartRequest>,
) -> Result<(StatusCode, Json<CartItem>)> {
    check_session(&session)?;
    r.validate()?;
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 AND is_active")
        .bind(r.product_id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(StoreError::NotFound("product"))?;
    let size = normalize_option(r.size.clone());
    let color = normalize_option(r.color.clone());
    product
        .check_options(size.as_deref(), color.as_deref())
        .map_err(|e| StoreError::Validation(e.to_string()))?;
    let (size, color) = (size.unwrap_or_default(), color.unwrap_or_default());
    let line: Option<(i32,)> =
        sqlx::query_as("SELECT quantity FROM cart_items WHERE session_id = $1 AND product_id = $2 AND size = $3 AND color = $4")
            .bind(&session)
            .bind(product.id)
            .bind(&size)
            .bind(&color)
            .fetch_optional(&s.db)
            .await?;
    check_line_quantity(line.map_or(0, |(q,)| i64::from(q)) + i64::from(r.quantity))?;
    ensure_stock(&product, in_cart(&s, &session, product.id, None).await? + i64::from(r.quantity))?;

    // The conflict guard keeps concurrent adds from merging past the line cap.
    let item = sqlx::query_as::<_, CartItem>(
        "INSERT INTO cart_items (id, session_id, product_id, size, color, quantity, created_at) VALUES ($1, $2, $3, $4, $5, $6, NOW()) \
         ON CONFLICT (session_id, product_id, size, color) DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity \
         WHERE cart_items.quantity + EXCLUDED.quantity <= $7 RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&session)
    .bind(product.id)
    .bind(&size)
    .bind(&color)
    .bind(r.quantity)
    .bind(MAX_LINE_QUANTITY as i32)
    .fetch_optional(&s.db)
    .await?
    .ok_or_else(|| StoreError::Validation(format!("at most {MAX_LINE_QUANTITY} units per line")))?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuantityRequest {
    #[validate(range(min = 0, max = 100))]
    pub quantity: i32,
}

/// Sets a line's quantity; zero removes the line.
pub async fn update_item(
    State(s): State<AppState>,
    Path((session, item_id)): Path<(String, Uuid)>,
    Json(r): Json<UpdateQuantityRequest>,
) -> Result<StatusCode> {
    r.validate()?;
    check_line_quantity(i64::from(r.quantity))?;
    if r.quantity == 0 {
        return remove_item(State(s), Path((session, item_id))).await;
    }
    let item = sqlx::query_as::<_, CartItem>("SELECT * FROM cart_items WHERE id = $1 AND session_id = $2")
        .bind(item_id)
        .bind(&session)
        .fetch_optional(&s.db)
        .await?
        .ok_or(StoreError::NotFound("cart item"))?;
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(item.product_id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(StoreError::NotFound("product"))?;
    ensure_stock(&product, in_cart(&s, &session, product.id, Some(item.id)).await? + i64::from(r.quantity))?;
    sqlx::query("UPDATE cart_items SET quantity = $2 WHERE id = $1")
        .bind(item.id)
        .bind(r.quantity)
        .execute(&s.db)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_item(State(s): State<AppState>, Path((session, item_id)): Path<(String, Uuid)>) -> Result<StatusCode> {
    let done = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND session_id = $2")
        .bind(item_id)
        .bind(&session)
        .execute(&s.db)
        .await?;
    if done.rows_affected() == 0 {
        return Err(StoreError::NotFound("cart item"));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn clear_cart(State(s): State<AppState>, Path(session): Path<String>) -> Result<StatusCode> {
    sqlx::query("DELETE FROM cart_items WHERE session_id = $1").bind(&session).execute(&s.db).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::tests::product;
    use rust_decimal_macros::dec;

    #[test]
    fn session_id_bounds() {
        assert!(check_session("").is_err());
        assert!(check_session(&"x".repeat(129)).is_err());
        assert!(check_session("b7f1c2").is_ok());
    }

    #[test]
    fn merged_line_respects_checkout_cap() {
        assert!(check_line_quantity(80 + 20).is_ok());
        assert!(matches!(check_line_quantity(80 + 80), Err(StoreError::Validation(_))));
    }

    #[test]
    fn stock_limits_cart_quantity() {
        let p = product(dec!(900), 4);
        assert!(ensure_stock(&p, 4).is_ok());
        assert!(matches!(ensure_stock(&p, 5), Err(StoreError::InsufficientStock { .. })));
    }
}
