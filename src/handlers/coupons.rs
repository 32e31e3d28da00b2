//! Coupon validation and admin management.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::checkout::{quote_cart, CheckoutItem};
use super::RequestLocale;
use crate::auth::{AdminSection, AdminUser};
use crate::domain::aggregates::{Cart, CartLine, Coupon, DiscountType};
use crate::domain::value_objects::CouponCode;
use crate::{AppState, Result, StoreError};

#[derive(Debug, Deserialize, Validate)]
pub struct ValidateCouponRequest {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    #[validate]
    pub items: Vec<CheckoutItem>,
}

#[derive(Debug, Serialize)]
pub struct CouponCheck {
    pub valid: bool,
    pub code: String,
    pub discount: Decimal,
    pub goods_amount: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Answers whether a code applies to a cart. Rejections are a normal answer
/// (`valid: false`), not an error response.
pub async fn validate_coupon(
    State(s): State<AppState>,
    RequestLocale(locale): RequestLocale,
    Json(r): Json<ValidateCouponRequest>,
) -> Result<Json<CouponCheck>> {
    r.validate()?;
    let code = CouponCode::new(&r.code).ok_or_else(|| StoreError::Validation("coupon code is blank".into()))?;
    let cart = Cart::from_lines(r.items.iter().map(CartLine::from));
    if cart.is_empty() {
        return Err(StoreError::Validation("the cart is empty".into()));
    }
    let mut conn = s.db.acquire().await?;
    match quote_cart(&mut conn, &cart, None, Default::default(), Some(code.as_str()), locale).await {
        Ok((quote, _)) => Ok(Json(CouponCheck {
            valid: true,
            code: code.to_string(),
            discount: quote.coupon_discount,
            goods_amount: quote.goods_amount(),
            message: None,
        })),
        Err(StoreError::CouponRejected(reason)) => Ok(Json(CouponCheck {
            valid: false,
            code: code.to_string(),
            discount: Decimal::ZERO,
            goods_amount: Decimal::ZERO,
            message: Some(reason.message(locale)),
        })),
        Err(e) => Err(e),
    }
}

// =============================================================================
// Admin
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CouponRequest {
    #[validate(length(min = 1, max = 50))]
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_order_amount: Option<Decimal>,
    #[validate(range(min = 1))]
    pub max_uses: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
    pub applies_to_all: Option<bool>,
    #[serde(default)]
    pub product_ids: Vec<Uuid>,
}

impl CouponRequest {
    fn check(&self) -> Result<CouponCode> {
        self.validate()?;
        let code = CouponCode::new(&self.code).ok_or_else(|| StoreError::Validation("coupon code is blank".into()))?;
        if self.discount_value <= Decimal::ZERO {
            return Err(StoreError::Validation("discount value must be positive".into()));
        }
        if self.discount_type == DiscountType::Percentage && self.discount_value > Decimal::ONE_HUNDRED {
            return Err(StoreError::Validation("percentage discount cannot exceed 100".into()));
        }
        if self.min_order_amount.is_some_and(|m| m < Decimal::ZERO) {
            return Err(StoreError::Validation("minimum order amount must not be negative".into()));
        }
        if !self.applies_to_all.unwrap_or(true) && self.product_ids.is_empty() {
            return Err(StoreError::Validation("a scoped coupon needs at least one product".into()));
        }
        Ok(code)
    }
}

pub async fn admin_list_coupons(State(s): State<AppState>, AdminUser(user): AdminUser) -> Result<Json<Vec<Coupon>>> {
    user.require(AdminSection::Coupons)?;
    let coupons = sqlx::query_as::<_, Coupon>("SELECT * FROM coupons ORDER BY created_at DESC").fetch_all(&s.db).await?;
    Ok(Json(coupons))
}

pub async fn create_coupon(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Json(r): Json<CouponRequest>,
) -> Result<(StatusCode, Json<Coupon>)> {
    user.require(AdminSection::Coupons)?;
    let code = r.check()?;
    let c = sqlx::query_as::<_, Coupon>(
        "INSERT INTO coupons (id, code, discount_type, discount_value, min_order_amount, max_uses, used_count, expires_at, \
         is_active, applies_to_all, product_ids, created_at) VALUES ($1, $2, $3, $4, $5, $6, 0, $7, $8, $9, $10, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(code.as_str())
    .bind(r.discount_type.as_str())
    .bind(r.discount_value)
    .bind(r.min_order_amount)
    .bind(r.max_uses)
    .bind(r.expires_at)
    .bind(r.is_active.unwrap_or(true))
    .bind(r.applies_to_all.unwrap_or(true))
    .bind(&r.product_ids)
    .fetch_one(&s.db)
    .await?;
    tracing::info!(coupon_id = %c.id, code = %c.code, "coupon created");
    Ok((StatusCode::CREATED, Json(c)))
}

/// Usage count is kept; lowering `max_uses` below it is rejected.
pub async fn update_coupon(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Path(id): Path<Uuid>,
    Json(r): Json<CouponRequest>,
) -> Result<Json<Coupon>> {
    user.require(AdminSection::Coupons)?;
    let code = r.check()?;
    let current = sqlx::query_as::<_, Coupon>("SELECT * FROM coupons WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .ok_or(StoreError::NotFound("coupon"))?;
    if r.max_uses.is_some_and(|max| max < current.used_count) {
        return Err(StoreError::Validation(format!("coupon was already used {} times", current.used_count)));
    }
    let c = sqlx::query_as::<_, Coupon>(
        "UPDATE coupons SET code = $2, discount_type = $3, discount_value = $4, min_order_amount = $5, max_uses = $6, \
         expires_at = $7, is_active = $8, applies_to_all = $9, product_ids = $10 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(code.as_str())
    .bind(r.discount_type.as_str())
    .bind(r.discount_value)
    .bind(r.min_order_amount)
    .bind(r.max_uses)
    .bind(r.expires_at)
    .bind(r.is_active.unwrap_or(true))
    .bind(r.applies_to_all.unwrap_or(true))
    .bind(&r.product_ids)
    .fetch_one(&s.db)
    .await?;
    Ok(Json(c))
}

pub async fn delete_coupon(State(s): State<AppState>, AdminUser(user): AdminUser, Path(id): Path<Uuid>) -> Result<StatusCode> {
    user.require(AdminSection::Coupons)?;
    let done = sqlx::query("DELETE FROM coupons WHERE id = $1").bind(id).execute(&s.db).await?;
    if done.rows_affected() == 0 {
        return Err(StoreError::NotFound("coupon"));
    }
    Ok(StatusCode::NO_CONTENT)
}
