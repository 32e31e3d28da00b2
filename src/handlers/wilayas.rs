//! Wilayas and delivery pricing.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::RequestLocale;
use crate::auth::{AdminSection, AdminUser};
use crate::domain::aggregates::wilaya::WILAYA_CODES;
use crate::domain::aggregates::{DeliveryType, Wilaya};
use crate::domain::value_objects::MAX_PRICE;
use crate::{AppState, Result, StoreError};

pub(crate) async fn find_active(db: impl sqlx::PgExecutor<'_>, code: i32) -> Result<Wilaya> {
    sqlx::query_as::<_, Wilaya>("SELECT * FROM wilayas WHERE code = $1 AND is_active")
        .bind(code)
        .fetch_optional(db)
        .await?
        .ok_or(StoreError::NotFound("wilaya"))
}

pub async fn list_wilayas(State(s): State<AppState>) -> Result<Json<Vec<Wilaya>>> {
    let wilayas = sqlx::query_as::<_, Wilaya>("SELECT * FROM wilayas WHERE is_active ORDER BY code")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(wilayas))
}

pub async fn get_wilaya(State(s): State<AppState>, Path(code): Path<i32>) -> Result<Json<Wilaya>> {
    find_active(&s.db, code).await.map(Json)
}

#[derive(Debug, Deserialize)]
pub struct DeliveryQuery {
    #[serde(rename = "type", default)]
    pub delivery_type: DeliveryType,
}

#[derive(Debug, Serialize)]
pub struct DeliveryQuote {
    pub wilaya_code: i32,
    pub wilaya_name: String,
    pub delivery_type: DeliveryType,
    pub price: Decimal,
}

pub async fn delivery_quote(
    State(s): State<AppState>,
    RequestLocale(locale): RequestLocale,
    Path(code): Path<i32>,
    Query(q): Query<DeliveryQuery>,
) -> Result<Json<DeliveryQuote>> {
    let wilaya = find_active(&s.db, code).await?;
    Ok(Json(DeliveryQuote {
        wilaya_code: wilaya.code,
        wilaya_name: wilaya.display_name(locale).to_string(),
        delivery_type: q.delivery_type,
        price: wilaya.delivery_price(q.delivery_type),
    }))
}

// =============================================================================
// Admin
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct WilayaRequest {
    #[validate(length(min = 1, max = 100))]
    pub name_ar: String,
    #[validate(length(min = 1, max = 100))]
    pub name_en: String,
    pub home_delivery_price: Decimal,
    pub office_delivery_price: Decimal,
    pub is_active: Option<bool>,
}

impl WilayaRequest {
    fn check(&self, code: i32) -> Result<()> {
        self.validate()?;
        if !WILAYA_CODES.contains(&code) {
            return Err(StoreError::Validation(format!("wilaya code must be between 1 and 58, got {code}")));
        }
        if self.home_delivery_price < Decimal::ZERO || self.office_delivery_price < Decimal::ZERO {
            return Err(StoreError::Validation("delivery prices must not be negative".into()));
        }
        if self.home_delivery_price > MAX_PRICE || self.office_delivery_price > MAX_PRICE {
            return Err(StoreError::Validation(format!("delivery prices must not exceed {MAX_PRICE}")));
        }
        Ok(())
    }
}

pub async fn admin_list_wilayas(State(s): State<AppState>, AdminUser(user): AdminUser) -> Result<Json<Vec<Wilaya>>> {
    user.require(AdminSection::Wilayas)?;
    let wilayas = sqlx::query_as::<_, Wilaya>("SELECT * FROM wilayas ORDER BY code").fetch_all(&s.db).await?;
    Ok(Json(wilayas))
}

pub async fn upsert_wilaya(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Path(code): Path<i32>,
    Json(r): Json<WilayaRequest>,
) -> Result<Json<Wilaya>> {
    user.require(AdminSection::Wilayas)?;
    r.check(code)?;
    let w = sqlx::query_as::<_, Wilaya>(
        "INSERT INTO wilayas (id, code, name_ar, name_en, home_delivery_price, office_delivery_price, is_active, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, NOW()) \
         ON CONFLICT (code) DO UPDATE SET name_ar = EXCLUDED.name_ar, name_en = EXCLUDED.name_en, \
         home_delivery_price = EXCLUDED.home_delivery_price, office_delivery_price = EXCLUDED.office_delivery_price, \
         is_active = EXCLUDED.is_active RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(code)
    .bind(r.name_ar.trim())
    .bind(r.name_en.trim())
    .bind(r.home_delivery_price)
    .bind(r.office_delivery_price)
    .bind(r.is_active.unwrap_or(true))
    .fetch_one(&s.db)
    .await?;
    tracing::info!(code, home = %w.home_delivery_price, office = %w.office_delivery_price, "wilaya pricing saved");
    Ok(Json(w))
}
