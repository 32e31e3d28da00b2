//! Storefront content managed from the admin area.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::auth::{AdminSection, AdminUser};
use crate::domain::aggregates::content::{PixelPlatform, PromoBanner, SocialLink, TrackingPixel};
use crate::{AppState, Result, StoreError};

async fn delete_row(s: &AppState, table: &str, id: Uuid, entity: &'static str) -> Result<StatusCode> {
    let done = sqlx::query(&format!("DELETE FROM {table} WHERE id = $1")).bind(id).execute(&s.db).await?;
    if done.rows_affected() == 0 {
        return Err(StoreError::NotFound(entity));
    }
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Banners
// =============================================================================

pub async fn list_banners(State(s): State<AppState>) -> Result<Json<Vec<PromoBanner>>> {
    let banners = sqlx::query_as::<_, PromoBanner>("SELECT * FROM promo_banners WHERE is_active ORDER BY position, created_at")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(banners))
}

#[derive(Debug, Deserialize, Validate)]
pub struct BannerRequest {
    #[validate(length(min = 1, max = 200))]
    pub title_ar: String,
    #[validate(length(min = 1, max = 200))]
    pub title_en: String,
    #[validate(length(max = 300))]
    pub subtitle_ar: Option<String>,
    #[validate(length(max = 300))]
    pub subtitle_en: Option<String>,
    #[validate(url)]
    pub image_url: String,
    #[validate(length(max = 500))]
    pub link_url: Option<String>,
    #[serde(default)]
    pub position: i32,
    pub is_active: Option<bool>,
}

pub async fn admin_list_banners(State(s): State<AppState>, AdminUser(user): AdminUser) -> Result<Json<Vec<PromoBanner>>> {
    user.require(AdminSection::Banners)?;
    let banners = sqlx::query_as::<_, PromoBanner>("SELECT * FROM promo_banners ORDER BY position, created_at")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(banners))
}

pub async fn create_banner(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Json(r): Json<BannerRequest>,
) -> Result<(StatusCode, Json<PromoBanner>)> {
    user.require(AdminSection::Banners)?;
    r.validate()?;
    let b = sqlx::query_as::<_, PromoBanner>(
        "INSERT INTO promo_banners (id, title_ar, title_en, subtitle_ar, subtitle_en, image_url, link_url, position, is_active, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&r.title_ar)
    .bind(&r.title_en)
    .bind(&r.subtitle_ar)
    .bind(&r.subtitle_en)
    .bind(&r.image_url)
    .bind(&r.link_url)
    .bind(r.position)
    .bind(r.is_active.unwrap_or(true))
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(b)))
}

pub async fn update_banner(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Path(id): Path<Uuid>,
    Json(r): Json<BannerRequest>,
) -> Result<Json<PromoBanner>> {
    user.require(AdminSection::Banners)?;
    r.validate()?;
    sqlx::query_as::<_, PromoBanner>(
        "UPDATE promo_banners SET title_ar = $2, title_en = $3, subtitle_ar = $4, subtitle_en = $5, image_url = $6, \
         link_url = $7, position = $8, is_active = $9 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&r.title_ar)
    .bind(&r.title_en)
    .bind(&r.subtitle_ar)
    .bind(&r.subtitle_en)
    .bind(&r.image_url)
    .bind(&r.link_url)
    .bind(r.position)
    .bind(r.is_active.unwrap_or(true))
    .fetch_optional(&s.db)
    .await?
    .map(Json)
    .ok_or(StoreError::NotFound("banner"))
}

pub async fn delete_banner(State(s): State<AppState>, AdminUser(user): AdminUser, Path(id): Path<Uuid>) -> Result<StatusCode> {
    user.require(AdminSection::Banners)?;
    delete_row(&s, "promo_banners", id, "banner").await
}

// =============================================================================
// Social links
// =============================================================================

pub async fn list_social_links(State(s): State<AppState>) -> Result<Json<Vec<SocialLink>>> {
    let links = sqlx::query_as::<_, SocialLink>("SELECT * FROM social_links WHERE is_active ORDER BY position, created_at")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(links))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SocialLinkRequest {
    #[validate(length(min = 1, max = 50))]
    pub platform: String,
    #[validate(url)]
    pub url: String,
    #[serde(default)]
    pub position: i32,
    pub is_active: Option<bool>,
}

pub async fn admin_list_social_links(State(s): State<AppState>, AdminUser(user): AdminUser) -> Result<Json<Vec<SocialLink>>> {
    user.require(AdminSection::SocialLinks)?;
    let links = sqlx::query_as::<_, SocialLink>("SELECT * FROM social_links ORDER BY position, created_at")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(links))
}

pub async fn create_social_link(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Json(r): Json<SocialLinkRequest>,
) -> Result<(StatusCode, Json<SocialLink>)> {
    user.require(AdminSection::SocialLinks)?;
    r.validate()?;
    let link = sqlx::query_as::<_, SocialLink>(
        "INSERT INTO social_links (id, platform, url, position, is_active, created_at) VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(r.platform.trim().to_lowercase())
    .bind(&r.url)
    .bind(r.position)
    .bind(r.is_active.unwrap_or(true))
    .fetch_one(&s.db)
    .await?;
    Ok((StatusCode::CREATED, Json(link)))
}

pub async fn update_social_link(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Path(id): Path<Uuid>,
    Json(r): Json<SocialLinkRequest>,
) -> Result<Json<SocialLink>> {
    user.require(AdminSection::SocialLinks)?;
    r.validate()?;
    sqlx::query_as::<_, SocialLink>(
        "UPDATE social_links SET platform = $2, url = $3, position = $4, is_active = $5 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(r.platform.trim().to_lowercase())
    .bind(&r.url)
    .bind(r.position)
    .bind(r.is_active.unwrap_or(true))
    .fetch_optional(&s.db)
    .await?
    .map(Json)
    .ok_or(StoreError::NotFound("social link"))
}

pub async fn delete_social_link(State(s): State<AppState>, AdminUser(user): AdminUser, Path(id): Path<Uuid>) -> Result<StatusCode> {
    user.require(AdminSection::SocialLinks)?;
    delete_row(&s, "social_links", id, "social link").await
}

// =============================================================================
// Tracking pixels
// =============================================================================

pub async fn list_pixels(State(s): State<AppState>) -> Result<Json<Vec<TrackingPixel>>> {
    let pixels = sqlx::query_as::<_, TrackingPixel>("SELECT * FROM tracking_pixels WHERE is_active ORDER BY created_at")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(pixels))
}

#[derive(Debug, Deserialize)]
pub struct PixelRequest {
    pub platform: PixelPlatform,
    pub pixel_id: String,
    pub is_active: Option<bool>,
}

impl PixelRequest {
    fn pixel_id(&self) -> Result<&str> {
        let id = self.pixel_id.trim();
        if id.len() > 100 || !self.platform.accepts(id) {
            return Err(StoreError::Validation(format!("invalid {} pixel id", self.platform)));
        }
        Ok(id)
    }
}

pub async fn admin_list_pixels(State(s): State<AppState>, AdminUser(user): AdminUser) -> Result<Json<Vec<TrackingPixel>>> {
    user.require(AdminSection::Pixels)?;
    let pixels = sqlx::query_as::<_, TrackingPixel>("SELECT * FROM tracking_pixels ORDER BY created_at")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(pixels))
}

pub async fn create_pixel(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Json(r): Json<PixelRequest>,
) -> Result<(StatusCode, Json<TrackingPixel>)> {
    user.require(AdminSection::Pixels)?;
    let pixel_id = r.pixel_id()?;
    let p = sqlx::query_as::<_, TrackingPixel>(
        "INSERT INTO tracking_pixels (id, platform, pixel_id, is_active, created_at) VALUES ($1, $2, $3, $4, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(r.platform.as_str())
    .bind(pixel_id)
    .bind(r.is_active.unwrap_or(true))
    .fetch_one(&s.db)
    .await?;
    tracing::info!(platform = %p.platform, "tracking pixel added");
    Ok((StatusCode::CREATED, Json(p)))
}

pub async fn update_pixel(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Path(id): Path<Uuid>,
    Json(r): Json<PixelRequest>,
) -> Result<Json<TrackingPixel>> {
    user.require(AdminSection::Pixels)?;
    let pixel_id = r.pixel_id()?;
    sqlx::query_as::<_, TrackingPixel>(
        "UPDATE tracking_pixels SET platform = $2, pixel_id = $3, is_active = $4 WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(r.platform.as_str())
    .bind(pixel_id)
    .bind(r.is_active.unwrap_or(true))
    .fetch_optional(&s.db)
    .await?
    .map(Json)
    .ok_or(StoreError::NotFound("pixel"))
}

pub async fn delete_pixel(State(s): State<AppState>, AdminUser(user): AdminUser, Path(id): Path<Uuid>) -> Result<StatusCode> {
    user.require(AdminSection::Pixels)?;
    delete_row(&s, "tracking_pixels", id, "pixel").await
}
