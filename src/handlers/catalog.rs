//! Categories and products, storefront and admin.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{like_pattern, PaginatedResponse, Pagination, RequestLocale};
use crate::auth::{AdminSection, AdminUser};
use crate::domain::aggregates::{Category, Product, QuantityDiscount};
use crate::domain::value_objects::{slugify, MAX_PRICE, MAX_STOCK};
use crate::{AppState, Result, StoreError};

#[derive(Debug, Serialize)]
pub struct Localized<T: Serialize> {
    #[serde(flatten)]
    pub item: T,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_description: Option<String>,
    pub dir: &'static str,
}

fn localize_category(category: Category, locale: crate::Locale) -> Localized<Category> {
    let display_name = category.display_name(locale).to_string();
    Localized { item: category, display_name, display_description: None, dir: locale.dir() }
}

fn localize_product(product: Product, locale: crate::Locale) -> Localized<Product> {
    let display_name = product.display_name(locale).to_string();
    let display_description = locale
        .pick_opt(product.description_ar.as_deref(), product.description_en.as_deref())
        .map(str::to_string);
    Localized { item: product, display_name, display_description, dir: locale.dir() }
}

// =============================================================================
// Storefront
// =============================================================================

pub async fn list_categories(State(s): State<AppState>, RequestLocale(locale): RequestLocale) -> Result<Json<Vec<Localized<Category>>>> {
    let cats = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE is_active ORDER BY position, name_en")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(cats.into_iter().map(|c| localize_category(c, locale)).collect()))
}

pub async fn get_category(
    State(s): State<AppState>,
    RequestLocale(locale): RequestLocale,
    Path(slug): Path<String>,
) -> Result<Json<Localized<Category>>> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE slug = $1 AND is_active")
        .bind(&slug)
        .fetch_optional(&s.db)
        .await?
        .map(|c| Json(localize_category(c, locale)))
        .ok_or(StoreError::NotFound("category"))
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductFilter {
    pub category: Option<Uuid>,
    pub search: Option<String>,
    pub featured: Option<bool>,
}

const PRODUCT_FILTER: &str = "($1::uuid IS NULL OR category_id = $1) \
     AND ($2::text IS NULL OR name_en ILIKE $2 OR name_ar ILIKE $2) \
     AND ($3::bool IS NULL OR is_featured = $3)";

async fn query_products(s: &AppState, page: &Pagination, filter: &ProductFilter, active_only: bool) -> Result<(Vec<Product>, i64)> {
    let search = filter.search.as_deref().filter(|t| !t.trim().is_empty()).map(like_pattern);
    let active = if active_only { " AND is_active" } else { "" };
    let products = sqlx::query_as::<_, Product>(&format!(
        "SELECT * FROM products WHERE {PRODUCT_FILTER}{active} ORDER BY created_at DESC LIMIT $4 OFFSET $5"
    ))
    .bind(filter.category)
    .bind(&search)
    .bind(filter.featured)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(&s.db)
    .await?;
    let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM products WHERE {PRODUCT_FILTER}{active}"))
        .bind(filter.category)
        .bind(&search)
        .bind(filter.featured)
        .fetch_one(&s.db)
        .await?;
    Ok((products, total.0))
}

pub async fn list_products(
    State(s): State<AppState>,
    RequestLocale(locale): RequestLocale,
    Query(page): Query<Pagination>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<PaginatedResponse<Localized<Product>>>> {
    let (products, total) = query_products(&s, &page, &filter, true).await?;
    let data = products.into_iter().map(|p| localize_product(p, locale)).collect();
    Ok(Json(PaginatedResponse::new(data, total, &page)))
}

pub async fn get_product(
    State(s): State<AppState>,
    RequestLocale(locale): RequestLocale,
    Path(id): Path<Uuid>,
) -> Result<Json<Localized<Product>>> {
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 AND is_active")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .map(|p| Json(localize_product(p, locale)))
        .ok_or(StoreError::NotFound("product"))
}

// =============================================================================
// Admin: categories
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name_ar: String,
    #[validate(length(min = 1, max = 100))]
    pub name_en: String,
    pub slug: Option<String>,
    pub image_url: Option<String>,
    pub position: Option<i32>,
    pub is_active: Option<bool>,
}

impl CategoryRequest {
    fn slug(&self) -> Result<String> {
        let slug = slugify(self.slug.as_deref().unwrap_or(&self.name_en));
        if slug.is_empty() {
            return Err(StoreError::Validation("slug must contain latin letters or digits".into()));
        }
        Ok(slug)
    }
}

pub async fn admin_list_categories(State(s): State<AppState>, AdminUser(user): AdminUser) -> Result<Json<Vec<Category>>> {
    user.require(AdminSection::Categories)?;
    let cats = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY position, name_en")
        .fetch_all(&s.db)
        .await?;
    Ok(Json(cats))
}

pub async fn create_category(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Json(r): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>)> {
    user.require(AdminSection::Categories)?;
    r.validate()?;
    let c = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (id, name_ar, name_en, slug, image_url, position, is_active, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(r.name_ar.trim())
    .bind(r.name_en.trim())
    .bind(r.slug()?)
    .bind(&r.image_url)
    .bind(r.position.unwrap_or(0))
    .bind(r.is_active.unwrap_or(true))
    .fetch_one(&s.db)
    .await?;
    tracing::info!(category_id = %c.id, slug = %c.slug, "category created");
    Ok((StatusCode::CREATED, Json(c)))
}

pub async fn update_category(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Path(id): Path<Uuid>,
    Json(r): Json<CategoryRequest>,
) -> Result<Json<Category>> {
    user.require(AdminSection::Categories)?;
    r.validate()?;
    let c = sqlx::query_as::<_, Category>(
        "UPDATE categories SET name_ar = $2, name_en = $3, slug = $4, image_url = $5, position = $6, is_active = $7 \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(r.name_ar.trim())
    .bind(r.name_en.trim())
    .bind(r.slug()?)
    .bind(&r.image_url)
    .bind(r.position.unwrap_or(0))
    .bind(r.is_active.unwrap_or(true))
    .fetch_optional(&s.db)
    .await?
    .ok_or(StoreError::NotFound("category"))?;
    Ok(Json(c))
}

pub async fn delete_category(State(s): State<AppState>, AdminUser(user): AdminUser, Path(id): Path<Uuid>) -> Result<StatusCode> {
    user.require(AdminSection::Categories)?;
    let done = sqlx::query("DELETE FROM categories WHERE id = $1").bind(id).execute(&s.db).await?;
    if done.rows_affected() == 0 {
        return Err(StoreError::NotFound("category"));
    }
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Admin: products
// =============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct ProductRequest {
    pub category_id: Option<Uuid>,
    #[validate(length(min = 1, max = 200))]
    pub name_ar: String,
    #[validate(length(min = 1, max = 200))]
    pub name_en: String,
    pub description_ar: Option<String>,
    pub description_en: Option<String>,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    #[validate(range(min = 0))]
    pub stock: i32,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub discount_min_quantity: Option<i32>,
    pub discount_type: Option<String>,
    pub discount_value: Option<Decimal>,
}

impl ProductRequest {
    fn check(&self) -> Result<()> {
        self.validate()?;
        if self.price < Decimal::ZERO || self.original_price.is_some_and(|p| p < Decimal::ZERO) {
            return Err(StoreError::Validation("prices must not be negative".into()));
        }
        if self.price > MAX_PRICE || self.original_price.is_some_and(|p| p > MAX_PRICE) {
            return Err(StoreError::Validation(format!("prices must not exceed {MAX_PRICE}")));
        }
        if self.stock > MAX_STOCK {
            return Err(StoreError::Validation(format!("stock must not exceed {MAX_STOCK}")));
        }
        QuantityDiscount::from_parts(self.discount_min_quantity, self.discount_type.as_deref(), self.discount_value)
            .map_err(|e| StoreError::Validation(e.to_string()))?;
        Ok(())
    }
}

fn clean_list(values: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for v in values.iter().map(|v| v.trim()).filter(|v| !v.is_empty()) {
        if !out.iter().any(|o| o == v) {
            out.push(v.to_string());
        }
    }
    out
}

pub async fn admin_list_products(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Query(page): Query<Pagination>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<PaginatedResponse<Product>>> {
    user.require(AdminSection::Products)?;
    let (products, total) = query_products(&s, &page, &filter, false).await?;
    Ok(Json(PaginatedResponse::new(products, total, &page)))
}

pub async fn admin_get_product(State(s): State<AppState>, AdminUser(user): AdminUser, Path(id): Path<Uuid>) -> Result<Json<Product>> {
    user.require(AdminSection::Products)?;
    sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(&s.db)
        .await?
        .map(Json)
        .ok_or(StoreError::NotFound("product"))
}

pub async fn create_product(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Json(r): Json<ProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    user.require(AdminSection::Products)?;
    r.check()?;
    let p = sqlx::query_as::<_, Product>(
        "INSERT INTO products (id, category_id, name_ar, name_en, description_ar, description_en, price, original_price, stock, \
         sizes, colors, images, is_active, is_featured, discount_min_quantity, discount_type, discount_value, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, NOW(), NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(r.category_id)
    .bind(r.name_ar.trim())
    .bind(r.name_en.trim())
    .bind(&r.description_ar)
    .bind(&r.description_en)
    .bind(r.price)
    .bind(r.original_price)
    .bind(r.stock)
    .bind(clean_list(&r.sizes))
    .bind(clean_list(&r.colors))
    .bind(clean_list(&r.images))
    .bind(r.is_active.unwrap_or(true))
    .bind(r.is_featured.unwrap_or(false))
    .bind(r.discount_min_quantity)
    .bind(&r.discount_type)
    .bind(r.discount_value)
    .fetch_one(&s.db)
    .await?;
    tracing::info!(product_id = %p.id, stock = p.stock, "product created");
    Ok((StatusCode::CREATED, Json(p)))
}

pub async fn update_product(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Path(id): Path<Uuid>,
    Json(r): Json<ProductRequest>,
) -> Result<Json<Product>> {
    user.require(AdminSection::Products)?;
    r.check()?;
    let p = sqlx::query_as::<_, Product>(
        "UPDATE products SET category_id = $2, name_ar = $3, name_en = $4, description_ar = $5, description_en = $6, \
         price = $7, original_price = $8, stock = $9, sizes = $10, colors = $11, images = $12, is_active = $13, \
         is_featured = $14, discount_min_quantity = $15, discount_type = $16, discount_value = $17, updated_at = NOW() \
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(r.category_id)
    .bind(r.name_ar.trim())
    .bind(r.name_en.trim())
    .bind(&r.description_ar)
    .bind(&r.description_en)
    .bind(r.price)
    .bind(r.original_price)
    .bind(r.stock)
    .bind(clean_list(&r.sizes))
    .bind(clean_list(&r.colors))
    .bind(clean_list(&r.images))
    .bind(r.is_active.unwrap_or(true))
    .bind(r.is_featured.unwrap_or(false))
    .bind(r.discount_min_quantity)
    .bind(&r.discount_type)
    .bind(r.discount_value)
    .fetch_optional(&s.db)
    .await?
    .ok_or(StoreError::NotFound("product"))?;
    Ok(Json(p))
}

/// Products referenced by orders are deactivated instead of removed.
pub async fn delete_product(State(s): State<AppState>, AdminUser(user): AdminUser, Path(id): Path<Uuid>) -> Result<StatusCode> {
    user.require(AdminSection::Products)?;
    let ordered: (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM order_items WHERE product_id = $1)")
        .bind(id)
        .fetch_one(&s.db)
        .await?;
    let done = if ordered.0 {
        sqlx::query("UPDATE products SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
    } else {
        sqlx::query("DELETE FROM products WHERE id = $1")
    }
    .bind(id)
    .execute(&s.db)
    .await?;
    if done.rows_affected() == 0 {
        return Err(StoreError::NotFound("product"));
    }
    tracing::info!(product_id = %id, soft = ordered.0, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct StockAdjustRequest {
    pub delta: i64,
}

impl StockAdjustRequest {
    fn check(&self) -> Result<()> {
        if self.delta == 0 || self.delta.abs() > i64::from(MAX_STOCK) {
            return Err(StoreError::Validation(format!("stock delta must be non-zero and at most {MAX_STOCK} either way")));
        }
        Ok(())
    }
}

pub async fn adjust_stock(
    State(s): State<AppState>,
    AdminUser(user): AdminUser,
    Path(id): Path<Uuid>,
    Json(r): Json<StockAdjustRequest>,
) -> Result<Json<Product>> {
    user.require(AdminSection::Products)?;
    r.check()?;
    let updated = sqlx::query_as::<_, Product>(
        "UPDATE products SET stock = (stock::bigint + $2)::integer, updated_at = NOW() \
         WHERE id = $1 AND stock::bigint + $2 BETWEEN 0 AND $3 RETURNING *",
    )
    .bind(id)
    .bind(r.delta)
    .bind(i64::from(MAX_STOCK))
    .fetch_optional(&s.db)
    .await?;
    match updated {
        Some(p) => {
            tracing::info!(product_id = %id, delta = r.delta, stock = p.stock, "stock adjusted");
            Ok(Json(p))
        }
        None => {
            let name: Option<(String,)> = sqlx::query_as("SELECT name_en FROM products WHERE id = $1")
                .bind(id)
                .fetch_optional(&s.db)
                .await?;
            match name {
                Some(_) if r.delta > 0 => Err(StoreError::Validation(format!("stock must not exceed {MAX_STOCK}"))),
                Some((product,)) => Err(StoreError::InsufficientStock { product }),
                None => Err(StoreError::NotFound("product")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn request() -> ProductRequest {
        ProductRequest {
            category_id: None,
            name_ar: "قميص".into(),
            name_en: "Shirt".into(),
            description_ar: None,
            description_en: None,
            price: dec!(1800),
            original_price: None,
            stock: 3,
            sizes: vec![],
            colors: vec![],
            images: vec![],
            is_active: None,
            is_featured: None,
            discount_min_quantity: None,
            discount_type: None,
            discount_value: None,
        }
    }

    #[test]
    fn product_request_checks_discount_and_price() {
        assert!(request().check().is_ok());
        let mut r = request();
        r.discount_min_quantity = Some(2);
        assert!(matches!(r.check(), Err(StoreError::Validation(_))));
        let mut r = request();
        r.price = dec!(-1);
        assert!(r.check().is_err());
        let mut r = request();
        r.stock = -4;
        assert!(r.check().is_err());
    }

    #[test]
    fn product_request_caps_price_and_stock() {
        let mut r = request();
        r.price = MAX_PRICE;
        assert!(r.check().is_ok());
        r.price = MAX_PRICE + dec!(0.01);
        assert!(matches!(r.check(), Err(StoreError::Validation(_))));
        let mut r = request();
        r.original_price = Some(dec!(10000000000));
        assert!(r.check().is_err());
        let mut r = request();
        r.stock = MAX_STOCK + 1;
        assert!(r.check().is_err());
    }

    #[test]
    fn stock_delta_is_bounded() {
        assert!(StockAdjustRequest { delta: -3 }.check().is_ok());
        assert!(StockAdjustRequest { delta: 0 }.check().is_err());
        assert!(StockAdjustRequest { delta: i64::from(i32::MAX) }.check().is_err());
        assert!(StockAdjustRequest { delta: -i64::from(MAX_STOCK) - 1 }.check().is_err());
    }

    #[test]
    fn product_description_falls_back_to_other_language() {
        let mut p = crate::domain::aggregates::product::tests::product(dec!(900), 2);
        p.description_ar = None;
        p.description_en = Some("Leather sneaker".into());
        let localized = localize_product(p, crate::Locale::Ar);
        assert_eq!(localized.display_description.as_deref(), Some("Leather sneaker"));
        assert_eq!(localized.dir, "rtl");
    }

    #[test]
    fn option_lists_are_cleaned() {
        let cleaned = clean_list(&[" M ".into(), "".into(), "M".into(), "L".into()]);
        assert_eq!(cleaned, vec!["M".to_string(), "L".to_string()]);
    }

    #[test]
    fn category_slug_falls_back_to_english_name() {
        let r = CategoryRequest {
            name_ar: "أحذية".into(), name_en: "Kids Shoes".into(), slug: None,
            image_url: None, position: None, is_active: None,
        };
        assert_eq!(r.slug().unwrap(), "kids-shoes");
    }
}
