//! Cash-on-delivery checkout.
//!
//! Placing an order runs in one transaction: the order row, its items, the
//! stock decrements and the coupon usage either all land or none do.

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde::Deserialize;
use sqlx::PgConnection;
use std::collections::HashMap;
use uuid::Uuid;
use validator::Validate;

use super::{wilayas, RequestLocale};
use crate::domain::aggregates::{Cart, CartLine, Coupon, CouponRejection, DeliveryType, Order, OrderItem, OrderWithItems, Product};
use crate::domain::events::DomainEvent;
use crate::domain::pricing::{LineQuote, Quote};
use crate::domain::value_objects::{validate_customer_name, validate_phone, CouponCode, OrderNumber, PhoneNumber};
use crate::{AppState, Locale, Result, StoreError};

pub const MAX_LINE_QUANTITY: u32 = 100;
/// Distinct lines per order. With the line and price caps this keeps order
/// totals inside the `NUMERIC(12,2)` columns.
pub const MAX_CART_LINES: usize = 50;

/// Rejects a line whose merged quantity exceeds what checkout accepts.
pub(crate) fn check_line_quantity(quantity: i64) -> Result<()> {
    if quantity > i64::from(MAX_LINE_QUANTITY) {
        return Err(StoreError::Validation(format!("at most {MAX_LINE_QUANTITY} units per line, got {quantity}")));
    }
    Ok(())
}

/// A blank code means no coupon; a code that cannot be a coupon is unknown.
pub(crate) fn requested_coupon(raw: Option<&str>) -> Result<Option<CouponCode>> {
    match raw.map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => CouponCode::new(code).map(Some).ok_or(StoreError::CouponRejected(CouponRejection::Unknown)),
        None => Ok(None),
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckoutItem {
    pub product_id: Uuid,
    pub size: Option<String>,
    pub color: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub quantity: u32,
}

impl From<&CheckoutItem> for CartLine {
    fn from(item: &CheckoutItem) -> Self {
        CartLine { product_id: item.product_id, size: item.size.clone(), color: item.color.clone(), quantity: item.quantity }
    }
}

fn cart_from_items(items: &[CheckoutItem]) -> Result<Cart> {
    let cart = Cart::from_lines(items.iter().map(CartLine::from));
    if cart.is_empty() {
        return Err(StoreError::Validation("the cart is empty".into()));
    }
    if cart.lines().len() > MAX_CART_LINES {
        return Err(StoreError::Validation(format!("at most {MAX_CART_LINES} lines per order")));
    }
    for line in cart.lines() {
        check_line_quantity(i64::from(line.quantity))?;
    }
    Ok(cart)
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(custom = "validate_customer_name")]
    pub customer_name: String,
    #[validate(custom = "validate_phone")]
    pub customer_phone: String,
    pub wilaya_code: i32,
    #[serde(default)]
    pub delivery_type: DeliveryType,
    #[validate(length(max = 100))]
    pub commune: Option<String>,
    #[validate(length(max = 300))]
    pub address: Option<String>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    pub coupon_code: Option<String>,
    /// Session cart to clear once the order is placed.
    pub session_id: Option<String>,
    #[validate]
    pub items: Vec<CheckoutItem>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct QuoteRequest {
    pub wilaya_code: Option<i32>,
    #[serde(default)]
    pub delivery_type: DeliveryType,
    pub coupon_code: Option<String>,
    #[validate]
    pub items: Vec<CheckoutItem>,
}

/// Loads the cart's products keyed by id, optionally row-locking them.
pub(crate) async fn load_products(conn: &mut PgConnection, ids: &[Uuid], lock: bool) -> Result<HashMap<Uuid, Product>> {
    let sql = if lock {
        "SELECT * FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE"
    } else {
        "SELECT * FROM products WHERE id = ANY($1)"
    };
    let products = sqlx::query_as::<_, Product>(sql).bind(ids).fetch_all(&mut *conn).await?;
    Ok(products.into_iter().map(|p| (p.id, p)).collect())
}

/// Prices every cart line, rejecting unknown or inactive products, invalid
/// options and quantities above the product's stock.
pub(crate) fn price_lines(cart: &Cart, products: &HashMap<Uuid, Product>, locale: Locale) -> Result<Vec<LineQuote>> {
    for (product_id, quantity) in cart.quantity_by_product() {
        let product = products.get(&product_id).filter(|p| p.is_active).ok_or(StoreError::NotFound("product"))?;
        if i64::from(quantity) > i64::from(product.stock) {
            return Err(StoreError::InsufficientStock { product: product.display_name(locale).to_string() });
        }
    }
    cart.lines()
        .iter()
        .map(|line| -> Result<LineQuote> {
            let product = &products[&line.product_id];
            product
                .check_options(line.size.as_deref(), line.color.as_deref())
                .map_err(|e| StoreError::Validation(format!("{}: {e}", product.display_name(locale))))?;
            Ok(LineQuote::new(product, line, locale))
        })
        .collect()
}

pub(crate) async fn find_coupon(conn: &mut PgConnection, code: &CouponCode, lock: bool) -> Result<Coupon> {
    let sql = if lock {
        "SELECT * FROM coupons WHERE code = $1 FOR UPDATE"
    } else {
        "SELECT * FROM coupons WHERE code = $1"
    };
    sqlx::query_as::<_, Coupon>(sql)
        .bind(code.as_str())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(StoreError::CouponRejected(CouponRejection::Unknown))
}

/// Prices a cart without placing it. Delivery is zero when no wilaya is given.
pub(crate) async fn quote_cart(
    conn: &mut PgConnection,
    cart: &Cart,
    wilaya_code: Option<i32>,
    delivery_type: DeliveryType,
    coupon_code: Option<&str>,
    locale: Locale,
) -> Result<(Quote, Option<Coupon>)> {
    let products = load_products(&mut *conn, &cart.product_ids(), false).await?;
    let lines = price_lines(cart, &products, locale)?;
    let delivery_price = match wilaya_code {
        Some(code) => wilayas::find_active(&mut *conn, code).await?.delivery_price(delivery_type),
        None => rust_decimal::Decimal::ZERO,
    };
    let mut quote = Quote::new(lines, delivery_price);
    let coupon = match requested_coupon(coupon_code)? {
        Some(code) => {
            let coupon = find_coupon(&mut *conn, &code, false).await?;
            quote.apply_coupon(&coupon, Utc::now())?;
            Some(coupon)
        }
        None => None,
    };
    Ok((quote, coupon))
}

pub async fn quote(
    State(s): State<AppState>,
    RequestLocale(locale): RequestLocale,
    Json(r): Json<QuoteRequest>,
) -> Result<Json<Quote>> {
    r.validate()?;
    let cart = cart_from_items(&r.items)?;
    let mut conn = s.db.acquire().await?;
    let (quote, _) = quote_cart(&mut conn, &cart, r.wilaya_code, r.delivery_type, r.coupon_code.as_deref(), locale).await?;
    Ok(Json(quote))
}

pub async fn place_order(
    State(s): State<AppState>,
    RequestLocale(locale): RequestLocale,
    Json(r): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderWithItems>)> {
    r.validate()?;
    let phone = PhoneNumber::parse(&r.customer_phone).map_err(|e| StoreError::Validation(e.to_string()))?;
    let cart = cart_from_items(&r.items)?;
    let coupon_code = requested_coupon(r.coupon_code.as_deref())?;

    let mut tx = s.db.begin().await?;

    let products = load_products(&mut tx, &cart.product_ids(), true).await?;
    let lines = price_lines(&cart, &products, locale)?;
    let wilaya = wilayas::find_active(&mut *tx, r.wilaya_code).await?;
    let mut quote = Quote::new(lines, wilaya.delivery_price(r.delivery_type));

    let coupon = match coupon_code {
        Some(code) => {
            let coupon = find_coupon(&mut tx, &code, true).await?;
            quote.apply_coupon(&coupon, Utc::now())?;
            Some(coupon)
        }
        None => None,
    };

    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (id, order_number, customer_name, customer_phone, wilaya_code, commune, address, delivery_type, \
         subtotal, quantity_discount, coupon_id, coupon_code, coupon_discount, delivery_price, total, status, notes, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, 'pending', $16, NOW(), NOW()) RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(OrderNumber::generate().as_str())
    .bind(r.customer_name.trim())
    .bind(phone.as_str())
    .bind(wilaya.code)
    .bind(r.commune.as_deref().map(str::trim))
    .bind(r.address.as_deref().map(str::trim))
    .bind(r.delivery_type.as_str())
    .bind(quote.subtotal)
    .bind(quote.quantity_discount)
    .bind(coupon.as_ref().map(|c| c.id))
    .bind(&quote.coupon_code)
    .bind(quote.coupon_discount)
    .bind(quote.delivery_price)
    .bind(quote.total)
    .bind(&r.notes)
    .fetch_one(&mut *tx)
    .await?;

    let mut items = Vec::with_capacity(quote.lines.len());
    for line in &quote.lines {
        let item = sqlx::query_as::<_, OrderItem>(
            "INSERT INTO order_items (id, order_id, product_id, product_name, size, color, quantity, unit_price, discount, line_total) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(order.id)
        .bind(line.product_id)
        .bind(&line.product_name)
        .bind(&line.size)
        .bind(&line.color)
        .bind(line.quantity as i32)
        .bind(line.unit_price)
        .bind(line.discount)
        .bind(line.net)
        .fetch_one(&mut *tx)
        .await?;
        items.push(item);
    }

    for (product_id, quantity) in cart.quantity_by_product() {
        let taken: bool = sqlx::query_scalar("SELECT decrease_product_stock($1, $2)")
            .bind(product_id)
            .bind(quantity as i32)
            .fetch_one(&mut *tx)
            .await?;
        if !taken {
            let product = products[&product_id].display_name(locale).to_string();
            tracing::warn!(%product_id, quantity, "stock ran out during checkout");
            return Err(StoreError::InsufficientStock { product });
        }
    }

    if let Some(coupon) = &coupon {
        let applied: bool = sqlx::query_scalar("SELECT apply_coupon_atomic($1)")
            .bind(coupon.id)
            .fetch_one(&mut *tx)
            .await?;
        if !applied {
            return Err(CouponRejection::Exhausted.into());
        }
    }

    tx.commit().await?;

    if let Some(session) = r.session_id.as_deref().filter(|s| !s.is_empty()) {
        if let Err(e) = sqlx::query("DELETE FROM cart_items WHERE session_id = $1").bind(session).execute(&s.db).await {
            tracing::warn!(error = %e, "failed to clear session cart after checkout");
        }
    }

    tracing::info!(
        order_id = %order.id,
        order_number = %order.order_number,
        wilaya = order.wilaya_code,
        units = cart.item_count(),
        total = %order.total,
        coupon = ?order.coupon_code,
        "order placed"
    );
    s.events
        .publish(DomainEvent::OrderPlaced {
            order_id: order.id,
            order_number: order.order_number.clone(),
            wilaya_code: order.wilaya_code,
            total: order.total,
            coupon_code: order.coupon_code.clone(),
        })
        .await;

    Ok((StatusCode::CREATED, Json(OrderWithItems { order, items })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::tests::product;
    use rust_decimal_macros::dec;

    fn item(product_id: Uuid, size: &str, quantity: u32) -> CheckoutItem {
        CheckoutItem { product_id, size: Some(size.into()), color: None, quantity }
    }

    #[test]
    fn empty_cart_is_rejected() {
        assert!(matches!(cart_from_items(&[]), Err(StoreError::Validation(_))));
    }

    #[test]
    fn merged_lines_respect_line_cap() {
        let p = Uuid::new_v4();
        assert!(cart_from_items(&[item(p, "40", 60), item(p, "40", 60)]).is_err());
        assert_eq!(cart_from_items(&[item(p, "40", 60), item(p, "41", 60)]).unwrap().lines().len(), 2);
    }

    #[test]
    fn line_count_is_bounded() {
        let items: Vec<_> = (0..=MAX_CART_LINES).map(|_| item(Uuid::new_v4(), "40", 1)).collect();
        assert!(cart_from_items(&items).is_err());
        assert!(cart_from_items(&items[..MAX_CART_LINES]).is_ok());
    }

    #[test]
    fn typed_coupon_codes_never_vanish() {
        assert!(requested_coupon(None).unwrap().is_none());
        assert!(requested_coupon(Some("   ")).unwrap().is_none());
        assert_eq!(requested_coupon(Some(" welcome ")).unwrap().unwrap().as_str(), "WELCOME");
        let long = "X".repeat(60);
        assert!(matches!(
            requested_coupon(Some(&long)),
            Err(StoreError::CouponRejected(CouponRejection::Unknown))
        ));
    }

    #[test]
    fn stock_is_checked_across_variants() {
        let p = product(dec!(1000), 3);
        let cart = cart_from_items(&[item(p.id, "40", 2), item(p.id, "41", 2)]).unwrap();
        let products = HashMap::from([(p.id, p)]);
        assert!(matches!(price_lines(&cart, &products, Locale::En), Err(StoreError::InsufficientStock { .. })));
    }

    #[test]
    fn inactive_or_unknown_products_are_not_found() {
        let mut p = product(dec!(1000), 3);
        p.is_active = false;
        let cart = cart_from_items(&[item(p.id, "40", 1)]).unwrap();
        let products = HashMap::from([(p.id, p)]);
        assert!(matches!(price_lines(&cart, &products, Locale::En), Err(StoreError::NotFound("product"))));
        assert!(matches!(price_lines(&cart, &HashMap::new(), Locale::En), Err(StoreError::NotFound("product"))));
    }

    #[test]
    fn invalid_option_is_a_validation_error() {
        let p = product(dec!(1000), 3);
        let cart = cart_from_items(&[item(p.id, "45", 1)]).unwrap();
        let products = HashMap::from([(p.id, p)]);
        assert!(matches!(price_lines(&cart, &products, Locale::En), Err(StoreError::Validation(_))));
    }

    #[test]
    fn checkout_request_validation() {
        let request = |name: &str, phone: &str| CheckoutRequest {
            customer_name: name.into(),
            customer_phone: phone.into(),
            wilaya_code: 16,
            delivery_type: DeliveryType::Home,
            commune: None,
            address: None,
            notes: None,
            coupon_code: None,
            session_id: None,
            items: vec![item(Uuid::new_v4(), "40", 1)],
        };
        assert!(request("Amine Benali", "0555 12 34 56").validate().is_ok());
        assert!(request("A", "0555123456").validate().is_err());
        assert!(request("Amine", "12345").validate().is_err());
        let mut r = request("Amine", "0555123456");
        r.items[0].quantity = 0;
        assert!(r.validate().is_err());
    }
}
