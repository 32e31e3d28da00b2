//! Cart pricing: quantity discounts, coupon discount and delivery.
//!
//! `total = subtotal - quantity_discount - coupon_discount + delivery_price`,
//! where the coupon only ever reduces the cost of goods, never delivery.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{CartLine, Coupon, CouponRejection, Product};
use crate::domain::value_objects::round_money;
use crate::i18n::Locale;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LineQuote {
    pub product_id: Uuid,
    pub product_name: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub gross: Decimal,
    pub discount: Decimal,
    pub net: Decimal,
}

impl LineQuote {
    pub fn new(product: &Product, line: &CartLine, locale: Locale) -> Self {
        let gross = round_money(product.price * Decimal::from(line.quantity));
        let discount = product
            .quantity_discount()
            .map(|d| d.apply(product.price, line.quantity))
            .unwrap_or(Decimal::ZERO);
        Self {
            product_id: product.id,
            product_name: product.display_name(locale).to_string(),
            size: line.size.clone(),
            color: line.color.clone(),
            quantity: line.quantity,
            unit_price: product.price,
            gross,
            discount,
            net: gross - discount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Quote {
    pub lines: Vec<LineQuote>,
    pub subtotal: Decimal,
    pub quantity_discount: Decimal,
    pub coupon_code: Option<String>,
    pub coupon_discount: Decimal,
    pub delivery_price: Decimal,
    pub total: Decimal,
}

impl Quote {
    pub fn new(lines: Vec<LineQuote>, delivery_price: Decimal) -> Self {
        let subtotal = lines.iter().map(|l| l.gross).sum();
        let quantity_discount = lines.iter().map(|l| l.discount).sum();
        let mut quote = Self {
            lines,
            subtotal,
            quantity_discount,
            coupon_code: None,
            coupon_discount: Decimal::ZERO,
            delivery_price: round_money(delivery_price.max(Decimal::ZERO)),
            total: Decimal::ZERO,
        };
        quote.recalculate();
        quote
    }

    /// Goods amount after quantity discounts; coupon minimums compare against this.
    pub fn goods_amount(&self) -> Decimal {
        self.subtotal - self.quantity_discount
    }

    pub fn product_ids(&self) -> Vec<Uuid> {
        self.lines.iter().map(|l| l.product_id).collect()
    }

    /// Validates `coupon` against this cart and applies its discount to the
    /// lines it covers.
    pub fn apply_coupon(&mut self, coupon: &Coupon, now: DateTime<Utc>) -> Result<(), CouponRejection> {
        coupon.check(now, self.goods_amount(), &self.product_ids())?;
        let eligible: Decimal = self.lines.iter().filter(|l| coupon.covers(l.product_id)).map(|l| l.net).sum();
        self.coupon_code = Some(coupon.code.clone());
        self.coupon_discount = coupon.discount_on(eligible);
        self.recalculate();
        Ok(())
    }

    fn recalculate(&mut self) {
        let goods = (self.goods_amount() - self.coupon_discount).max(Decimal::ZERO);
        self.total = round_money(goods + self.delivery_price);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::coupon::tests::coupon;
    use crate::domain::aggregates::product::tests::product;
    use crate::domain::aggregates::DiscountType;
    use rust_decimal_macros::dec;

    fn line(p: &Product, quantity: u32) -> CartLine {
        CartLine { product_id: p.id, size: Some("40".into()), color: None, quantity }
    }

    fn discounted(price: Decimal, min: i32, kind: &str, value: Decimal) -> Product {
        let mut p = product(price, 100);
        p.discount_min_quantity = Some(min);
        p.discount_type = Some(kind.into());
        p.discount_value = Some(value);
        p
    }

    #[test]
    fn plain_cart_total() {
        let p = product(dec!(2500), 10);
        let quote = Quote::new(vec![LineQuote::new(&p, &line(&p, 2), Locale::En)], dec!(400));
        assert_eq!(quote.subtotal, dec!(5000));
        assert_eq!(quote.quantity_discount, Decimal::ZERO);
        assert_eq!(quote.total, dec!(5400));
        assert_eq!(quote.lines[0].product_name, "Shoe");
    }

    #[test]
    fn quantity_discount_reduces_total() {
        let p = discounted(dec!(1000), 3, "percentage", dec!(10));
        let quote = Quote::new(vec![LineQuote::new(&p, &line(&p, 3), Locale::Ar)], dec!(300));
        assert_eq!(quote.subtotal, dec!(3000));
        assert_eq!(quote.quantity_discount, dec!(300));
        assert_eq!(quote.total, dec!(3000));
    }

    #[test]
    fn coupon_applies_after_quantity_discount() {
        let p = discounted(dec!(1000), 2, "fixed", dec!(100));
        let mut quote = Quote::new(vec![LineQuote::new(&p, &line(&p, 2), Locale::En)], dec!(500));
        quote.apply_coupon(&coupon(DiscountType::Percentage, dec!(10)), Utc::now()).unwrap();
        assert_eq!(quote.goods_amount(), dec!(1800));
        assert_eq!(quote.coupon_discount, dec!(180));
        assert_eq!(quote.total, dec!(2120));
        assert_eq!(quote.coupon_code.as_deref(), Some("WELCOME"));
    }

    #[test]
    fn scoped_coupon_only_discounts_covered_lines() {
        let a = product(dec!(1000), 10);
        let b = product(dec!(3000), 10);
        let mut c = coupon(DiscountType::Percentage, dec!(50));
        c.applies_to_all = false;
        c.product_ids = vec![a.id];
        let lines = vec![LineQuote::new(&a, &line(&a, 1), Locale::En), LineQuote::new(&b, &line(&b, 1), Locale::En)];
        let mut quote = Quote::new(lines, Decimal::ZERO);
        quote.apply_coupon(&c, Utc::now()).unwrap();
        assert_eq!(quote.coupon_discount, dec!(500));
        assert_eq!(quote.total, dec!(3500));
    }

    #[test]
    fn total_never_below_delivery() {
        let p = product(dec!(300), 10);
        let mut quote = Quote::new(vec![LineQuote::new(&p, &line(&p, 1), Locale::En)], dec!(400));
        quote.apply_coupon(&coupon(DiscountType::Fixed, dec!(1000)), Utc::now()).unwrap();
        assert_eq!(quote.coupon_discount, dec!(300));
        assert_eq!(quote.total, dec!(400));
    }

    #[test]
    fn rejected_coupon_leaves_quote_unchanged() {
        let p = product(dec!(1000), 10);
        let mut quote = Quote::new(vec![LineQuote::new(&p, &line(&p, 1), Locale::En)], dec!(400));
        let mut c = coupon(DiscountType::Fixed, dec!(200));
        c.min_order_amount = Some(dec!(5000));
        let before = quote.clone();
        assert!(quote.apply_coupon(&c, Utc::now()).is_err());
        assert_eq!(quote, before);
    }
}
