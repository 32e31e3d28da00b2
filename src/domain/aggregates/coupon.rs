//! Coupon Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::aggregates::product::DiscountType;
use crate::domain::value_objects::round_money;
use crate::i18n::Locale;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    #[sqlx(try_from = "String")]
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub min_order_amount: Option<Decimal>,
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub applies_to_all: bool,
    pub product_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Why a coupon cannot be used for a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum CouponRejection {
    #[error("unknown coupon code")]
    Unknown,
    #[error("coupon is disabled")]
    Inactive,
    #[error("coupon has expired")]
    Expired,
    #[error("coupon usage limit reached")]
    Exhausted,
    #[error("order amount is below the coupon minimum of {min}")]
    BelowMinimum { min: Decimal },
    #[error("coupon does not apply to any product in the cart")]
    NotApplicable,
}

impl CouponRejection {
    pub fn message(&self, locale: Locale) -> String {
        let (ar, en) = match self {
            Self::Unknown => ("رمز القسيمة غير صحيح", "Invalid coupon code"),
            Self::Inactive => ("هذه القسيمة غير مفعلة", "This coupon is not active"),
            Self::Expired => ("انتهت صلاحية هذه القسيمة", "This coupon has expired"),
            Self::Exhausted => ("تم استنفاد عدد استعمالات هذه القسيمة", "This coupon has reached its usage limit"),
            Self::NotApplicable => (
                "هذه القسيمة لا تنطبق على منتجات السلة",
                "This coupon does not apply to the products in your cart",
            ),
            Self::BelowMinimum { min } => {
                return match locale {
                    Locale::Ar => format!("الحد الأدنى للطلب لاستعمال هذه القسيمة هو {min} دج"),
                    Locale::En => format!("Minimum order amount for this coupon is {min} DZD"),
                }
            }
        };
        locale.pick(ar, en).to_string()
    }
}

impl Coupon {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    pub fn is_exhausted(&self) -> bool {
        self.max_uses.is_some_and(|max| self.used_count >= max)
    }

    pub fn covers(&self, product_id: Uuid) -> bool {
        self.applies_to_all || self.product_ids.contains(&product_id)
    }

    /// Validity for a cart whose amount (after quantity discounts) is
    /// `order_amount` and which contains `cart_products`.
    pub fn check(&self, now: DateTime<Utc>, order_amount: Decimal, cart_products: &[Uuid]) -> Result<(), CouponRejection> {
        if !self.is_active {
            return Err(CouponRejection::Inactive);
        }
        if self.is_expired(now) {
            return Err(CouponRejection::Expired);
        }
        if self.is_exhausted() {
            return Err(CouponRejection::Exhausted);
        }
        if let Some(min) = self.min_order_amount {
            if order_amount < min {
                return Err(CouponRejection::BelowMinimum { min });
            }
        }
        if !cart_products.iter().any(|id| self.covers(*id)) {
            return Err(CouponRejection::NotApplicable);
        }
        Ok(())
    }

    /// Discount on the amount the coupon covers, never more than that amount.
    pub fn discount_on(&self, eligible_amount: Decimal) -> Decimal {
        if eligible_amount <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let discount = match self.discount_type {
            DiscountType::Percentage => eligible_amount * self.discount_value.min(Decimal::ONE_HUNDRED) / Decimal::ONE_HUNDRED,
            DiscountType::Fixed => self.discount_value,
        };
        round_money(discount.min(eligible_amount).max(Decimal::ZERO))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    pub(crate) fn coupon(kind: DiscountType, value: Decimal) -> Coupon {
        Coupon {
            id: Uuid::new_v4(),
            code: "WELCOME".into(),
            discount_type: kind,
            discount_value: value,
            min_order_amount: None,
            max_uses: None,
            used_count: 0,
            expires_at: None,
            is_active: true,
            applies_to_all: true,
            product_ids: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn valid_coupon_passes() {
        let c = coupon(DiscountType::Percentage, dec!(10));
        assert!(c.check(Utc::now(), dec!(5000), &[Uuid::new_v4()]).is_ok());
    }

    #[test]
    fn inactive_expired_exhausted() {
        let now = Utc::now();
        let cart = [Uuid::new_v4()];
        let mut c = coupon(DiscountType::Fixed, dec!(500));
        c.is_active = false;
        assert_eq!(c.check(now, dec!(5000), &cart), Err(CouponRejection::Inactive));

        let mut c = coupon(DiscountType::Fixed, dec!(500));
        c.expires_at = Some(now - Duration::hours(1));
        assert_eq!(c.check(now, dec!(5000), &cart), Err(CouponRejection::Expired));

        let mut c = coupon(DiscountType::Fixed, dec!(500));
        c.max_uses = Some(3);
        c.used_count = 3;
        assert_eq!(c.check(now, dec!(5000), &cart), Err(CouponRejection::Exhausted));
        c.used_count = 2;
        assert!(c.check(now, dec!(5000), &cart).is_ok());
    }

    #[test]
    fn minimum_amount_is_inclusive() {
        let mut c = coupon(DiscountType::Fixed, dec!(500));
        c.min_order_amount = Some(dec!(3000));
        let cart = [Uuid::new_v4()];
        assert_eq!(c.check(Utc::now(), dec!(2999.99), &cart), Err(CouponRejection::BelowMinimum { min: dec!(3000) }));
        assert!(c.check(Utc::now(), dec!(3000), &cart).is_ok());
    }

    #[test]
    fn scoped_coupon_needs_matching_product() {
        let target = Uuid::new_v4();
        let mut c = coupon(DiscountType::Percentage, dec!(20));
        c.applies_to_all = false;
        c.product_ids = vec![target];
        assert_eq!(c.check(Utc::now(), dec!(100), &[Uuid::new_v4()]), Err(CouponRejection::NotApplicable));
        assert!(c.check(Utc::now(), dec!(100), &[Uuid::new_v4(), target]).is_ok());
    }

    #[test]
    fn fixed_discount_capped_at_eligible_amount() {
        let c = coupon(DiscountType::Fixed, dec!(800));
        assert_eq!(c.discount_on(dec!(600)), dec!(600));
        let c = coupon(DiscountType::Percentage, dec!(15));
        assert_eq!(c.discount_on(dec!(2000)), dec!(300));
    }

    #[test]
    fn rejection_messages_are_bilingual() {
        let r = CouponRejection::BelowMinimum { min: dec!(3000) };
        assert!(r.message(Locale::En).contains("3000"));
        assert!(r.message(Locale::Ar).contains("3000"));
        assert_eq!(CouponRejection::Expired.message(Locale::En), "This coupon has expired");
    }
}
