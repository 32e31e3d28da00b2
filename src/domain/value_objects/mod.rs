//! Value Objects for the storefront

use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use validator::ValidationError;

/// Highest unit or delivery price the catalog accepts, in DZD.
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Highest stock level a product may hold.
pub const MAX_STOCK: i32 = 1_000_000;

/// Rounds a money amount to 2 decimal places, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Raised when a text column holds a value outside a closed set.
#[derive(Debug, Clone, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self { kind, value: value.into() }
    }
}

/// Algerian phone number, stored in national format (`0XXXXXXXXX`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhoneNumber(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhoneError {
    #[error("phone number must contain only digits")]
    NotNumeric,
    #[error("phone number must start with 05, 06, 07 (mobile) or 02-04 (landline)")]
    BadPrefix,
    #[error("phone number has the wrong length")]
    BadLength,
}

impl PhoneNumber {
    pub fn parse(raw: &str) -> Result<Self, PhoneError> {
        let compact: String = raw.chars().filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')')).collect();
        let national = if let Some(rest) = compact.strip_prefix("+213") {
            format!("0{rest}")
        } else if let Some(rest) = compact.strip_prefix("00213") {
            format!("0{rest}")
        } else {
            compact
        };
        if national.is_empty() || !national.chars().all(|c| c.is_ascii_digit()) {
            return Err(PhoneError::NotNumeric);
        }
        let bytes = national.as_bytes();
        if bytes[0] != b'0' || bytes.len() < 2 {
            return Err(PhoneError::BadPrefix);
        }
        let valid_len = match bytes[1] {
            b'5'..=b'7' => national.len() == 10,
            b'2'..=b'4' => national.len() == 9 || national.len() == 10,
            _ => return Err(PhoneError::BadPrefix),
        };
        if !valid_len {
            return Err(PhoneError::BadLength);
        }
        Ok(Self(national))
    }

    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// `validator` hook for phone fields.
pub fn validate_phone(value: &str) -> Result<(), ValidationError> {
    PhoneNumber::parse(value).map(|_| ()).map_err(|e| {
        let mut err = ValidationError::new("phone");
        err.message = Some(e.to_string().into());
        err
    })
}

/// `validator` hook for customer names: 2..=100 characters once trimmed.
pub fn validate_customer_name(value: &str) -> Result<(), ValidationError> {
    let len = value.trim().chars().count();
    if (2..=100).contains(&len) {
        Ok(())
    } else {
        let mut err = ValidationError::new("name_length");
        err.message = Some("name must be between 2 and 100 characters".into());
        Err(err)
    }
}

/// Coupon code, trimmed and upper-cased.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CouponCode(String);

impl CouponCode {
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() || value.len() > 50 { return None; }
        Some(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for CouponCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Public order reference: `ORD-` followed by 8 digits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderNumber(String);

impl OrderNumber {
    pub fn generate() -> Self {
        let n: u32 = rand::thread_rng().gen_range(0..100_000_000);
        Self(format!("ORD-{n:08}"))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

/// URL slug derived from an English name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    while slug.ends_with('-') { slug.pop(); }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn phone_normalizes_international_prefix() {
        assert_eq!(PhoneNumber::parse("+213 555 12 34 56").unwrap().as_str(), "0555123456");
        assert_eq!(PhoneNumber::parse("00213661234567").unwrap().as_str(), "0661234567");
        assert_eq!(PhoneNumber::parse("021 23 45 67").unwrap().as_str(), "021234567");
    }

    #[test]
    fn phone_rejects_bad_numbers() {
        assert_eq!(PhoneNumber::parse("0812345678"), Err(PhoneError::BadPrefix));
        assert_eq!(PhoneNumber::parse("055512345"), Err(PhoneError::BadLength));
        assert_eq!(PhoneNumber::parse("05551234ab"), Err(PhoneError::NotNumeric));
        assert!(validate_phone("").is_err());
    }

    #[test]
    fn customer_name_bounds() {
        assert!(validate_customer_name("  A ").is_err());
        assert!(validate_customer_name("أحمد").is_ok());
    }

    #[test]
    fn coupon_code_is_uppercased() {
        assert_eq!(CouponCode::new("  summer10 ").unwrap().as_str(), "SUMMER10");
        assert!(CouponCode::new("   ").is_none());
    }

    #[test]
    fn order_number_format() {
        let n = OrderNumber::generate();
        assert_eq!(n.as_str().len(), 12);
        assert!(n.as_str().starts_with("ORD-"));
    }

    #[test]
    fn slug_and_rounding() {
        assert_eq!(slugify("  Men's Shoes & Bags "), "men-s-shoes-bags");
        assert_eq!(round_money(dec!(10.005)), dec!(10.01));
    }
}
