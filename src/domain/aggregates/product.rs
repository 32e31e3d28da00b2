//! Product and Category Aggregates

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::value_objects::{round_money, UnknownVariant};
use crate::i18n::Locale;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name_ar: String,
    pub name_en: String,
    pub slug: String,
    pub image_url: Option<String>,
    pub position: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn display_name(&self, locale: Locale) -> &str { locale.pick(&self.name_ar, &self.name_en) }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub name_ar: String,
    pub name_en: String,
    pub description_ar: Option<String>,
    pub description_en: Option<String>,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub stock: i32,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
    pub images: Vec<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub discount_min_quantity: Option<i32>,
    pub discount_type: Option<String>,
    pub discount_value: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Percentage of the amount, or a fixed amount in DZD.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Percentage => "percentage", Self::Fixed => "fixed" }
    }
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for DiscountType {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "percentage" => Ok(Self::Percentage),
            "fixed" => Ok(Self::Fixed),
            other => Err(UnknownVariant::new("discount type", other)),
        }
    }
}

impl TryFrom<String> for DiscountType {
    type Error = UnknownVariant;
    fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

/// Discount that kicks in once a single cart line reaches `min_quantity`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityDiscount {
    pub min_quantity: u32,
    pub kind: DiscountType,
    pub value: Decimal,
}

impl QuantityDiscount {
    /// Discount for a line. Fixed discounts are taken off each unit; the
    /// result never exceeds the line's gross amount.
    pub fn apply(&self, unit_price: Decimal, quantity: u32) -> Decimal {
        if quantity < self.min_quantity || quantity == 0 {
            return Decimal::ZERO;
        }
        let gross = unit_price * Decimal::from(quantity);
        let discount = match self.kind {
            DiscountType::Percentage => gross * self.value / Decimal::ONE_HUNDRED,
            DiscountType::Fixed => self.value * Decimal::from(quantity),
        };
        round_money(discount.min(gross).max(Decimal::ZERO))
    }

    /// Checks the three optional product columns: all set or none.
    pub fn from_parts(
        min_quantity: Option<i32>,
        kind: Option<&str>,
        value: Option<Decimal>,
    ) -> Result<Option<Self>, ProductError> {
        match (min_quantity, kind, value) {
            (None, None, None) => Ok(None),
            (Some(min), Some(kind), Some(value)) => {
                let kind: DiscountType = kind.parse().map_err(|_| ProductError::InvalidDiscount)?;
                if min < 1 || value < Decimal::ZERO {
                    return Err(ProductError::InvalidDiscount);
                }
                if kind == DiscountType::Percentage && value > Decimal::ONE_HUNDRED {
                    return Err(ProductError::InvalidDiscount);
                }
                Ok(Some(Self { min_quantity: min as u32, kind, value }))
            }
            _ => Err(ProductError::IncompleteDiscount),
        }
    }
}

impl Product {
    pub fn display_name(&self, locale: Locale) -> &str { locale.pick(&self.name_ar, &self.name_en) }

    /// Stored discount columns that fail validation are treated as no discount.
    pub fn quantity_discount(&self) -> Option<QuantityDiscount> {
        QuantityDiscount::from_parts(self.discount_min_quantity, self.discount_type.as_deref(), self.discount_value)
            .ok()
            .flatten()
    }

    /// Checks a chosen size/color against the product's declared options.
    /// Options are required when declared and rejected when not.
    pub fn check_options(&self, size: Option<&str>, color: Option<&str>) -> Result<(), ProductError> {
        check_option(&self.sizes, size, "size")?;
        check_option(&self.colors, color, "color")
    }
}

fn check_option(declared: &[String], chosen: Option<&str>, kind: &'static str) -> Result<(), ProductError> {
    match chosen.map(str::trim).filter(|s| !s.is_empty()) {
        None if declared.is_empty() => Ok(()),
        None => Err(ProductError::OptionRequired(kind)),
        Some(value) if declared.iter().any(|d| d == value) => Ok(()),
        Some(value) => Err(ProductError::UnknownOption { kind, value: value.to_string() }),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProductError {
    #[error("quantity discount needs min quantity, type and value together")]
    IncompleteDiscount,
    #[error("quantity discount is out of range")]
    InvalidDiscount,
    #[error("a {0} must be chosen")]
    OptionRequired(&'static str),
    #[error("{kind} {value:?} is not available")]
    UnknownOption { kind: &'static str, value: String },
}
