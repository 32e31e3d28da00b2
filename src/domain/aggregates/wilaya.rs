//! Wilaya delivery pricing

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::value_objects::UnknownVariant;
use crate::i18n::Locale;

pub const WILAYA_CODES: std::ops::RangeInclusive<i32> = 1..=58;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Wilaya {
    pub id: Uuid,
    pub code: i32,
    pub name_ar: String,
    pub name_en: String,
    pub home_delivery_price: Decimal,
    pub office_delivery_price: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Delivery to the customer's door, or pickup at the carrier's office.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryType {
    #[default]
    Home,
    Office,
}

impl DeliveryType {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Home => "home", Self::Office => "office" }
    }
}

impl fmt::Display for DeliveryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for DeliveryType {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(Self::Home),
            "office" => Ok(Self::Office),
            other => Err(UnknownVariant::new("delivery type", other)),
        }
    }
}

impl TryFrom<String> for DeliveryType {
    type Error = UnknownVariant;
    fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

impl Wilaya {
    pub fn delivery_price(&self, delivery: DeliveryType) -> Decimal {
        match delivery {
            DeliveryType::Home => self.home_delivery_price,
            DeliveryType::Office => self.office_delivery_price,
        }
    }

    pub fn display_name(&self, locale: Locale) -> &str { locale.pick(&self.name_ar, &self.name_en) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn price_by_delivery_type() {
        let w = Wilaya {
            id: Uuid::new_v4(), code: 16, name_ar: "الجزائر".into(), name_en: "Algiers".into(),
            home_delivery_price: dec!(400), office_delivery_price: dec!(250), is_active: true, created_at: Utc::now(),
        };
        assert_eq!(w.delivery_price(DeliveryType::Home), dec!(400));
        assert_eq!(w.delivery_price(DeliveryType::Office), dec!(250));
        assert_eq!(w.display_name(Locale::En), "Algiers");
    }

    #[test]
    fn delivery_type_parses() {
        assert_eq!("office".parse::<DeliveryType>().unwrap(), DeliveryType::Office);
        assert!("drone".parse::<DeliveryType>().is_err());
        assert!(WILAYA_CODES.contains(&58) && !WILAYA_CODES.contains(&59));
    }
}
