//! Order Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::aggregates::wilaya::DeliveryType;
use crate::domain::value_objects::UnknownVariant;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub order_number: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub wilaya_code: i32,
    pub commune: Option<String>,
    pub address: Option<String>,
    #[sqlx(try_from = "String")]
    pub delivery_type: DeliveryType,
    pub subtotal: Decimal,
    pub quantity_discount: Decimal,
    pub coupon_id: Option<Uuid>,
    pub coupon_code: Option<String>,
    pub coupon_discount: Decimal,
    pub delivery_price: Decimal,
    pub total: Decimal,
    #[sqlx(try_from = "String")]
    pub status: OrderStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Whether the order's items are currently withheld from stock.
    pub fn holds_stock(&self) -> bool { *self != Self::Cancelled }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for OrderStatus {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("order status", s))
    }
}

impl TryFrom<String> for OrderStatus {
    type Error = UnknownVariant;
    fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

/// Stock movement implied by an order status change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StockAdjustment {
    None,
    /// Put the items back on the shelf.
    Restore,
    /// Take the items off the shelf again.
    Deduct,
}

impl StockAdjustment {
    /// Entering `cancelled` restores stock, leaving it deducts again; every
    /// other transition leaves stock alone.
    pub fn for_transition(from: OrderStatus, to: OrderStatus) -> Self {
        match (from.holds_stock(), to.holds_stock()) {
            (true, false) => Self::Restore,
            (false, true) => Self::Deduct,
            _ => Self::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    #[test]
    fn cancelling_restores_stock() {
        for from in [Pending, Confirmed, Processing, Shipped, Delivered] {
            assert_eq!(StockAdjustment::for_transition(from, Cancelled), StockAdjustment::Restore);
        }
    }

    #[test]
    fn reopening_deducts_stock() {
        for to in [Pending, Confirmed, Processing, Shipped, Delivered] {
            assert_eq!(StockAdjustment::for_transition(Cancelled, to), StockAdjustment::Deduct);
        }
    }

    #[test]
    fn other_transitions_leave_stock() {
        assert_eq!(StockAdjustment::for_transition(Pending, Shipped), StockAdjustment::None);
        assert_eq!(StockAdjustment::for_transition(Cancelled, Cancelled), StockAdjustment::None);
        assert_eq!(StockAdjustment::for_transition(Delivered, Delivered), StockAdjustment::None);
    }

    #[test]
    fn status_round_trips_through_text() {
        for status in OrderStatus::ALL {
            assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("refunded".parse::<OrderStatus>().is_err());
    }
}
