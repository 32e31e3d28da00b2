//! Cart Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Row of a server-side session cart. Empty size/color mean "no option".
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CartItem {
    pub id: Uuid,
    pub session_id: String,
    pub product_id: Uuid,
    pub size: String,
    pub color: String,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// Cart row joined with the product's current name, price and stock.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartItemView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub size: String,
    pub color: String,
    pub quantity: i32,
    pub name_ar: String,
    pub name_en: String,
    pub price: Decimal,
    pub stock: i32,
    pub image: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    pub size: Option<String>,
    pub color: Option<String>,
    pub quantity: u32,
}

impl CartLine {
    pub fn same_variant(&self, other: &CartLine) -> bool {
        self.product_id == other.product_id && self.size == other.size && self.color == other.color
    }
}

#[derive(Clone, Debug, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self { Self::default() }

    /// Builds a cart, merging lines for the same product, size and color and
    /// dropping zero-quantity lines.
    pub fn from_lines(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            cart.add_line(line);
        }
        cart
    }

    pub fn lines(&self) -> &[CartLine] { &self.lines }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }
    pub fn item_count(&self) -> u32 { self.lines.iter().map(|l| l.quantity).sum() }

    pub fn add_line(&mut self, mut line: CartLine) {
        line.size = normalize_option(line.size);
        line.color = normalize_option(line.color);
        if line.quantity == 0 {
            return;
        }
        if let Some(existing) = self.lines.iter_mut().find(|l| l.same_variant(&line)) {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            self.lines.push(line);
        }
    }

    /// Total requested quantity per product across all its variants.
    pub fn quantity_by_product(&self) -> Vec<(Uuid, u32)> {
        let mut totals: Vec<(Uuid, u32)> = Vec::new();
        for line in &self.lines {
            match totals.iter_mut().find(|(id, _)| *id == line.product_id) {
                Some((_, qty)) => *qty += line.quantity,
                None => totals.push((line.product_id, line.quantity)),
            }
        }
        totals
    }

    pub fn product_ids(&self) -> Vec<Uuid> {
        self.quantity_by_product().into_iter().map(|(id, _)| id).collect()
    }
}

pub fn normalize_option(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
