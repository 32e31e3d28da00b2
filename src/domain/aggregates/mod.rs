//! Aggregates module
pub mod cart;
pub mod content;
pub mod coupon;
pub mod order;
pub mod product;
pub mod review;
pub mod wilaya;

pub use cart::{Cart, CartItem, CartItemView, CartLine};
pub use coupon::{Coupon, CouponRejection};
pub use order::{Order, OrderItem, OrderStatus, OrderWithItems, StockAdjustment};
pub use product::{Category, DiscountType, Product, ProductError, QuantityDiscount};
pub use review::{Review, ReviewReply, ReviewSummary};
pub use wilaya::{DeliveryType, Wilaya};
