//! Souk Storefront
//!
//! Bilingual (Arabic/English) single-vendor storefront and admin API.
//!
//! ## Features
//! - Categorized product catalog with sizes, colors and quantity discounts
//! - Session carts and cash-on-delivery checkout priced per wilaya
//! - Coupon codes with usage caps, expiry and product scoping
//! - Order tracking and status-driven stock reconciliation
//! - Reviews, promo banners, social links and tracking pixels
//! - Role-gated admin area with per-section permissions

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

pub mod auth;
pub mod config;
pub mod domain;
pub mod handlers;
pub mod i18n;
pub mod routes;
pub mod state;

pub use config::Config;
pub use domain::aggregates::coupon::CouponRejection;
pub use i18n::Locale;
pub use routes::router;
pub use state::AppState;

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Insufficient stock for {product}")]
    InsufficientStock { product: String },

    #[error("Coupon rejected: {0}")]
    CouponRejected(CouponRejection),

    #[error("Authentication required")]
    Unauthorized,

    #[error("Access to {0} denied")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            _ => StoreError::Database(err),
        }
    }
}

impl From<validator::ValidationErrors> for StoreError {
    fn from(err: validator::ValidationErrors) -> Self {
        StoreError::Validation(err.to_string())
    }
}

impl From<CouponRejection> for StoreError {
    fn from(reason: CouponRejection) -> Self {
        StoreError::CouponRejected(reason)
    }
}

impl StoreError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InsufficientStock { .. } | Self::CouponRejected(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Customer-facing message. Internal failures never leak their cause.
    pub fn message(&self, locale: Locale) -> String {
        match self {
            Self::NotFound(entity) => i18n::not_found(entity, locale),
            Self::Validation(detail) => match locale {
                Locale::Ar => format!("بيانات غير صالحة: {detail}"),
                Locale::En => format!("Invalid input: {detail}"),
            },
            Self::InsufficientStock { product } => match locale {
                Locale::Ar => format!("الكمية المطلوبة غير متوفرة للمنتج {product}"),
                Locale::En => format!("Not enough stock for {product}"),
            },
            Self::CouponRejected(reason) => reason.message(locale),
            Self::Unauthorized => locale.pick("يجب تسجيل الدخول", "Authentication required").into(),
            Self::Forbidden(section) => match locale {
                Locale::Ar => format!("ليس لديك صلاحية الوصول إلى {section}"),
                Locale::En => format!("You do not have access to {section}"),
            },
            Self::Conflict(_) => locale.pick("السجل موجود مسبقا", "Record already exists").into(),
            Self::Database(_) | Self::Internal(_) => {
                locale.pick("حدث خطأ في الخادم", "Internal server error").into()
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    pub message_ar: String,
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.message(Locale::En),
            message_ar: self.message(Locale::Ar),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_hide_details() {
        let err = StoreError::Internal("pool exhausted".into());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message(Locale::En).contains("pool"));
    }

    #[test]
    fn stock_errors_are_unprocessable() {
        let err = StoreError::InsufficientStock { product: "Robe".into() };
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.message(Locale::En).contains("Robe"));
        assert!(err.message(Locale::Ar).contains("Robe"));
    }

    #[test]
    fn not_found_is_localized() {
        let err = StoreError::NotFound("order");
        assert_eq!(err.message(Locale::En), "Order not found");
        assert_eq!(err.message(Locale::Ar), "الطلب غير موجود");
    }
}
