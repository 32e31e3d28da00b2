//! HTTP handlers, grouped by storefront/admin area.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{header, request::Parts},
};
use serde::{Deserialize, Serialize};

use crate::{AppState, Locale, StoreError};

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod content;
pub mod coupons;
pub mod dashboard;
pub mod orders;
pub mod reviews;
pub mod users;
pub mod wilayas;

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl Pagination {
    pub fn page(&self) -> u32 { self.page.unwrap_or(1).max(1) }
    pub fn per_page(&self) -> u32 { self.per_page.unwrap_or(20).clamp(1, 100) }
    pub fn limit(&self) -> i64 { i64::from(self.per_page()) }
    pub fn offset(&self) -> i64 { i64::from(self.page() - 1) * self.limit() }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: i64, pagination: &Pagination) -> Self {
        Self { data, total, page: pagination.page(), per_page: pagination.per_page() }
    }
}

/// Locale for the request: `?lang=`, then `Accept-Language`, then the
/// configured default.
#[derive(Clone, Copy, Debug)]
pub struct RequestLocale(pub Locale);

#[derive(Deserialize)]
struct LangQuery {
    lang: Option<String>,
}

#[async_trait]
impl FromRequestParts<AppState> for RequestLocale {
    type Rejection = StoreError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let lang = Query::<LangQuery>::try_from_uri(&parts.uri).ok().and_then(|q| q.0.lang);
        let accept = parts.headers.get(header::ACCEPT_LANGUAGE).and_then(|v| v.to_str().ok());
        Ok(Self(Locale::from_request(lang.as_deref(), accept, state.config.default_locale)))
    }
}

/// Escapes `LIKE` wildcards in user search terms and wraps them in `%`.
pub fn like_pattern(term: &str) -> String {
    let escaped = term.trim().replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_bounds() {
        let p = Pagination { page: Some(0), per_page: Some(500) };
        assert_eq!(p.page(), 1);
        assert_eq!(p.per_page(), 100);
        assert_eq!(p.offset(), 0);
        let p = Pagination { page: Some(3), per_page: None };
        assert_eq!(p.offset(), 40);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(" 50%_off "), "%50\\%\\_off%");
    }
}
