//! Admin-area authentication and section permissions.
//!
//! Callers present a bearer JWT issued by the identity provider. The token
//! only proves who the caller is; what they may do comes from the
//! `user_roles` and `user_permissions` tables. Admins may open every
//! section, plain users only the sections they were granted.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::value_objects::UnknownVariant;
use crate::{AppState, Result, StoreError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self { Self::Admin => "admin", Self::User => "user" }
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            other => Err(UnknownVariant::new("role", other)),
        }
    }
}

/// Screens of the admin area, each gated separately.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminSection {
    Dashboard,
    Products,
    Categories,
    Orders,
    Wilayas,
    Coupons,
    Reviews,
    Banners,
    SocialLinks,
    Pixels,
    Users,
}

impl AdminSection {
    pub const ALL: [AdminSection; 11] = [
        Self::Dashboard,
        Self::Products,
        Self::Categories,
        Self::Orders,
        Self::Wilayas,
        Self::Coupons,
        Self::Reviews,
        Self::Banners,
        Self::SocialLinks,
        Self::Pixels,
        Self::Users,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Products => "products",
            Self::Categories => "categories",
            Self::Orders => "orders",
            Self::Wilayas => "wilayas",
            Self::Coupons => "coupons",
            Self::Reviews => "reviews",
            Self::Banners => "banners",
            Self::SocialLinks => "social_links",
            Self::Pixels => "pixels",
            Self::Users => "users",
        }
    }
}

impl fmt::Display for AdminSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for AdminSection {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|section| section.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("admin section", s))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: usize,
    #[serde(default)]
    pub email: Option<String>,
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            StoreError::Unauthorized
        })
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// What a signed-in user may do in the admin area.
#[derive(Clone, Debug, Serialize)]
pub struct Access {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Role,
    granted: BTreeSet<AdminSection>,
}

impl Access {
    pub fn new(user_id: Uuid, email: Option<String>, role: Role, granted: impl IntoIterator<Item = AdminSection>) -> Self {
        Self { user_id, email, role, granted: granted.into_iter().collect() }
    }

    pub fn is_admin(&self) -> bool { self.role == Role::Admin }

    pub fn can_access(&self, section: AdminSection) -> bool {
        self.is_admin() || self.granted.contains(&section)
    }

    pub fn sections(&self) -> Vec<AdminSection> {
        AdminSection::ALL.into_iter().filter(|s| self.can_access(*s)).collect()
    }

    pub fn require(&self, section: AdminSection) -> Result<()> {
        if self.can_access(section) {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.user_id, section = %section, "admin section denied");
            Err(StoreError::Forbidden(section.to_string()))
        }
    }
}

/// Extractor for admin routes: a verified token plus a role row.
pub struct AdminUser(pub Access);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = StoreError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = bearer_token(parts).ok_or(StoreError::Unauthorized)?;
        let claims = decode_token(token, &state.config.jwt_secret)?;

        let role: Option<(String,)> = sqlx::query_as("SELECT role FROM user_roles WHERE user_id = $1")
            .bind(claims.sub)
            .fetch_optional(&state.db)
            .await?;
        let Some((role,)) = role else {
            tracing::warn!(user_id = %claims.sub, "caller has no admin-area role");
            return Err(StoreError::Forbidden("admin".into()));
        };
        let role: Role = role.parse().map_err(|e: UnknownVariant| StoreError::Internal(e.to_string()))?;

        let rows: Vec<(String,)> = sqlx::query_as("SELECT section FROM user_permissions WHERE user_id = $1 AND allowed")
            .bind(claims.sub)
            .fetch_all(&state.db)
            .await?;
        let granted = rows.into_iter().filter_map(|(s,)| s.parse().ok());

        Ok(AdminUser(Access::new(claims.sub, claims.email, role, granted)))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    pub(crate) fn token(sub: Uuid, secret: &str, ttl_secs: i64) -> String {
        let exp = (chrono::Utc::now().timestamp() + ttl_secs) as usize;
        let claims = Claims { sub, exp, email: None };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn admin_bypasses_sections() {
        let access = Access::new(Uuid::new_v4(), None, Role::Admin, []);
        assert!(AdminSection::ALL.iter().all(|s| access.can_access(*s)));
        assert_eq!(access.sections().len(), AdminSection::ALL.len());
    }

    #[test]
    fn user_needs_grant() {
        let access = Access::new(Uuid::new_v4(), None, Role::User, [AdminSection::Orders]);
        assert!(access.require(AdminSection::Orders).is_ok());
        assert!(matches!(access.require(AdminSection::Coupons), Err(StoreError::Forbidden(s)) if s == "coupons"));
        assert_eq!(access.sections(), vec![AdminSection::Orders]);
    }

    #[test]
    fn token_round_trip_and_rejections() {
        let sub = Uuid::new_v4();
        let claims = decode_token(&token(sub, "secret", 600), "secret").unwrap();
        assert_eq!(claims.sub, sub);
        assert!(matches!(decode_token(&token(sub, "other", 600), "secret"), Err(StoreError::Unauthorized)));
        assert!(matches!(decode_token(&token(sub, "secret", -600), "secret"), Err(StoreError::Unauthorized)));
        assert!(matches!(decode_token("garbage", "secret"), Err(StoreError::Unauthorized)));
    }

    #[test]
    fn sections_parse() {
        assert_eq!("social_links".parse::<AdminSection>().unwrap(), AdminSection::SocialLinks);
        assert!("billing".parse::<AdminSection>().is_err());
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
    }
}
