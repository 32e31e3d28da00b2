//! Storefront content: promo banners, social links, tracking pixels

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::value_objects::UnknownVariant;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct PromoBanner {
    pub id: Uuid,
    pub title_ar: String,
    pub title_en: String,
    pub subtitle_ar: Option<String>,
    pub subtitle_en: Option<String>,
    pub image_url: String,
    pub link_url: Option<String>,
    pub position: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SocialLink {
    pub id: Uuid,
    pub platform: String,
    pub url: String,
    pub position: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrackingPixel {
    pub id: Uuid,
    #[sqlx(try_from = "String")]
    pub platform: PixelPlatform,
    pub pixel_id: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelPlatform {
    Facebook,
    Tiktok,
    Google,
    Snapchat,
}

impl PixelPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Tiktok => "tiktok",
            Self::Google => "google",
            Self::Snapchat => "snapchat",
        }
    }

    /// Pixel ids are opaque but never contain whitespace.
    pub fn accepts(&self, pixel_id: &str) -> bool {
        !pixel_id.is_empty() && !pixel_id.chars().any(char::is_whitespace)
    }
}

impl fmt::Display for PixelPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for PixelPlatform {
    type Err = UnknownVariant;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "facebook" => Ok(Self::Facebook),
            "tiktok" => Ok(Self::Tiktok),
            "google" => Ok(Self::Google),
            "snapchat" => Ok(Self::Snapchat),
            other => Err(UnknownVariant::new("pixel platform", other)),
        }
    }
}

impl TryFrom<String> for PixelPlatform {
    type Error = UnknownVariant;
    fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}
