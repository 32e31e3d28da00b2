//! Arabic/English localization helpers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ar,
    En,
}

impl Locale {
    pub fn as_str(self) -> &'static str {
        match self {
            Locale::Ar => "ar",
            Locale::En => "en",
        }
    }

    pub fn dir(self) -> &'static str {
        match self {
            Locale::Ar => "rtl",
            Locale::En => "ltr",
        }
    }

    pub fn pick<'a>(self, ar: &'a str, en: &'a str) -> &'a str {
        match self {
            Locale::Ar => ar,
            Locale::En => en,
        }
    }

    /// Like [`Locale::pick`] but falls back to the other language when the
    /// preferred text is missing or blank.
    pub fn pick_opt<'a>(self, ar: Option<&'a str>, en: Option<&'a str>) -> Option<&'a str> {
        let ar = ar.filter(|s| !s.trim().is_empty());
        let en = en.filter(|s| !s.trim().is_empty());
        match self {
            Locale::Ar => ar.or(en),
            Locale::En => en.or(ar),
        }
    }

    /// Resolves the locale of a request: explicit `lang` parameter first, then
    /// the highest-weighted supported `Accept-Language` entry, then `fallback`.
    pub fn from_request(lang: Option<&str>, accept_language: Option<&str>, fallback: Locale) -> Locale {
        if let Some(locale) = lang.and_then(|l| l.parse().ok()) {
            return locale;
        }
        accept_language
            .and_then(Self::from_accept_language)
            .unwrap_or(fallback)
    }

    fn from_accept_language(header: &str) -> Option<Locale> {
        let mut best: Option<(f32, Locale)> = None;
        for entry in header.split(',') {
            let mut parts = entry.trim().split(';');
            let tag = parts.next().unwrap_or_default();
            let Ok(locale) = tag.parse::<Locale>() else { continue };
            let weight = parts
                .find_map(|p| p.trim().strip_prefix("q="))
                .and_then(|q| q.parse::<f32>().ok())
                .unwrap_or(1.0);
            if best.map_or(true, |(w, _)| weight > w) {
                best = Some((weight, locale));
            }
        }
        best.map(|(_, locale)| locale)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;

    /// Accepts bare and regional tags (`ar`, `ar-DZ`, `en_US`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let primary = s.trim().split(['-', '_']).next().unwrap_or_default();
        match primary.to_ascii_lowercase().as_str() {
            "ar" => Ok(Locale::Ar),
            "en" => Ok(Locale::En),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

fn entity_label(entity: &str) -> (&'static str, &'static str) {
    match entity {
        "product" => ("المنتج", "Product"),
        "category" => ("الصنف", "Category"),
        "order" => ("الطلب", "Order"),
        "wilaya" => ("الولاية", "Wilaya"),
        "coupon" => ("القسيمة", "Coupon"),
        "review" => ("التقييم", "Review"),
        "reply" => ("الرد", "Reply"),
        "banner" => ("اللافتة", "Banner"),
        "social link" => ("الرابط", "Social link"),
        "pixel" => ("البكسل", "Pixel"),
        "user" => ("المستخدم", "User"),
        "cart item" => ("عنصر السلة", "Cart item"),
        _ => ("العنصر", "Item"),
    }
}

pub fn not_found(entity: &str, locale: Locale) -> String {
    let (ar, en) = entity_label(entity);
    match locale {
        Locale::Ar => format!("{ar} غير موجود"),
        Locale::En => format!("{en} not found"),
    }
}
