use anyhow::{Context, Result};
use std::{env, fmt::Display, str::FromStr};
use tracing::{info, warn};

use crate::i18n::Locale;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub nats_url: Option<String>,
    pub db_max_connections: u32,
    pub default_locale: Locale,
    pub low_stock_threshold: i32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup so tests can
    /// avoid touching the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} must be set"));
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            port: try_load(&lookup, "PORT", "8083")?,
            nats_url: lookup("NATS_URL").filter(|url| !url.is_empty()),
            db_max_connections: try_load(&lookup, "DB_MAX_CONNECTIONS", "10")?,
            default_locale: try_load(&lookup, "DEFAULT_LOCALE", "ar")?,
            low_stock_threshold: try_load(&lookup, "LOW_STOCK_THRESHOLD", "5")?,
        })
    }
}

fn try_load<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        anyhow::anyhow!("invalid {key} value {raw:?}: {e}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let cfg = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://x"), ("JWT_SECRET", "s")])).unwrap();
        assert_eq!(cfg.port, 8083);
        assert_eq!(cfg.db_max_connections, 10);
        assert_eq!(cfg.default_locale, Locale::Ar);
        assert_eq!(cfg.low_stock_threshold, 5);
        assert!(cfg.nats_url.is_none());
    }

    #[test]
    fn missing_secret_fails() {
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn invalid_port_fails() {
        let result = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("PORT", "eighty"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn overrides_apply() {
        let cfg = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("DEFAULT_LOCALE", "en"),
            ("NATS_URL", "nats://localhost:4222"),
        ]))
        .unwrap();
        assert_eq!(cfg.default_locale, Locale::En);
        assert_eq!(cfg.nats_url.as_deref(), Some("nats://localhost:4222"));
    }
}
