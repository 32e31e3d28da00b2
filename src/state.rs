use sqlx::postgres::{PgPool, PgPoolOptions};
use std::sync::Arc;

use crate::config::Config;
use crate::domain::events::EventPublisher;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub events: EventPublisher,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, events: EventPublisher) -> Self {
        Self { db, config: Arc::new(config), events }
    }

    /// Connects the pool, runs migrations and, when configured, NATS.
    pub async fn connect(config: Config) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .connect(&config.database_url)
            .await?;
        sqlx::migrate!("./migrations").run(&db).await?;

        let nats = match &config.nats_url {
            Some(url) => match async_nats::connect(url.as_str()).await {
                Ok(client) => {
                    tracing::info!(%url, "connected to NATS");
                    Some(client)
                }
                Err(e) => {
                    tracing::warn!(%url, error = %e, "NATS unavailable, events disabled");
                    None
                }
            },
            None => None,
        };

        Ok(Self::new(db, config, EventPublisher::new(nats)))
    }
}
