//! Domain events
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::{OrderStatus, StockAdjustment};

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    OrderPlaced {
        order_id: Uuid,
        order_number: String,
        wilaya_code: i32,
        total: Decimal,
        coupon_code: Option<String>,
    },
    OrderStatusChanged {
        order_id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
    },
    StockAdjusted {
        order_id: Uuid,
        adjustment: StockAdjustment,
        units: u32,
    },
    ReviewSubmitted {
        review_id: Uuid,
        product_id: Uuid,
        rating: i32,
    },
}

impl DomainEvent {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::OrderPlaced { .. } => "store.order.placed",
            Self::OrderStatusChanged { .. } => "store.order.status_changed",
            Self::StockAdjusted { .. } => "store.product.stock_adjusted",
            Self::ReviewSubmitted { .. } => "store.review.submitted",
        }
    }
}

/// Publishes events to NATS when configured; otherwise a no-op.
#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    pub fn disabled() -> Self { Self::default() }

    pub fn is_enabled(&self) -> bool { self.nats.is_some() }

    /// Failures are logged, never returned: events are best-effort.
    pub async fn publish(&self, event: DomainEvent) {
        let Some(client) = &self.nats else { return };
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, subject = event.subject(), "failed to encode event");
                return;
            }
        };
        if let Err(e) = client.publish(event.subject().to_string(), payload.into()).await {
            tracing::warn!(error = %e, subject = event.subject(), "failed to publish event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = DomainEvent::OrderStatusChanged {
            order_id: Uuid::nil(),
            from: OrderStatus::Pending,
            to: OrderStatus::Cancelled,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "order_status_changed");
        assert_eq!(json["to"], "cancelled");
        assert_eq!(event.subject(), "store.order.status_changed");
    }

    #[tokio::test]
    async fn disabled_publisher_is_silent() {
        let publisher = EventPublisher::disabled();
        assert!(!publisher.is_enabled());
        publisher.publish(DomainEvent::ReviewSubmitted { review_id: Uuid::nil(), product_id: Uuid::nil(), rating: 5 }).await;
    }
}
