use async_trait::async_trait;

use crate::domain::DomainEvent;

#[derive(Debug)]
pub enum EventBusError {
    Closed,
    DispatchFailed(String),
}

impl std::fmt::Display for EventBusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventBusError::Closed => write!(f, "Event bus is closed"),
            EventBusError::DispatchFailed(msg) => write!(f, "Event dispatch failed: {}", msg),
        }
    }
}

impl std::error::Error for EventBusError {}

/// Fire-and-forget publication of domain events with at-least-once delivery.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, event: DomainEvent) -> Result<(), EventBusError>;
}
