//! Outbound port for pushing real-time events to connected clients.

use crate::domain::events::{EventTopic, RealtimeEvent};

/// Fire-and-forget event sink.
///
/// Implementations must not block: publishing happens on request paths and
/// inside the expiration sweep.
#[cfg_attr(test, mockall::automock)]
pub trait AlertEventPublisher: Send + Sync {
    fn publish(&self, topic: EventTopic, event: RealtimeEvent);
}

/// Publisher that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureEventPublisher;

impl AlertEventPublisher for FixtureEventPublisher {
    fn publish(&self, _topic: EventTopic, _event: RealtimeEvent) {}
}
