//! Typed multi-topic event bus.
//!
//! Decoded device messages and ambient session signals fan out to
//! subscribers through a fixed set of broadcast topics. Subscribers on
//! different topics, or on the same topic, never block each other or the
//! publishing pipeline; a slow subscriber lags and skips, nothing more.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::broadcast;

use crate::types::{
    ChannelInfo, ConfigEntry, ConnectionStatus, DeviceMetadata, LogRecord, MyNodeInfo, NodeId,
    NodeInfo, Position, QueueStatus, Routing, Telemetry, TextMessage, User, Waypoint,
};

/// Topics the bus carries.
///
/// The set is fixed at construction: one topic per decoded message variant
/// plus the ambient session topics. Publishing to a topic nobody listens
/// to is a no-op; a subscriber attached after a publish never sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Connection lifecycle status.
    Status,
    /// Timestamp of the last decoded message.
    Heartbeat,
    /// Raw bytes of every drained chunk.
    DebugBytes,
    /// Device metadata.
    Metadata,
    /// Whether staged settings changes await a commit.
    PendingSettings,
    /// Device-side packet queue status.
    QueueStatus,
    /// Information about the connected device itself.
    MyInfo,
    /// Node information records.
    NodeInfo,
    /// User records.
    User,
    /// Position reports.
    Position,
    /// Text messages.
    Text,
    /// Telemetry readings.
    Telemetry,
    /// Routing reports.
    Routing,
    /// Shared waypoints.
    Waypoint,
    /// Channel settings.
    ChannelInfo,
    /// Device log records.
    LogRecord,
    /// Configuration sections streamed during the handshake.
    ConfigValue,
    /// Configuration handshake completion.
    ConfigComplete,
}

impl Topic {
    /// Every topic the bus carries.
    pub const ALL: [Self; 18] = [
        Self::Status,
        Self::Heartbeat,
        Self::DebugBytes,
        Self::Metadata,
        Self::PendingSettings,
        Self::QueueStatus,
        Self::MyInfo,
        Self::NodeInfo,
        Self::User,
        Self::Position,
        Self::Text,
        Self::Telemetry,
        Self::Routing,
        Self::Waypoint,
        Self::ChannelInfo,
        Self::LogRecord,
        Self::ConfigValue,
        Self::ConfigComplete,
    ];
}

/// Events published on the bus, one variant per topic.
#[derive(Debug, Clone)]
pub enum Event {
    /// Connection status changed.
    Status(ConnectionStatus),
    /// A message was decoded at this timestamp (Unix seconds).
    Heartbeat(u32),
    /// One chunk was drained from the byte channel.
    DebugBytes(Bytes),
    /// Device metadata received.
    Metadata(DeviceMetadata),
    /// Staged-settings state changed.
    PendingSettings(bool),
    /// Queue status received.
    QueueStatus(QueueStatus),
    /// Info about the connected device received.
    MyInfo(MyNodeInfo),
    /// Node info received.
    NodeInfo(Box<NodeInfo>),
    /// User record received.
    User {
        /// Node that owns the record.
        from: NodeId,
        /// The record.
        user: User,
    },
    /// Position report received.
    Position {
        /// Reporting node.
        from: NodeId,
        /// The position.
        position: Position,
    },
    /// Text message received.
    Text(Box<TextMessage>),
    /// Telemetry reading received.
    Telemetry {
        /// Reporting node.
        from: NodeId,
        /// The reading.
        telemetry: Telemetry,
    },
    /// Routing report received.
    Routing(Routing),
    /// Waypoint received.
    Waypoint(Box<Waypoint>),
    /// Channel settings received.
    ChannelInfo(ChannelInfo),
    /// Device log record received.
    LogRecord(Box<LogRecord>),
    /// One configuration section received during the handshake.
    ConfigValue(ConfigEntry),
    /// The device finished streaming configuration for this nonce.
    ConfigComplete(u32),
}

impl Event {
    /// Returns the topic this event is published on.
    #[must_use]
    pub const fn topic(&self) -> Topic {
        match self {
            Self::Status(_) => Topic::Status,
            Self::Heartbeat(_) => Topic::Heartbeat,
            Self::DebugBytes(_) => Topic::DebugBytes,
            Self::Metadata(_) => Topic::Metadata,
            Self::PendingSettings(_) => Topic::PendingSettings,
            Self::QueueStatus(_) => Topic::QueueStatus,
            Self::MyInfo(_) => Topic::MyInfo,
            Self::NodeInfo(_) => Topic::NodeInfo,
            Self::User { .. } => Topic::User,
            Self::Position { .. } => Topic::Position,
            Self::Text(_) => Topic::Text,
            Self::Telemetry { .. } => Topic::Telemetry,
            Self::Routing(_) => Topic::Routing,
            Self::Waypoint(_) => Topic::Waypoint,
            Self::ChannelInfo(_) => Topic::ChannelInfo,
            Self::LogRecord(_) => Topic::LogRecord,
            Self::ConfigValue(_) => Topic::ConfigValue,
            Self::ConfigComplete(_) => Topic::ConfigComplete,
        }
    }
}

/// A subscription to one topic.
pub struct Subscription {
    topic: Topic,
    receiver: broadcast::Receiver<Event>,
}

impl Subscription {
    /// Returns the topic this subscription listens on.
    #[must_use]
    pub const fn topic(&self) -> Topic {
        self.topic
    }

    /// Receives the next event on the topic.
    ///
    /// Skips over lagged gaps and returns `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::trace!("subscriber lagged, {} events skipped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

struct EventBusInner {
    topics: HashMap<Topic, broadcast::Sender<Event>>,
}

/// Fan-out hub for decoded messages and ambient session signals.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<EventBusInner>,
}

impl EventBus {
    /// Creates a bus with one broadcast channel of `capacity` per topic.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let mut topics = HashMap::with_capacity(Topic::ALL.len());
        for topic in Topic::ALL {
            let (sender, _) = broadcast::channel(capacity);
            topics.insert(topic, sender);
        }
        Self {
            inner: Arc::new(EventBusInner { topics }),
        }
    }

    /// Publishes an event to its topic.
    ///
    /// Delivery to zero subscribers is fine and ignored.
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if let Some(sender) = self.inner.topics.get(&topic) {
            let _ = sender.send(event);
        }
    }

    /// Subscribes to a topic.
    ///
    /// The subscription only sees events published after this call.
    #[must_use]
    pub fn subscribe(&self, topic: Topic) -> Subscription {
        let receiver = self
            .inner
            .topics
            .get(&topic)
            .expect("bus carries every topic")
            .subscribe();
        Subscription { topic, receiver }
    }

    /// Returns the number of live subscriptions on a topic.
    #[must_use]
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.inner
            .topics
            .get(&topic)
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    async fn recv_now(sub: &mut Subscription) -> Option<Event> {
        // Events are already buffered; a tiny timeout keeps failures fast.
        tokio::time::timeout(Duration::from_millis(100), sub.recv())
            .await
            .ok()
            .flatten()
    }

    #[tokio::test]
    async fn test_publish_reaches_topic_subscriber() {
        let bus = EventBus::new(16);
        let mut sub = bus.subscribe(Topic::Status);

        bus.publish(Event::Status(ConnectionStatus::Connected));

        let event = recv_now(&mut sub).await;
        assert!(matches!(
            event,
            Some(Event::Status(ConnectionStatus::Connected))
        ));
    }

    #[tokio::test]
    async fn test_topics_are_independent() {
        let bus = EventBus::new(16);
        let mut text_sub = bus.subscribe(Topic::Text);
        let mut routing_sub = bus.subscribe(Topic::Routing);

        bus.publish(Event::Routing(Routing {
            request_id: 7,
            error: crate::types::RoutingError::None,
        }));

        assert!(matches!(
            recv_now(&mut routing_sub).await,
            Some(Event::Routing(Routing { request_id: 7, .. }))
        ));
        // Nothing crossed over to the text topic.
        assert!(recv_now(&mut text_sub).await.is_none());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let bus = EventBus::new(16);
        // Must not error or panic.
        bus.publish(Event::Heartbeat(1));
        assert_eq!(bus.subscriber_count(Topic::Heartbeat), 0);
    }

    #[tokio::test]
    async fn test_late_subscriber_misses_earlier_events() {
        let bus = EventBus::new(16);
        bus.publish(Event::Heartbeat(1));

        let mut sub = bus.subscribe(Topic::Heartbeat);
        bus.publish(Event::Heartbeat(2));

        assert!(matches!(recv_now(&mut sub).await, Some(Event::Heartbeat(2))));
        assert!(recv_now(&mut sub).await.is_none());
    }

    #[tokio::test]
    async fn test_delivery_preserves_publish_order() {
        let bus = EventBus::new(16);
        let mut sub = bus.subscribe(Topic::Heartbeat);

        for ts in 1..=3 {
            bus.publish(Event::Heartbeat(ts));
        }

        for expected in 1..=3 {
            match recv_now(&mut sub).await {
                Some(Event::Heartbeat(ts)) => assert_eq!(ts, expected),
                other => panic!("expected heartbeat {expected}, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_dropped_subscriber_does_not_affect_others() {
        let bus = EventBus::new(16);
        let dead = bus.subscribe(Topic::Status);
        let mut alive = bus.subscribe(Topic::Status);

        drop(dead);
        bus.publish(Event::Status(ConnectionStatus::Connecting));

        assert!(matches!(
            recv_now(&mut alive).await,
            Some(Event::Status(ConnectionStatus::Connecting))
        ));
    }

    #[test]
    fn test_every_topic_has_a_channel() {
        let bus = EventBus::new(1);
        for topic in Topic::ALL {
            assert_eq!(bus.subscriber_count(topic), 0);
        }
    }

    #[test]
    fn test_event_topic_mapping() {
        assert_eq!(Event::Heartbeat(0).topic(), Topic::Heartbeat);
        assert_eq!(Event::ConfigComplete(1).topic(), Topic::ConfigComplete);
        assert_eq!(
            Event::DebugBytes(Bytes::from_static(b"x")).topic(),
            Topic::DebugBytes
        );
    }
}
