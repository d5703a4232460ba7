//! # meshlink
//!
//! A Rust session and typed event-stream layer for mesh radio devices.
//!
//! This library maintains a byte-stream session to an embedded mesh radio
//! over an unreliable local link, reassembles protocol messages from it,
//! and republishes them as strongly-typed topic streams.
//!
//! ## Features
//!
//! - Async/await based API using Tokio
//! - Connection lifecycle state machine with automatic bounded-backoff
//!   reconnection after unsolicited link loss
//! - Notification-driven drain loop that empties the device buffer on
//!   every data signal
//! - Typed multi-topic event bus: independent subscribers per message
//!   variant plus ambient status, heartbeat and debug topics
//! - Transport- and codec-agnostic: bring your own [`ByteChannel`] and
//!   [`Codec`]
//!
//! ## Quick Start
//!
//! ```no_run
//! use meshlink::{ByteChannel, Codec, MeshLink, Topic};
//!
//! async fn run(
//!     channel: impl ByteChannel + 'static,
//!     codec: impl Codec + 'static,
//! ) -> Result<(), meshlink::Error> {
//!     let link = MeshLink::new(channel, codec);
//!     link.connect(None, false).await?;
//!
//!     // Each topic is an independent stream.
//!     let mut texts = link.subscribe(Topic::Text);
//!     while let Some(event) = texts.recv().await {
//!         println!("message: {event:?}");
//!     }
//!
//!     link.disconnect().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`channel`] - Byte-channel contract the concrete transport satisfies
//! - [`codec`] - Codec contract (bytes ↔ typed events)
//! - [`bus`] - Topics, events and the broadcast bus
//! - [`session`] - Connection state machine, drain loop, reconnect policy
//! - [`types`] - Typed payloads carried on the bus
//! - [`client`] - High-level [`MeshLink`] handle
//!
//! Connection-status changes, including silent reconnect exhaustion, are
//! only reported on [`Topic::Status`]; permanent link loss never raises
//! an error on its own.

pub mod bus;
pub mod channel;
pub mod client;
pub mod codec;
pub mod error;
pub mod session;
pub mod types;

// Re-exports for convenience
pub use bus::{Event, EventBus, Subscription, Topic};
pub use channel::{ByteChannel, DeviceFilter, Endpoint, Endpoints, LinkSignal};
pub use client::MeshLink;
pub use codec::Codec;
pub use error::{ConnectStep, Error, Result};
pub use session::ReconnectPolicy;
pub use types::{
    ChannelInfo, ChannelRole, ConfigEntry, ConnectionStatus, DeviceMetadata, LogLevel, LogRecord,
    MyNodeInfo, NodeId, NodeInfo, OutboundMessage, Position, QueueStatus, Routing, RoutingError,
    SignalQuality, Telemetry, TextMessage, User, Waypoint,
};
