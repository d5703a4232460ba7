//! Data types for mesh device entities.
//!
//! This module contains the typed payloads that flow over the event bus:
//! - Node, user and device information
//! - Messages (text, routing, waypoints, log records)
//! - Connection status
//! - Outbound message variants

pub mod device;
pub mod message;
pub mod status;

pub use device::{
    ChannelInfo, ChannelRole, DeviceMetadata, MyNodeInfo, NodeId, NodeInfo, Position, QueueStatus,
    Telemetry, User,
};
pub use message::{
    ConfigEntry, LogLevel, LogRecord, OutboundMessage, Routing, RoutingError, SignalQuality,
    TextMessage, Waypoint,
};
pub use status::ConnectionStatus;
