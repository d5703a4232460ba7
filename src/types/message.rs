//! Message payload types for decoded and outbound traffic.

use bytes::Bytes;

use crate::types::device::{NodeId, Position};

/// Signal quality of a received packet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalQuality {
    /// Signal-to-noise ratio in dB.
    pub snr: f32,
    /// Received signal strength in dBm.
    pub rssi: i16,
}

/// A text message received over the mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct TextMessage {
    /// Sender node.
    pub from: NodeId,
    /// Destination node, possibly broadcast.
    pub to: NodeId,
    /// Channel slot the message arrived on.
    pub channel: u8,
    /// Message body.
    pub body: String,
    /// Receive timestamp (Unix seconds).
    pub rx_time: u32,
    /// Signal quality, if the radio reported it.
    pub signal: Option<SignalQuality>,
}

/// Routing outcome of a previously sent packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum RoutingError {
    /// Packet was delivered.
    #[default]
    None = 0,
    /// No route to the destination.
    NoRoute = 1,
    /// A node on the path rejected the packet.
    GotNak = 2,
    /// Routing timed out.
    Timeout = 3,
}

impl RoutingError {
    /// Parses a routing error from a byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            1 => Self::NoRoute,
            2 => Self::GotNak,
            3 => Self::Timeout,
            _ => Self::None,
        }
    }
}

/// Routing report for a tracked request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routing {
    /// Id of the request this report answers.
    pub request_id: u32,
    /// Outcome.
    pub error: RoutingError,
}

/// A shared waypoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    /// Waypoint id.
    pub id: u32,
    /// Position of the waypoint.
    pub position: Position,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: String,
    /// Expiry timestamp (Unix seconds), 0 for never.
    pub expire: u32,
}

/// Severity of a device log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum LogLevel {
    /// Unset level.
    #[default]
    Unset = 0,
    /// Critical failure.
    Critical = 1,
    /// Error condition.
    Error = 2,
    /// Warning.
    Warning = 3,
    /// Informational.
    Info = 4,
    /// Debug detail.
    Debug = 5,
}

impl LogLevel {
    /// Parses a log level from a byte.
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            1 => Self::Critical,
            2 => Self::Error,
            3 => Self::Warning,
            4 => Self::Info,
            5 => Self::Debug,
            _ => Self::Unset,
        }
    }
}

/// A log record forwarded by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Severity.
    pub level: LogLevel,
    /// Log message.
    pub message: String,
    /// Emitting subsystem.
    pub source: String,
    /// Record timestamp (Unix seconds).
    pub time: u32,
}

/// One opaque configuration section as the device exchanges it.
///
/// The payload encoding belongs to the codec; the session only routes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    /// Section name (e.g. "lora", "display").
    pub section: String,
    /// Encoded section payload.
    pub payload: Bytes,
}

/// Messages the application can send to the device.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundMessage {
    /// Requests the device-configuration stream; the device answers with
    /// config values and a completion carrying the same nonce.
    WantConfig {
        /// Nonce echoed back in the completion.
        nonce: u32,
    },
    /// A text message.
    Text {
        /// Destination node, possibly broadcast.
        to: NodeId,
        /// Channel slot to send on.
        channel: u8,
        /// Message body.
        body: String,
    },
    /// A position update.
    Position(Position),
    /// A shared waypoint.
    Waypoint(Waypoint),
    /// Stages one configuration section on the device.
    SetConfig(ConfigEntry),
    /// Commits all staged configuration sections.
    CommitConfig,
    /// A pre-encoded payload passed through as-is.
    Raw(Bytes),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_error_from_byte() {
        assert_eq!(RoutingError::from_byte(0), RoutingError::None);
        assert_eq!(RoutingError::from_byte(2), RoutingError::GotNak);
        assert_eq!(RoutingError::from_byte(99), RoutingError::None);
    }

    #[test]
    fn test_log_level_from_byte() {
        assert_eq!(LogLevel::from_byte(4), LogLevel::Info);
        assert_eq!(LogLevel::from_byte(0), LogLevel::Unset);
    }
}
