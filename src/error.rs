//! Error types for the meshlink library.

use thiserror::Error;

/// The connect step that failed.
///
/// Every failure inside the multi-step connect sequence is wrapped into a
/// single [`Error::Connect`] naming one of these steps, so callers get a
/// useful message without unwrapping nested causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStep {
    /// Opening the byte channel (includes device selection).
    Open,
    /// Locating the outbound/inbound/notify endpoints.
    Discover,
    /// Subscribing to data and disconnect notifications.
    Subscribe,
    /// Running the device-configuration handshake.
    Configure,
}

impl std::fmt::Display for ConnectStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let step = match self {
            Self::Open => "opening the byte channel",
            Self::Discover => "endpoint discovery",
            Self::Subscribe => "notification subscribe",
            Self::Configure => "the configuration handshake",
        };
        f.write_str(step)
    }
}

/// The main error type for meshlink operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A connect was issued while a session is already connected or
    /// connecting.
    #[error("device is already connected")]
    AlreadyConnected,

    /// The platform lacks the transport capability behind the byte channel.
    #[error("transport is not supported on this platform")]
    UnsupportedTransport,

    /// Device selection was cancelled or matched no device.
    #[error("device selection failed: {reason}")]
    DeviceSelection { reason: String },

    /// A required service or endpoint was not found on the device.
    #[error("endpoint discovery failed: missing {endpoint}")]
    EndpointDiscovery { endpoint: String },

    /// A chunk read from the byte channel failed.
    #[error("chunk read failed: {reason}")]
    Read { reason: String },

    /// A chunk write to the byte channel failed.
    #[error("chunk write failed: {reason}")]
    Write { reason: String },

    /// A step of the connect sequence failed.
    #[error("connect failed while {step}: {source}")]
    Connect {
        step: ConnectStep,
        #[source]
        source: Box<Error>,
    },

    /// The reconnect retry budget was exhausted.
    ///
    /// Never returned to callers; the session logs it and settles idle.
    /// Watch the connection-status topic to detect permanent loss.
    #[error("reconnect abandoned after {attempts} attempts")]
    ReconnectExhausted { attempts: u32 },

    /// Connection is not established.
    #[error("not connected")]
    NotConnected,

    /// Message encoding or decoding failed.
    #[error("codec error: {message}")]
    Codec { message: String },

    /// The session driver task is gone.
    #[error("session closed")]
    SessionClosed,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for meshlink operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_error_names_step() {
        let err = Error::Connect {
            step: ConnectStep::Discover,
            source: Box::new(Error::EndpointDiscovery {
                endpoint: "notify".into(),
            }),
        };
        let message = err.to_string();
        assert!(message.contains("endpoint discovery"));
        assert!(message.contains("missing notify"));
    }

    #[test]
    fn test_step_display() {
        assert_eq!(ConnectStep::Open.to_string(), "opening the byte channel");
        assert_eq!(
            ConnectStep::Configure.to_string(),
            "the configuration handshake"
        );
    }
}
