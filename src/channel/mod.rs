//! Byte-channel abstraction over the physical link.
//!
//! This module defines the contract a concrete transport (BLE, serial,
//! HTTP) has to satisfy. The session never touches a radio directly; it
//! drives a [`ByteChannel`] and reacts to the [`LinkSignal`]s the channel
//! enqueues.

use bytes::Bytes;
use futures::future::BoxFuture;
use tokio::sync::mpsc;

use crate::error::Result;

/// Opaque handle to one endpoint of an open channel.
///
/// Endpoint handles are assigned by the channel implementation during
/// [`ByteChannel::discover_endpoints`] and become invalid when the channel
/// closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Endpoint(u32);

impl Endpoint {
    /// Creates an endpoint handle from a raw id.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// The three endpoints of the device protocol service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    /// Endpoint the session writes encoded messages to.
    pub outbound: Endpoint,
    /// Endpoint the session drains chunks from.
    pub inbound: Endpoint,
    /// Endpoint that raises data-available notifications.
    pub notify: Endpoint,
}

/// Wake-up signals raised by the channel.
///
/// Transport callbacks must never run session logic directly; they enqueue
/// a signal and the session's driver task picks it up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSignal {
    /// The device-side buffer has data to drain.
    DataReady,
    /// The link dropped, either requested or unsolicited.
    Closed,
}

/// Filter applied when selecting a device to open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceFilter {
    /// Match devices whose advertised name starts with this prefix.
    pub name_prefix: Option<String>,
    /// Match devices advertising this protocol service id.
    pub service: Option<String>,
}

impl DeviceFilter {
    /// Creates an empty filter (matches any device).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            name_prefix: None,
            service: None,
        }
    }

    /// Sets the name prefix to match.
    #[must_use]
    pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    /// Sets the service id to match.
    #[must_use]
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }
}

/// Trait for byte-channel implementations.
///
/// One channel instance is bound to at most one device. The first
/// successful [`open`](Self::open) with a filter selects and remembers the
/// device; later opens with no filter must reuse it, which is what the
/// session relies on when it reconnects without prompting.
pub trait ByteChannel: Send + Sync {
    /// Returns true if the platform provides this transport at all.
    fn is_supported(&self) -> bool;

    /// Opens the link to the device.
    ///
    /// With a filter and no bound device, performs device selection first.
    /// With no filter, reuses the previously bound device and fails with
    /// [`Error::DeviceSelection`](crate::Error::DeviceSelection) if there
    /// is none.
    fn open(&mut self, filter: Option<&DeviceFilter>) -> BoxFuture<'_, Result<()>>;

    /// Locates the protocol service and its three endpoints.
    fn discover_endpoints(&mut self) -> BoxFuture<'_, Result<Endpoints>>;

    /// Reads one chunk from an endpoint.
    ///
    /// An empty result means the device-side buffer is exhausted; it is not
    /// an error.
    fn read(&mut self, endpoint: Endpoint) -> BoxFuture<'_, Result<Bytes>>;

    /// Writes one chunk to an endpoint.
    fn write(&mut self, endpoint: Endpoint, data: Bytes) -> BoxFuture<'_, Result<()>>;

    /// Registers the sender that receives [`LinkSignal::DataReady`] for the
    /// given notify endpoint. Replaces any previous registration.
    fn subscribe_notify(&mut self, endpoint: Endpoint, signals: mpsc::Sender<LinkSignal>)
    -> Result<()>;

    /// Registers the sender that receives [`LinkSignal::Closed`] when the
    /// link drops. Replaces any previous registration.
    fn subscribe_disconnect(&mut self, signals: mpsc::Sender<LinkSignal>) -> Result<()>;

    /// Requests the link to close.
    ///
    /// The channel confirms by enqueueing [`LinkSignal::Closed`]; the
    /// session treats that signal, not this call, as the state transition.
    fn close(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Returns true if the link is currently open.
    fn is_open(&self) -> bool;
}
