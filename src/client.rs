//! Main [`MeshLink`] client implementation.
//!
//! This module provides the high-level [`MeshLink`] handle that combines
//! the byte channel, codec and session driver into a unified interface.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::bus::{EventBus, Subscription, Topic};
use crate::channel::{ByteChannel, DeviceFilter};
use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::session::{Command, Driver, ReconnectPolicy};
use crate::types::OutboundMessage;

/// Capacity of each per-topic event buffer.
const EVENT_CAPACITY: usize = 256;

/// Capacity of the command queue to the session driver.
const COMMAND_CAPACITY: usize = 16;

/// Client for one session to a mesh radio device.
///
/// The handle is cheap to use from anywhere; all session work happens on a
/// background driver task that owns the byte channel. Dropping the last
/// handle tears the driver down.
pub struct MeshLink {
    commands: mpsc::Sender<Command>,
    bus: EventBus,
    driver: Option<JoinHandle<()>>,
}

impl MeshLink {
    /// Creates a client over the given channel and codec with the default
    /// reconnect policy.
    ///
    /// Must be called from within a Tokio runtime; the session driver task
    /// is spawned here.
    #[must_use]
    pub fn new(channel: impl ByteChannel + 'static, codec: impl Codec + 'static) -> Self {
        Self::with_policy(channel, codec, ReconnectPolicy::default())
    }

    /// Creates a client with a custom reconnect policy.
    #[must_use]
    pub fn with_policy(
        channel: impl ByteChannel + 'static,
        codec: impl Codec + 'static,
        policy: ReconnectPolicy,
    ) -> Self {
        let bus = EventBus::new(EVENT_CAPACITY);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
        let driver = Driver::new(channel, Box::new(codec), bus.clone(), policy, command_rx);
        let task = tokio::spawn(driver.run());

        Self {
            commands: command_tx,
            bus,
            driver: Some(task),
        }
    }

    /// Connects to the device.
    ///
    /// Selects a device via `filter` on the first connect; afterwards the
    /// channel's bound device is reused. Unless `skip_auto_config` is set,
    /// the configuration handshake runs as the final step; with it set,
    /// call [`configure`](Self::configure) manually when ready.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyConnected`] if a session is already up,
    /// [`Error::UnsupportedTransport`] if the platform lacks the
    /// transport, or [`Error::Connect`] naming the step that failed.
    pub async fn connect(&self, filter: Option<DeviceFilter>, skip_auto_config: bool) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Connect {
                filter,
                skip_auto_config,
                reply,
            })
            .await
            .map_err(|_| Error::SessionClosed)?;
        response.await.map_err(|_| Error::SessionClosed)?
    }

    /// Runs the device-configuration handshake.
    ///
    /// Watch the status topic for the `Configured` transition.
    pub async fn configure(&self) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Configure { reply })
            .await
            .map_err(|_| Error::SessionClosed)?;
        response.await.map_err(|_| Error::SessionClosed)?
    }

    /// Requests a disconnect.
    ///
    /// Idempotent: extra calls while already disconnected are logged
    /// no-ops. Also cancels a pending reconnect episode.
    pub async fn disconnect(&self) {
        let _ = self.commands.send(Command::Disconnect).await;
    }

    /// Encodes and sends one message to the device.
    pub async fn send(&self, message: OutboundMessage) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Send { message, reply })
            .await
            .map_err(|_| Error::SessionClosed)?;
        response.await.map_err(|_| Error::SessionClosed)?
    }

    /// Subscribes to one topic of the event bus.
    #[must_use]
    pub fn subscribe(&self, topic: Topic) -> Subscription {
        self.bus.subscribe(topic)
    }
}

impl Drop for MeshLink {
    fn drop(&mut self) {
        // Abort the driver task
        if let Some(task) = self.driver.take() {
            task.abort();
        }
    }
}
