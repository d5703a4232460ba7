//! Session driver: connection lifecycle, drain loop and reconnection.
//!
//! All state for one session lives inside a [`Driver`] owned by a single
//! spawned task. The public [`MeshLink`](crate::MeshLink) handle talks to
//! it over a command channel; the byte channel talks to it through the
//! [`LinkSignal`] queue. That makes every state transition, drain step and
//! publish for the session strictly serialized.

pub mod reconnect;

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use crate::bus::{Event, EventBus};
use crate::channel::{ByteChannel, DeviceFilter, Endpoints, LinkSignal};
use crate::codec::Codec;
use crate::error::{ConnectStep, Error, Result};
use crate::types::{ConnectionStatus, OutboundMessage};

pub use reconnect::ReconnectPolicy;

/// Capacity of the command and link-signal queues.
const QUEUE_CAPACITY: usize = 64;

/// Gets the current Unix timestamp as a u32.
fn current_timestamp() -> u32 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u32::try_from(d.as_secs()).unwrap_or(u32::MAX))
        .unwrap_or(0)
}

/// Wraps a step failure into the single connect error surfaced to callers.
fn wrap(step: ConnectStep, source: Error) -> Error {
    Error::Connect {
        step,
        source: Box::new(source),
    }
}

/// Commands from the public handle to the driver task.
pub(crate) enum Command {
    Connect {
        filter: Option<DeviceFilter>,
        skip_auto_config: bool,
        reply: oneshot::Sender<Result<()>>,
    },
    Configure {
        reply: oneshot::Sender<Result<()>>,
    },
    Send {
        message: OutboundMessage,
        reply: oneshot::Sender<Result<()>>,
    },
    Disconnect,
}

/// Lifecycle states of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Connecting,
    Connected,
    Disconnecting,
    Reconnecting,
}

enum Wakeup {
    Command(Option<Command>),
    Signal(Option<LinkSignal>),
}

/// Owns the byte channel and all session state; runs as one task.
pub(crate) struct Driver<C> {
    channel: C,
    codec: Box<dyn Codec>,
    bus: EventBus,
    policy: ReconnectPolicy,
    state: SessionState,
    endpoints: Option<Endpoints>,
    user_initiated_disconnect: bool,
    disconnect_subscribed: bool,
    config_nonce: u32,
    signal_tx: mpsc::Sender<LinkSignal>,
    signal_rx: mpsc::Receiver<LinkSignal>,
    command_rx: mpsc::Receiver<Command>,
}

impl<C: ByteChannel> Driver<C> {
    pub(crate) fn new(
        channel: C,
        codec: Box<dyn Codec>,
        bus: EventBus,
        policy: ReconnectPolicy,
        command_rx: mpsc::Receiver<Command>,
    ) -> Self {
        let (signal_tx, signal_rx) = mpsc::channel(QUEUE_CAPACITY);
        Self {
            channel,
            codec,
            bus,
            policy,
            state: SessionState::Idle,
            endpoints: None,
            user_initiated_disconnect: false,
            disconnect_subscribed: false,
            config_nonce: 0,
            signal_tx,
            signal_rx,
            command_rx,
        }
    }

    /// Runs the session until every handle is dropped.
    pub(crate) async fn run(mut self) {
        loop {
            let wakeup = tokio::select! {
                command = self.command_rx.recv() => Wakeup::Command(command),
                signal = self.signal_rx.recv() => Wakeup::Signal(signal),
            };
            match wakeup {
                Wakeup::Command(Some(command)) => self.handle_command(command).await,
                Wakeup::Signal(Some(LinkSignal::DataReady)) => self.drain().await,
                Wakeup::Signal(Some(LinkSignal::Closed)) => self.handle_link_closed().await,
                Wakeup::Command(None) | Wakeup::Signal(None) => break,
            }
        }
    }

    async fn handle_command(&mut self, command: Command) {
        match command {
            Command::Connect {
                filter,
                skip_auto_config,
                reply,
            } => {
                let result = self.connect(filter.as_ref(), skip_auto_config).await;
                let _ = reply.send(result);
            }
            Command::Configure { reply } => {
                let result = if self.state == SessionState::Connected {
                    self.start_configure().await
                } else {
                    Err(Error::NotConnected)
                };
                let _ = reply.send(result);
            }
            Command::Send { message, reply } => {
                let _ = reply.send(self.send(&message).await);
            }
            Command::Disconnect => self.disconnect().await,
        }
    }

    /// Application-facing connect. Legal only from `Idle`.
    async fn connect(&mut self, filter: Option<&DeviceFilter>, skip_auto_config: bool) -> Result<()> {
        if self.state != SessionState::Idle {
            return Err(Error::AlreadyConnected);
        }
        if !self.channel.is_supported() {
            return Err(Error::UnsupportedTransport);
        }

        self.user_initiated_disconnect = false;
        self.state = SessionState::Connecting;
        self.publish_status(ConnectionStatus::Connecting);

        match self.establish(filter, skip_auto_config).await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.state = SessionState::Idle;
                self.publish_status(ConnectionStatus::Disconnected);
                Err(e)
            }
        }
    }

    /// Runs the connect step sequence against the byte channel.
    ///
    /// Any step failure tears down whatever was opened and surfaces a
    /// single wrapped error naming the step. State handling around the
    /// failure belongs to the caller: `connect` settles idle, the
    /// reconnect episode keeps retrying.
    async fn establish(
        &mut self,
        filter: Option<&DeviceFilter>,
        skip_auto_config: bool,
    ) -> Result<()> {
        let entry_state = self.state;

        if let Err(e) = self.channel.open(filter).await {
            return Err(wrap(ConnectStep::Open, e));
        }

        let endpoints = match self.channel.discover_endpoints().await {
            Ok(endpoints) => endpoints,
            Err(e) => {
                self.abort_half_open().await;
                return Err(wrap(ConnectStep::Discover, e));
            }
        };

        // The disconnect listener survives link replacement; install it
        // only on the first connect of this session.
        if !self.disconnect_subscribed {
            if let Err(e) = self.channel.subscribe_disconnect(self.signal_tx.clone()) {
                self.abort_half_open().await;
                return Err(wrap(ConnectStep::Subscribe, e));
            }
            self.disconnect_subscribed = true;
        }
        if let Err(e) = self
            .channel
            .subscribe_notify(endpoints.notify, self.signal_tx.clone())
        {
            self.abort_half_open().await;
            return Err(wrap(ConnectStep::Subscribe, e));
        }

        self.endpoints = Some(endpoints);
        self.state = SessionState::Connected;
        self.publish_status(ConnectionStatus::Connected);
        tracing::info!("device connected");

        if !skip_auto_config {
            if let Err(e) = self.start_configure().await {
                self.state = entry_state;
                self.abort_half_open().await;
                return Err(wrap(ConnectStep::Configure, e));
            }
        }
        Ok(())
    }

    /// Publishes `Configuring` and sends the want-config request.
    ///
    /// The device answers with a stream of config values and a completion
    /// carrying the same nonce; decoding that completion flips the status
    /// to `Configured`.
    async fn start_configure(&mut self) -> Result<()> {
        let Some(endpoints) = self.endpoints else {
            return Err(Error::NotConnected);
        };
        self.config_nonce = self.config_nonce.wrapping_add(1);
        let nonce = self.config_nonce;
        self.publish_status(ConnectionStatus::Configuring);
        let payload = self.codec.encode(&OutboundMessage::WantConfig { nonce })?;
        self.channel.write(endpoints.outbound, payload).await?;
        tracing::debug!("configuration handshake started, nonce {nonce}");
        Ok(())
    }

    /// Encodes and writes one outbound message.
    async fn send(&mut self, message: &OutboundMessage) -> Result<()> {
        if self.state != SessionState::Connected {
            return Err(Error::NotConnected);
        }
        let Some(endpoints) = self.endpoints else {
            return Err(Error::NotConnected);
        };

        let payload = self.codec.encode(message)?;
        self.channel.write(endpoints.outbound, payload).await?;

        match message {
            OutboundMessage::SetConfig(_) => self.bus.publish(Event::PendingSettings(true)),
            OutboundMessage::CommitConfig => self.bus.publish(Event::PendingSettings(false)),
            _ => {}
        }
        Ok(())
    }

    /// Requests a disconnect.
    ///
    /// Idempotent: the actual transition happens when the channel raises
    /// its closed signal, so a request that races an unsolicited
    /// disconnect collapses into one transition.
    async fn disconnect(&mut self) {
        self.user_initiated_disconnect = true;
        match self.state {
            SessionState::Idle | SessionState::Connecting => {
                tracing::debug!("disconnect requested but device already disconnected");
            }
            SessionState::Disconnecting => {
                tracing::debug!("disconnect already in progress");
            }
            SessionState::Reconnecting => {
                tracing::debug!("reconnect cancelled by disconnect");
            }
            SessionState::Connected => {
                self.state = SessionState::Disconnecting;
                if let Err(e) = self.channel.close().await {
                    tracing::warn!("channel close failed: {e}");
                    // No closed signal will arrive for this link.
                    self.settle_idle();
                }
            }
        }
    }

    /// Handles the channel's closed signal, the sole disconnect trigger.
    async fn handle_link_closed(&mut self) {
        match self.state {
            SessionState::Connected => {
                if self.channel.is_open() {
                    // A signal from a link that has since been replaced.
                    tracing::trace!("stale link-closed signal ignored");
                    return;
                }
                self.endpoints = None;
                self.publish_status(ConnectionStatus::Disconnected);
                if self.user_initiated_disconnect {
                    self.state = SessionState::Idle;
                    tracing::info!("device disconnected");
                } else {
                    tracing::info!("link lost, starting reconnect");
                    self.reconnect_episode().await;
                }
            }
            SessionState::Disconnecting => {
                tracing::info!("device disconnected");
                self.settle_idle();
            }
            SessionState::Idle | SessionState::Connecting | SessionState::Reconnecting => {
                tracing::trace!("link-closed signal in state {:?} ignored", self.state);
            }
        }
    }

    /// One bounded backoff episode after an unsolicited disconnect.
    ///
    /// Exhaustion is deliberately silent beyond a debug log and the final
    /// status publish; callers watch the status topic for permanent loss.
    async fn reconnect_episode(&mut self) {
        self.state = SessionState::Reconnecting;
        self.publish_status(ConnectionStatus::Reconnecting);

        let mut attempt = 0;
        loop {
            if self.user_initiated_disconnect {
                tracing::debug!("reconnect cancelled");
                break;
            }
            if attempt >= self.policy.max_attempts {
                let exhausted = Error::ReconnectExhausted { attempts: attempt };
                tracing::debug!("{exhausted}");
                break;
            }

            let delay = self.policy.delay_for(attempt);
            tracing::debug!("reconnect attempt {} in {:?}", attempt + 1, delay);
            if !self.wait_through_backoff(delay).await {
                tracing::debug!("reconnect cancelled during backoff");
                break;
            }

            attempt += 1;
            match self.establish(None, false).await {
                Ok(()) => {
                    tracing::info!("reconnected after {attempt} attempt(s)");
                    return;
                }
                Err(e) => tracing::debug!("reconnect attempt {attempt} failed: {e}"),
            }
        }
        self.settle_idle();
    }

    /// Sleeps through one backoff delay while staying responsive to
    /// commands. Returns false if the episode was cancelled.
    async fn wait_through_backoff(&mut self, delay: Duration) -> bool {
        let sleep = tokio::time::sleep(delay);
        tokio::pin!(sleep);
        loop {
            let command = tokio::select! {
                () = &mut sleep => return true,
                command = self.command_rx.recv() => command,
            };
            match command {
                Some(command) => {
                    self.handle_reconnect_command(command);
                    if self.user_initiated_disconnect {
                        return false;
                    }
                }
                // Every handle is gone; stop retrying.
                None => return false,
            }
        }
    }

    /// Commands arriving while a reconnect episode owns the driver.
    fn handle_reconnect_command(&mut self, command: Command) {
        match command {
            Command::Connect { reply, .. } => {
                let _ = reply.send(Err(Error::AlreadyConnected));
            }
            Command::Configure { reply } => {
                let _ = reply.send(Err(Error::NotConnected));
            }
            Command::Send { reply, .. } => {
                let _ = reply.send(Err(Error::NotConnected));
            }
            Command::Disconnect => {
                self.user_initiated_disconnect = true;
                tracing::debug!("reconnect cancelled by disconnect");
            }
        }
    }

    /// Drains the device-side buffer until an empty chunk comes back.
    ///
    /// A redundant data signal lands here with nothing buffered and ends
    /// after one empty read. Read failures abort only this drain; the
    /// session stays connected and the next signal starts a fresh one.
    async fn drain(&mut self) {
        let Some(endpoints) = self.endpoints else {
            tracing::trace!("data signal without open link ignored");
            return;
        };
        loop {
            let chunk = match self.channel.read(endpoints.inbound).await {
                Ok(chunk) => chunk,
                Err(e) => {
                    tracing::warn!("read failed, drain aborted: {e}");
                    return;
                }
            };
            if chunk.is_empty() {
                return;
            }

            tracing::trace!(
                "drained {} bytes: {}",
                chunk.len(),
                hex::encode(&chunk[..chunk.len().min(16)])
            );
            self.bus.publish(Event::DebugBytes(chunk.clone()));

            match self.codec.decode(&chunk) {
                Ok(events) => {
                    for event in events {
                        self.dispatch_decoded(event);
                    }
                }
                Err(e) => tracing::warn!("decode failed, chunk skipped: {e}"),
            }
        }
    }

    /// Publishes one decoded event plus its ambient side effects.
    fn dispatch_decoded(&mut self, event: Event) {
        self.bus.publish(Event::Heartbeat(current_timestamp()));
        if let Event::ConfigComplete(nonce) = &event {
            if *nonce == self.config_nonce {
                self.publish_status(ConnectionStatus::Configured);
            } else {
                tracing::debug!("config completion for stale nonce {nonce} ignored");
            }
        }
        self.bus.publish(event);
    }

    /// Best-effort teardown of a partially established link.
    async fn abort_half_open(&mut self) {
        self.endpoints = None;
        if self.channel.is_open() {
            if let Err(e) = self.channel.close().await {
                tracing::debug!("half-open channel close failed: {e}");
            }
        }
    }

    fn settle_idle(&mut self) {
        self.state = SessionState::Idle;
        self.endpoints = None;
        self.publish_status(ConnectionStatus::Disconnected);
    }

    fn publish_status(&self, status: ConnectionStatus) {
        self.bus.publish(Event::Status(status));
    }
}
