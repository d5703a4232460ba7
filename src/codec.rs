//! Codec boundary between raw chunks and typed events.
//!
//! The concrete wire format (protobuf or otherwise) lives outside this
//! crate. The session hands every drained chunk to a [`Codec`] and
//! publishes whatever events come back; outbound messages go through
//! [`Codec::encode`] before hitting the byte channel.

use bytes::Bytes;

use crate::bus::Event;
use crate::error::Result;
use crate::types::OutboundMessage;

/// Converts between raw byte chunks and typed protocol events.
///
/// Implementations may be stateful: a chunk can end mid-message, so a
/// decoder is allowed to buffer partial input across calls and return the
/// completed messages on a later chunk.
pub trait Codec: Send {
    /// Parses one drained chunk into zero or more decoded events.
    ///
    /// Returned events must be device-originated variants; ambient events
    /// (status, heartbeat, debug bytes) are produced by the session itself.
    fn decode(&mut self, chunk: &[u8]) -> Result<Vec<Event>>;

    /// Serializes an outbound message for the byte channel.
    fn encode(&mut self, message: &OutboundMessage) -> Result<Bytes>;
}
