//! Packet reader over a fragmented byte stream.
//!
//! The reader owns the input buffer the parser borrows from. Bytes are
//! appended with [`PacketReader::feed`]; [`PacketReader::next_packet`] drives
//! the parser until a packet completes or the buffer runs out, copying each
//! unit into the packet under construction and dropping consumed input.
//!
//! Announced lengths are never trusted for allocation: a value grows only as
//! its bytes arrive, and values announcing more than the reader's maximum are
//! rejected before any of them is stored.

use bytes::{Buf, Bytes, BytesMut};
use psyc_proto::{PacketEvent, PacketParser, ParseFlags, StateOp};
use tracing::{debug, trace};

use crate::{
    error::{ReaderError, Result},
    received::{OwnedModifier, ReceivedPacket},
};

/// Default limit for a single length-prefixed value: 16 MiB.
pub const DEFAULT_MAX_VALUE: usize = 16 * 1024 * 1024;

/// Where pieces of a length-prefixed value go once complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Entity,
    Data,
    Content,
}

/// Packet under construction.
#[derive(Debug, Default)]
struct Assembly {
    packet: ReceivedPacket,
    /// Value delivered in pieces so far
    piece: BytesMut,
    target: Option<Target>,
}

impl Assembly {
    fn apply(&mut self, event: PacketEvent<'_>, max_value: usize) -> Result<()> {
        if let PacketEvent::EntityStart { len, .. }
        | PacketEvent::BodyStart { len, .. }
        | PacketEvent::ContentStart { len, .. } = event
        {
            if len > max_value {
                return Err(ReaderError::ValueTooLarge { len, max: max_value });
            }
        }
        match event {
            PacketEvent::Routing { oper, name, value } => {
                self.packet.routing.push(OwnedModifier::copy(oper, name, value));
            },
            PacketEvent::StateReset => self.packet.state_op = StateOp::Reset,
            PacketEvent::StateResync => self.packet.state_op = StateOp::Resync,
            PacketEvent::Entity { oper, name, value } => {
                self.packet.entity.push(OwnedModifier::copy(oper, name, value));
            },
            PacketEvent::EntityStart { oper, name, value, .. } => {
                self.packet.entity.push(OwnedModifier::copy(oper, name, &[]));
                self.start(Target::Entity, value);
            },
            PacketEvent::Body { method, data } => {
                self.packet.method = Bytes::copy_from_slice(method);
                self.packet.data = Bytes::copy_from_slice(data);
            },
            PacketEvent::BodyStart { method, data, .. } => {
                self.packet.method = Bytes::copy_from_slice(method);
                self.start(Target::Data, data);
            },
            PacketEvent::Content(content) => self.packet.content = Bytes::copy_from_slice(content),
            PacketEvent::ContentStart { data, .. } => self.start(Target::Content, data),
            PacketEvent::EntityCont(piece) | PacketEvent::BodyCont(piece) | PacketEvent::ContentCont(piece) => {
                self.piece.extend_from_slice(piece);
            },
            PacketEvent::EntityEnd(piece) | PacketEvent::BodyEnd(piece) | PacketEvent::ContentEnd(piece) => {
                self.piece.extend_from_slice(piece);
                self.finish_piece();
            },
            PacketEvent::Insufficient | PacketEvent::Complete => {},
        }
        Ok(())
    }

    fn start(&mut self, target: Target, first: &[u8]) {
        self.piece.clear();
        self.piece.extend_from_slice(first);
        self.target = Some(target);
    }

    fn finish_piece(&mut self) {
        let value = self.piece.split().freeze();
        match self.target.take() {
            Some(Target::Entity) => {
                if let Some(last) = self.packet.entity.last_mut() {
                    last.value = value;
                }
            },
            Some(Target::Data) => self.packet.data = value,
            Some(Target::Content) => self.packet.content = value,
            None => {},
        }
    }
}

/// Reads packets from a stream of arbitrarily split byte chunks.
#[derive(Debug)]
pub struct PacketReader {
    parser: PacketParser,
    buf: BytesMut,
    assembly: Assembly,
    max_value: usize,
}

impl Default for PacketReader {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketReader {
    /// Create a reader that parses whole packets.
    pub fn new() -> Self {
        Self::with_flags(ParseFlags::empty())
    }

    /// Create a reader with parser flags, e.g. routing-only for relays.
    pub fn with_flags(flags: ParseFlags) -> Self {
        Self {
            parser: PacketParser::new(flags),
            buf: BytesMut::new(),
            assembly: Assembly::default(),
            max_value: DEFAULT_MAX_VALUE,
        }
    }

    /// Set the largest length-prefixed value accepted, in bytes.
    #[must_use]
    pub fn with_max_value(mut self, bytes: usize) -> Self {
        self.max_value = bytes;
        self
    }

    /// Append received bytes.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes received but not yet consumed
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Read the next complete packet, or `None` until more bytes are fed.
    ///
    /// # Errors
    ///
    /// [`ReaderError::Packet`] on malformed framing and
    /// [`ReaderError::ValueTooLarge`] for a value over the maximum. The packet
    /// under construction and all buffered input are dropped; the reader
    /// starts over with the next fed bytes.
    pub fn next_packet(&mut self) -> Result<Option<ReceivedPacket>> {
        loop {
            let event = match self.parser.parse(&self.buf) {
                Ok(event) => event,
                Err(error) => return Err(self.drop_input(error.into())),
            };
            match event {
                PacketEvent::Insufficient => {
                    self.compact();
                    return Ok(None);
                },
                PacketEvent::Complete => {
                    self.compact();
                    let packet = std::mem::take(&mut self.assembly).packet;
                    debug!(
                        method = %packet.method.escape_ascii(),
                        routing = packet.routing.len(),
                        entity = packet.entity.len(),
                        "packet received"
                    );
                    return Ok(Some(packet));
                },
                event => {
                    if let Err(error) = self.assembly.apply(event, self.max_value) {
                        self.parser.reset();
                        return Err(self.drop_input(error));
                    }
                },
            }
        }
    }

    fn drop_input(&mut self, error: ReaderError) -> ReaderError {
        debug!(%error, buffered = self.buf.len(), "dropping stream input");
        self.buf.clear();
        self.assembly = Assembly::default();
        error
    }

    fn compact(&mut self) {
        let consumed = self.parser.discard_consumed();
        self.buf.advance(consumed);
        trace!(consumed, buffered = self.buf.len(), "reader compacted");
    }
}
