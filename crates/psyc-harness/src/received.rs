//! Packets copied out of the input buffer.

use bytes::Bytes;
use psyc_proto::{Limits, Modifier, Operator, Packet, StateOp};

use crate::error::Result;

/// A modifier that owns its name and value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedModifier {
    /// Operator glyph
    pub oper: Operator,
    /// Variable name
    pub name: Bytes,
    /// Value
    pub value: Bytes,
}

impl OwnedModifier {
    pub(crate) fn copy(oper: Operator, name: &[u8], value: &[u8]) -> Self {
        Self { oper, name: Bytes::copy_from_slice(name), value: Bytes::copy_from_slice(value) }
    }

    /// Borrow as an entity modifier whose length flag is decided on build.
    pub fn as_modifier(&self) -> Modifier<'_> {
        Modifier::new(self.oper, &self.name, &self.value)
    }
}

/// A complete packet read from a stream.
///
/// In routing-only mode `content` holds the raw content part and the entity,
/// method and data fields stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceivedPacket {
    /// Routing modifiers in wire order
    pub routing: Vec<OwnedModifier>,
    /// State operation
    pub state_op: StateOp,
    /// Entity modifiers in wire order
    pub entity: Vec<OwnedModifier>,
    /// Method, empty when absent
    pub method: Bytes,
    /// Body data
    pub data: Bytes,
    /// Raw content part, routing-only mode
    pub content: Bytes,
}

impl ReceivedPacket {
    /// Value of the first routing modifier named `name`.
    pub fn routing_var(&self, name: &[u8]) -> Option<&Bytes> {
        find(&self.routing, name)
    }

    /// Value of the first entity modifier named `name`.
    pub fn entity_var(&self, name: &[u8]) -> Option<&Bytes> {
        find(&self.entity, name)
    }

    /// Rebuild a renderable packet, for relaying or echoing.
    ///
    /// Length flags are decided again under `limits`, so the rendered bytes
    /// may differ from the received ones while parsing to the same packet.
    ///
    /// # Errors
    ///
    /// [`crate::ReaderError::Render`] if the packet cannot be sent as is.
    pub fn as_packet(&self, limits: &Limits) -> Result<Packet<'_>> {
        let mut builder = Packet::builder();
        for m in &self.routing {
            builder = builder.routing(Modifier::routing(m.oper, &m.name, &m.value));
        }
        for m in &self.entity {
            builder = builder.entity(m.as_modifier());
        }
        if !self.content.is_empty() {
            builder = builder.content(&self.content);
        }
        let packet = builder
            .state_op(self.state_op)
            .method(&self.method)
            .data(&self.data)
            .build_with(limits)?;
        Ok(packet)
    }
}

fn find<'p>(modifiers: &'p [OwnedModifier], name: &[u8]) -> Option<&'p Bytes> {
    modifiers.iter().find(|m| m.name == name).map(|m| &m.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rebuilds_renderable_packet() {
        let received = ReceivedPacket {
            routing: vec![OwnedModifier::copy(Operator::Set, b"_target", b"psyc://host/~alice")],
            entity: vec![OwnedModifier::copy(Operator::Assign, b"_nick", b"bob")],
            method: Bytes::from_static(b"_message_private"),
            data: Bytes::from_static(b"hi"),
            ..ReceivedPacket::default()
        };
        let packet = received.as_packet(&Limits::default()).unwrap();
        assert_eq!(
            &packet.to_bytes()[..],
            b":_target\tpsyc://host/~alice\n\n=_nick\tbob\n_message_private\nhi\n|\n"
        );
        assert_eq!(received.routing_var(b"_target").map(|v| &v[..]), Some(&b"psyc://host/~alice"[..]));
        assert_eq!(received.entity_var(b"_target"), None);
    }

    #[test]
    fn raw_content_rebuilds_as_content() {
        let received = ReceivedPacket {
            content: Bytes::from_static(b"_ping\n"),
            ..ReceivedPacket::default()
        };
        let packet = received.as_packet(&Limits::default()).unwrap();
        assert_eq!(&packet.to_bytes()[..], b"\n_ping\n|\n");
    }
}
