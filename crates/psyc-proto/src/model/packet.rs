//! Packets to be sent.

use memchr::memmem;
use tracing::debug;

use crate::{
    Limits, Modifier, ModifierFlag, RenderError, Result, StateOp,
    scan::{is_keyword, num_len},
};

/// Whether the packet carries a content length line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PacketFlag {
    /// Decide when the packet is built
    #[default]
    Check,
    /// Always send the content length
    NeedLength,
    /// Never send the content length
    NoLength,
}

/// A packet ready to render.
///
/// Built through [`Packet::builder`], which fixes every length flag and
/// computes the rendered size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet<'a> {
    routing: Vec<Modifier<'a>>,
    entity: Vec<Modifier<'a>>,
    state_op: StateOp,
    method: &'a [u8],
    data: &'a [u8],
    content: &'a [u8],
    flag: PacketFlag,
    routing_len: usize,
    content_len: usize,
    total_len: usize,
}

impl<'a> Packet<'a> {
    /// Start building a packet.
    pub fn builder() -> PacketBuilder<'a> {
        PacketBuilder::default()
    }

    /// Routing modifiers
    pub fn routing(&self) -> &[Modifier<'a>] {
        &self.routing
    }

    /// Entity modifiers
    pub fn entity(&self) -> &[Modifier<'a>] {
        &self.entity
    }

    /// State operation
    pub fn state_op(&self) -> StateOp {
        self.state_op
    }

    /// Method keyword, empty when absent
    pub fn method(&self) -> &'a [u8] {
        self.method
    }

    /// Body data
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Pre-rendered content, empty unless the packet was built from raw content
    pub fn content(&self) -> &'a [u8] {
        self.content
    }

    /// Resolved length flag
    pub fn flag(&self) -> PacketFlag {
        self.flag
    }

    /// Size of the routing header
    pub fn routing_len(&self) -> usize {
        self.routing_len
    }

    /// Size of the content part, as sent in the length line
    pub fn content_len(&self) -> usize {
        self.content_len
    }

    /// Rendered size in bytes
    pub fn total_len(&self) -> usize {
        self.total_len
    }
}

/// Builder for [`Packet`].
#[derive(Debug, Clone, Default)]
pub struct PacketBuilder<'a> {
    routing: Vec<Modifier<'a>>,
    entity: Vec<Modifier<'a>>,
    state_op: StateOp,
    method: &'a [u8],
    data: &'a [u8],
    content: Option<&'a [u8]>,
    flag: PacketFlag,
}

impl<'a> PacketBuilder<'a> {
    /// Append a routing modifier. Its flag is forced to `Routing`.
    #[must_use]
    pub fn routing(mut self, modifier: Modifier<'a>) -> Self {
        self.routing.push(modifier);
        self
    }

    /// Append an entity modifier.
    #[must_use]
    pub fn entity(mut self, modifier: Modifier<'a>) -> Self {
        self.entity.push(modifier);
        self
    }

    /// Set the state operation.
    #[must_use]
    pub fn state_op(mut self, op: StateOp) -> Self {
        self.state_op = op;
        self
    }

    /// Set the method.
    #[must_use]
    pub fn method(mut self, method: &'a [u8]) -> Self {
        self.method = method;
        self
    }

    /// Set the body data.
    #[must_use]
    pub fn data(mut self, data: &'a [u8]) -> Self {
        self.data = data;
        self
    }

    /// Use pre-rendered content instead of entity, method and data.
    #[must_use]
    pub fn content(mut self, content: &'a [u8]) -> Self {
        self.content = Some(content);
        self
    }

    /// Override the length flag.
    #[must_use]
    pub fn flag(mut self, flag: PacketFlag) -> Self {
        self.flag = flag;
        self
    }

    /// Build with default limits.
    ///
    /// # Errors
    ///
    /// See [`PacketBuilder::build_with`].
    pub fn build(self) -> Result<Packet<'a>> {
        self.build_with(&Limits::default())
    }

    /// Validate the packet, fix its length flags and compute its size.
    ///
    /// # Errors
    ///
    /// - [`RenderError::ContentConflict`] for raw content mixed with entity
    ///   modifiers, a state operation, a method or data
    /// - [`RenderError::DataWithoutMethod`] for data without a method
    /// - [`RenderError::MissingName`] or [`RenderError::InvalidKeyword`] for
    ///   a bad modifier name or method
    /// - [`RenderError::RoutingValue`] for a routing value containing LF
    pub fn build_with(self, limits: &Limits) -> Result<Packet<'a>> {
        let Self { mut routing, mut entity, state_op, method, data, content, flag } = self;

        if content.is_some()
            && (!entity.is_empty() || state_op != StateOp::NoOp || !method.is_empty() || !data.is_empty())
        {
            return Err(RenderError::ContentConflict);
        }
        if !data.is_empty() && method.is_empty() {
            return Err(RenderError::DataWithoutMethod);
        }
        if !method.is_empty() && !is_keyword(method) {
            return Err(RenderError::invalid_keyword(method));
        }

        for modifier in &mut routing {
            modifier.validate()?;
            if modifier.value.contains(&b'\n') {
                return Err(RenderError::RoutingValue(
                    String::from_utf8_lossy(modifier.name).into_owned(),
                ));
            }
            modifier.flag = ModifierFlag::Routing;
        }
        for modifier in &mut entity {
            modifier.validate()?;
            if modifier.flag == ModifierFlag::Routing {
                modifier.flag = ModifierFlag::Check;
            }
            modifier.resolve(limits);
        }

        let content = content.unwrap_or_default();
        let flag = match flag {
            PacketFlag::Check => {
                let need = if content.is_empty() {
                    entity.iter().any(Modifier::needs_length)
                        || data.len() > limits.content_threshold
                        || collides_with_delimiter(data)
                } else {
                    content.len() > limits.content_threshold
                        || collides_with_delimiter(content)
                        || !content.ends_with(b"\n")
                };
                if need { PacketFlag::NeedLength } else { PacketFlag::NoLength }
            },
            fixed => fixed,
        };

        let routing_len = routing.iter().map(Modifier::wire_len).sum::<usize>();
        let content_len = if content.is_empty() {
            let mut len = entity.iter().map(Modifier::wire_len).sum::<usize>();
            if state_op != StateOp::NoOp {
                len += 2;
            }
            if !method.is_empty() {
                len += method.len() + 1;
            }
            if !data.is_empty() {
                len += data.len() + 1;
            }
            len
        } else {
            content.len()
        };

        // routing, [length] LF, content, "|" LF
        let mut total_len = routing_len + content_len + 2;
        if flag == PacketFlag::NeedLength {
            total_len += num_len(content_len);
        }
        if flag == PacketFlag::NeedLength || content_len > 0 {
            total_len += 1;
        }

        debug!(routing_len, content_len, total_len, ?flag, "packet built");
        Ok(Packet {
            routing,
            entity,
            state_op,
            method,
            data,
            content,
            flag,
            routing_len,
            content_len,
            total_len,
        })
    }
}

/// Check if scanning for `LF "|" LF` would end the body early.
fn collides_with_delimiter(body: &[u8]) -> bool {
    body == b"|" || body.ends_with(b"\n|") || memmem::find(body, b"|\n").is_some()
}
