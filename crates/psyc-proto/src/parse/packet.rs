//! Packet framing.
//!
//! The parser walks a packet part by part:
//!
//! ```text
//! Reset -> Routing -> Length -> Content -> Method -> End -> Reset
//!                            \-> Data (routing only) -/
//! ```
//!
//! Each call returns one unit. Values announced with an explicit length are
//! returned in pieces when the buffer holds only part of them, so the caller
//! never has to buffer a whole binary value.

use tracing::{debug, trace};

use crate::{
    Operator, ParseError, ParseFlags,
    parse::{Piece, continue_value},
    scan::{Digits, Halt, Scanner, Take, fail},
};

/// One unit of a packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketEvent<'a> {
    /// The buffer ends inside a unit
    Insufficient,
    /// Routing modifier
    Routing {
        /// Operator glyph
        oper: Operator,
        /// Variable name
        name: &'a [u8],
        /// Value
        value: &'a [u8],
    },
    /// `=` state operation
    StateReset,
    /// `?` state operation
    StateResync,
    /// Complete entity modifier
    Entity {
        /// Operator glyph
        oper: Operator,
        /// Variable name
        name: &'a [u8],
        /// Value
        value: &'a [u8],
    },
    /// First piece of a length-prefixed entity modifier
    EntityStart {
        /// Operator glyph
        oper: Operator,
        /// Variable name
        name: &'a [u8],
        /// Bytes of the value available so far
        value: &'a [u8],
        /// Announced value length
        len: usize,
    },
    /// Middle piece of an entity modifier value
    EntityCont(&'a [u8]),
    /// Last piece of an entity modifier value
    EntityEnd(&'a [u8]),
    /// Method with its complete data
    Body {
        /// Method keyword
        method: &'a [u8],
        /// Data, empty when absent
        data: &'a [u8],
    },
    /// Method with the first piece of its data
    BodyStart {
        /// Method keyword
        method: &'a [u8],
        /// Bytes of the data available so far
        data: &'a [u8],
        /// Length of the whole data
        len: usize,
    },
    /// Middle piece of the data
    BodyCont(&'a [u8]),
    /// Last piece of the data
    BodyEnd(&'a [u8]),
    /// Complete raw content, in routing-only mode
    Content(&'a [u8]),
    /// First piece of raw content
    ContentStart {
        /// Bytes available so far
        data: &'a [u8],
        /// Length of the whole content
        len: usize,
    },
    /// Middle piece of raw content
    ContentCont(&'a [u8]),
    /// Last piece of raw content
    ContentEnd(&'a [u8]),
    /// The packet is complete
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Reset,
    Routing,
    /// Content length line, or the delimiter of a packet without content
    Length,
    /// State operation and entity modifiers
    Content,
    Method,
    /// Raw content in routing-only mode
    Data,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PendingKind {
    Entity,
    Body,
    Content,
}

/// A length-prefixed value delivered in pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    kind: PendingKind,
    remaining: usize,
}

/// Line feed owed after a length-prefixed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Newline {
    Modifier,
    Body,
}

impl Newline {
    fn error(self, at: usize) -> ParseError {
        match self {
            Self::Modifier => ParseError::MissingModifierNewline { at },
            Self::Body => ParseError::MissingBodyNewline { at },
        }
    }
}

/// Outcome of one part handler.
enum Flow<'a> {
    /// Return a unit, staying in the current part
    Emit(PacketEvent<'a>),
    /// Return a unit and move on
    EmitAndEnter(PacketEvent<'a>, Part),
    /// Move on without returning
    Enter(Part),
}

/// Resumable packet parser.
///
/// One parser per stream. The parser never copies: events borrow the buffer
/// passed to [`parse`](Self::parse).
#[derive(Debug, Clone)]
pub struct PacketParser {
    flags: ParseFlags,
    part: Part,
    cursor: usize,
    /// Announced length of the current content part
    content_len: Option<usize>,
    /// Content bytes consumed so far
    content_parsed: usize,
    pending: Option<Pending>,
    newline: Option<Newline>,
    /// Content length of every buffer in content-only mode
    fixed_len: Option<usize>,
}

impl Default for PacketParser {
    fn default() -> Self {
        Self::new(ParseFlags::empty())
    }
}

impl PacketParser {
    /// Create a parser for whole packets.
    ///
    /// [`ParseFlags::START_AT_CONTENT`] is ignored here; use
    /// [`PacketParser::for_content`].
    pub fn new(flags: ParseFlags) -> Self {
        Self::with_fixed_len(flags - ParseFlags::START_AT_CONTENT, None)
    }

    /// Create a parser for raw content of `len` bytes, as delivered by a
    /// routing-only parser: no routing header, no length line and no
    /// delimiter.
    pub fn for_content(len: usize) -> Self {
        Self::with_fixed_len(ParseFlags::START_AT_CONTENT, Some(len))
    }

    fn with_fixed_len(flags: ParseFlags, fixed_len: Option<usize>) -> Self {
        let mut parser = Self {
            flags,
            part: Part::Reset,
            cursor: 0,
            content_len: None,
            content_parsed: 0,
            pending: None,
            newline: None,
            fixed_len,
        };
        parser.start_packet();
        parser
    }

    /// Parse flags
    pub fn flags(&self) -> ParseFlags {
        self.flags
    }

    /// Offset of the next unit in the current buffer
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Announced content length of the current packet, once parsed
    pub fn content_len(&self) -> Option<usize> {
        self.content_len
    }

    /// Number of leading bytes the caller may drop from the buffer. The
    /// cursor restarts at zero, so the next buffer must start with the
    /// bytes that were not dropped.
    pub fn discard_consumed(&mut self) -> usize {
        std::mem::take(&mut self.cursor)
    }

    /// Drop the current packet and start over at offset zero.
    pub fn reset(&mut self) {
        self.cursor = 0;
        self.start_packet();
    }

    fn start_packet(&mut self) {
        self.part = if self.fixed_len.is_some() { Part::Content } else { Part::Reset };
        self.content_len = self.fixed_len;
        self.content_parsed = 0;
        self.pending = None;
        self.newline = None;
    }

    /// Parse the next unit of `buf`.
    ///
    /// `buf` must start where the previous buffer was cut by
    /// [`discard_consumed`](Self::discard_consumed), or be the previous
    /// buffer with more bytes appended.
    ///
    /// # Errors
    ///
    /// Any [`ParseError`]. The parser is reset to offset zero and the caller
    /// must drop the rest of the packet.
    pub fn parse<'a>(&mut self, buf: &'a [u8]) -> Result<PacketEvent<'a>, ParseError> {
        let mut sc = Scanner::new(buf, self.cursor);
        let step = self.step(&mut sc);
        self.cursor = sc.pos();
        match step {
            Ok(event) => {
                trace!(?event, cursor = self.cursor, "packet unit");
                Ok(event)
            },
            Err(Halt::NeedMoreData) => Ok(PacketEvent::Insufficient),
            Err(Halt::Fail(error)) => {
                debug!(%error, part = ?self.part, "packet parse failed");
                self.reset();
                Err(error)
            },
        }
    }

    fn step<'a>(&mut self, sc: &mut Scanner<'a>) -> Result<PacketEvent<'a>, Halt<ParseError>> {
        loop {
            sc.set_mark();
            if let Some(pending) = self.pending {
                return self.resume(sc, pending);
            }
            if let Some(newline) = self.newline {
                if sc.byte()? != b'\n' {
                    return fail(newline.error(sc.pos()));
                }
                sc.skip(1);
                self.content_parsed += 1;
                self.newline = None;
                sc.set_mark();
            }

            let flow = match self.part {
                Part::Reset => Flow::Enter(Part::Routing),
                Part::Routing => self.routing(sc)?,
                Part::Length => self.length(sc)?,
                Part::Content => self.content(sc)?,
                Part::Method => self.method(sc)?,
                Part::Data => self.raw_content(sc)?,
                Part::End => self.end(sc)?,
            };
            match flow {
                Flow::Emit(event) => return Ok(event),
                Flow::EmitAndEnter(event, part) => {
                    self.enter(part);
                    return Ok(event);
                },
                Flow::Enter(part) => self.enter(part),
            }
        }
    }

    fn enter(&mut self, part: Part) {
        trace!(from = ?self.part, to = ?part, "packet part");
        self.part = part;
    }

    fn resume<'a>(&mut self, sc: &mut Scanner<'a>, pending: Pending) -> Result<PacketEvent<'a>, Halt<ParseError>> {
        let piece = continue_value(sc, pending.remaining)?;
        Ok(match piece {
            Piece::Cont(bytes, remaining) => {
                self.content_parsed += bytes.len();
                self.pending = Some(Pending { remaining, ..pending });
                match pending.kind {
                    PendingKind::Entity => PacketEvent::EntityCont(bytes),
                    PendingKind::Body => PacketEvent::BodyCont(bytes),
                    PendingKind::Content => PacketEvent::ContentCont(bytes),
                }
            },
            Piece::End(bytes) => {
                self.content_parsed += bytes.len();
                self.pending = None;
                match pending.kind {
                    PendingKind::Entity => {
                        self.newline = Some(Newline::Modifier);
                        PacketEvent::EntityEnd(bytes)
                    },
                    PendingKind::Body => {
                        self.newline = Some(Newline::Body);
                        PacketEvent::BodyEnd(bytes)
                    },
                    PendingKind::Content => PacketEvent::ContentEnd(bytes),
                }
            },
        })
    }

    fn routing<'a>(&mut self, sc: &mut Scanner<'a>) -> Result<Flow<'a>, Halt<ParseError>> {
        let Some(oper) = Operator::from_glyph(sc.byte()?) else {
            return Ok(Flow::Enter(Part::Length));
        };
        let name = modifier_name(sc)?;
        let value = simple_value(sc)?;
        Ok(Flow::Emit(PacketEvent::Routing { oper, name, value }))
    }

    fn length<'a>(&mut self, sc: &mut Scanner<'a>) -> Result<Flow<'a>, Halt<ParseError>> {
        let at = sc.pos();
        let content_len = match sc.digits()? {
            Digits::Absent => match sc.byte()? {
                b'\n' => None,
                b'|' => return Ok(Flow::Enter(Part::End)),
                _ => return fail(ParseError::InvalidLength { at }),
            },
            Digits::Value(len) => {
                if sc.byte()? != b'\n' {
                    return fail(ParseError::InvalidLength { at: sc.pos() });
                }
                Some(len)
            },
            Digits::Overflow => return fail(ParseError::InvalidLength { at }),
        };
        sc.skip(1);
        self.content_len = content_len;
        Ok(Flow::Enter(if self.flags.routing_only() { Part::Data } else { Part::Content }))
    }

    fn content<'a>(&mut self, sc: &mut Scanner<'a>) -> Result<Flow<'a>, Halt<ParseError>> {
        if self.content_len.is_some_and(|len| self.content_parsed >= len) {
            return Ok(Flow::Enter(Part::End));
        }
        let start = sc.pos();
        let glyph = sc.byte()?;
        let Some(oper) = Operator::from_glyph(glyph) else {
            return Ok(Flow::Enter(Part::Method));
        };

        if self.content_parsed == 0 && sc.byte_at(1)? == b'\n' {
            let event = match glyph {
                b'=' => PacketEvent::StateReset,
                b'?' => PacketEvent::StateResync,
                _ => return fail(ParseError::InvalidStateOp { glyph: char::from(glyph), at: start }),
            };
            sc.skip(2);
            self.content_parsed += 2;
            return Ok(Flow::Emit(event));
        }

        let name = modifier_name(sc)?;
        let event = if sc.byte()? == b' ' {
            sc.skip(1);
            let at = sc.pos();
            let len = match sc.digits()? {
                Digits::Value(len) => len,
                Digits::Absent | Digits::Overflow => {
                    return fail(ParseError::InvalidModifierLength { at });
                },
            };
            if sc.byte()? != b'\t' {
                return fail(ParseError::MissingTab { at: sc.pos() });
            }
            sc.skip(1);
            if let Some(expected) = self.content_len {
                // value LF must fit in the announced content
                let actual = (self.content_parsed + sc.pos() - start).saturating_add(len).saturating_add(1);
                if actual > expected {
                    return fail(ParseError::ContentLength { expected, actual });
                }
            }
            match sc.take(len) {
                Take::Complete(value) => {
                    self.newline = Some(Newline::Modifier);
                    PacketEvent::Entity { oper, name, value }
                },
                Take::Partial(value) => {
                    let remaining = len - value.len();
                    self.pending = Some(Pending { kind: PendingKind::Entity, remaining });
                    PacketEvent::EntityStart { oper, name, value, len }
                },
            }
        } else {
            let value = simple_value(sc)?;
            PacketEvent::Entity { oper, name, value }
        };
        self.content_parsed += sc.pos() - start;
        Ok(Flow::Emit(event))
    }

    fn method<'a>(&mut self, sc: &mut Scanner<'a>) -> Result<Flow<'a>, Halt<ParseError>> {
        let start = sc.pos();
        let method = sc.keyword()?;
        if method.is_empty() {
            return Ok(Flow::Enter(Part::End));
        }
        if sc.byte()? != b'\n' {
            return fail(ParseError::MissingMethodNewline { at: sc.pos() });
        }
        sc.skip(1);

        let event = match self.content_len {
            Some(len) => {
                let parsed = self.content_parsed + (sc.pos() - start);
                let Some(rest) = len.checked_sub(parsed) else {
                    return fail(ParseError::ContentLength { expected: len, actual: parsed });
                };
                if rest == 0 {
                    PacketEvent::Body { method, data: &[] }
                } else {
                    // data LF
                    let data_len = rest - 1;
                    match sc.take(data_len) {
                        Take::Complete(data) => {
                            self.newline = Some(Newline::Body);
                            PacketEvent::Body { method, data }
                        },
                        Take::Partial(data) => {
                            let remaining = data_len - data.len();
                            self.pending = Some(Pending { kind: PendingKind::Body, remaining });
                            PacketEvent::BodyStart { method, data, len: data_len }
                        },
                    }
                }
            },
            None => {
                let (data, skip) = scan_to_delimiter(sc)?;
                sc.skip(skip);
                PacketEvent::Body { method, data }
            },
        };
        self.content_parsed += sc.pos() - start;
        Ok(Flow::EmitAndEnter(event, Part::End))
    }

    fn raw_content<'a>(&mut self, sc: &mut Scanner<'a>) -> Result<Flow<'a>, Halt<ParseError>> {
        let start = sc.pos();
        let event = match self.content_len {
            Some(len) => {
                let rest = len.saturating_sub(self.content_parsed);
                if rest == 0 {
                    return Ok(Flow::Enter(Part::End));
                }
                if sc.at_end() {
                    return Err(sc.need_more().into());
                }
                match sc.take(rest) {
                    Take::Complete(data) => PacketEvent::Content(data),
                    Take::Partial(data) => {
                        let remaining = rest - data.len();
                        self.pending = Some(Pending { kind: PendingKind::Content, remaining });
                        PacketEvent::ContentStart { data, len: rest }
                    },
                }
            },
            None => {
                if sc.rest().starts_with(b"|\n") {
                    return Ok(Flow::Enter(Part::End));
                }
                let Some(offset) = sc.find(b"\n|\n") else {
                    return Err(sc.need_more().into());
                };
                let data = &sc.rest()[..=offset];
                sc.skip(offset + 1);
                PacketEvent::Content(data)
            },
        };
        self.content_parsed += sc.pos() - start;
        Ok(Flow::EmitAndEnter(event, Part::End))
    }

    fn end<'a>(&mut self, sc: &mut Scanner<'a>) -> Result<Flow<'a>, Halt<ParseError>> {
        if let Some(expected) = self.content_len {
            if self.content_parsed != expected {
                return fail(ParseError::ContentLength { expected, actual: self.content_parsed });
            }
        }
        if self.fixed_len.is_none() {
            let at = sc.pos();
            if sc.byte()? != b'|' {
                return fail(ParseError::InvalidDelimiter { at });
            }
            if sc.byte_at(1)? != b'\n' {
                return fail(ParseError::InvalidDelimiter { at: at + 1 });
            }
            sc.skip(2);
        }
        trace!(content_len = self.content_parsed, "packet complete");
        self.start_packet();
        Ok(Flow::Emit(PacketEvent::Complete))
    }
}

/// `glyph keyword`, with the cursor on the glyph. Leaves the cursor after the
/// name.
fn modifier_name<'a>(sc: &mut Scanner<'a>) -> Result<&'a [u8], Halt<ParseError>> {
    let at = sc.pos();
    sc.advance()?;
    let name = sc.keyword()?;
    if name.is_empty() {
        return fail(ParseError::MissingModifierName { at });
    }
    Ok(name)
}

/// `TAB value LF` or a bare `LF`.
fn simple_value<'a>(sc: &mut Scanner<'a>) -> Result<&'a [u8], Halt<ParseError>> {
    let at = sc.pos();
    match sc.byte()? {
        b'\t' => {
            sc.skip(1);
            let value = sc.until(b'\n')?;
            sc.skip(1);
            Ok(value)
        },
        b'\n' => {
            sc.skip(1);
            Ok(&[][..])
        },
        _ => fail(ParseError::MissingTab { at }),
    }
}

/// Data of unknown length, up to the `LF "|" LF` closing the packet. Returns
/// the data and how far to move to land on the `|`.
fn scan_to_delimiter<'a>(sc: &mut Scanner<'a>) -> Result<(&'a [u8], usize), Halt<ParseError>> {
    let rest = sc.rest();
    if rest.starts_with(b"|\n") {
        return Ok((&[][..], 0));
    }
    match sc.find(b"\n|\n") {
        Some(offset) => Ok((&rest[..offset], offset + 1)),
        None => Err(sc.need_more().into()),
    }
}
