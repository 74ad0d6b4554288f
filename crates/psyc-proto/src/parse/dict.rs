//! Dict values: `[type] ("{" [length SP] key "}" ["=" type] [":" length] [SP value])*`.

use tracing::{debug, trace};

use crate::{
    DictError, Elem,
    parse::{
        ElemBody, HeadError, Key, Piece, TypeIntro, continue_value, dict_key, elem_body, elem_head,
    },
    scan::{Halt, Scanner, fail},
};

/// One unit of a dict value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DictEvent<'a> {
    /// The buffer ends inside a key or a length-prefixed value head
    Insufficient,
    /// Default type of all values
    Type(&'a [u8]),
    /// Complete key
    Key(Elem<'a>),
    /// First piece of a length-prefixed key larger than the buffer
    KeyStart {
        /// Bytes available so far
        value: &'a [u8],
        /// Announced length of the key
        len: usize,
    },
    /// Middle piece of a length-prefixed key
    KeyCont(&'a [u8]),
    /// Last piece of a length-prefixed key
    KeyEnd(&'a [u8]),
    /// Value followed by another entry
    Value(Elem<'a>),
    /// Value running to the end of the buffer
    ValueLast(Elem<'a>),
    /// First piece of a length-prefixed value larger than the buffer
    ValueStart {
        /// Value type, empty for the default type
        ty: &'a [u8],
        /// Bytes available so far
        value: &'a [u8],
        /// Announced length of the value
        len: usize,
    },
    /// Middle piece of a length-prefixed value
    ValueCont(&'a [u8]),
    /// Last piece of a length-prefixed value
    ValueEnd(&'a [u8]),
    /// No more entries in the buffer
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Type,
    Key,
    KeyCont(usize),
    Value,
    ValueCont(usize),
}

/// Resumable dict value parser.
#[derive(Debug, Clone)]
pub struct DictParser {
    part: Part,
    cursor: usize,
}

impl Default for DictParser {
    fn default() -> Self {
        Self::new()
    }
}

impl DictParser {
    /// Create a parser at the start of a dict value.
    pub fn new() -> Self {
        Self { part: Part::Type, cursor: 0 }
    }

    /// Offset of the next unit in the current buffer
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of leading bytes the caller may drop from the buffer.
    pub fn discard_consumed(&mut self) -> usize {
        std::mem::take(&mut self.cursor)
    }

    /// Start over with a new value.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Parse the next unit of `buf`.
    ///
    /// # Errors
    ///
    /// Any [`DictError`] except `Truncated`. The parser is reset.
    pub fn parse<'a>(&mut self, buf: &'a [u8]) -> Result<DictEvent<'a>, DictError> {
        let mut sc = Scanner::new(buf, self.cursor);
        let step = self.step(&mut sc);
        self.cursor = sc.pos();
        match step {
            Ok(event) => {
                trace!(?event, cursor = self.cursor, "dict unit");
                Ok(event)
            },
            Err(Halt::NeedMoreData) => Ok(DictEvent::Insufficient),
            Err(Halt::Fail(error)) => {
                debug!(%error, "dict parse failed");
                self.reset();
                Err(error)
            },
        }
    }

    fn step<'a>(&mut self, sc: &mut Scanner<'a>) -> Result<DictEvent<'a>, Halt<DictError>> {
        sc.set_mark();
        match self.part {
            Part::Type => {
                self.part = Part::Key;
                let ty = sc.keyword_to_end();
                if ty.is_empty() { self.key(sc) } else { Ok(DictEvent::Type(ty)) }
            },
            Part::Key => self.key(sc),
            Part::KeyCont(remaining) => Ok(match continue_value(sc, remaining)? {
                Piece::Cont(piece, remaining) => {
                    self.part = Part::KeyCont(remaining);
                    DictEvent::KeyCont(piece)
                },
                Piece::End(piece) => {
                    self.part = Part::Value;
                    DictEvent::KeyEnd(piece)
                },
            }),
            Part::Value => self.value(sc),
            Part::ValueCont(remaining) => match continue_value(sc, remaining)? {
                Piece::Cont(piece, remaining) => {
                    self.part = Part::ValueCont(remaining);
                    Ok(DictEvent::ValueCont(piece))
                },
                Piece::End(piece) => {
                    self.part = Part::Key;
                    match sc.peek() {
                        Some(byte) if byte != b'{' => fail(DictError::ValueEnd { at: sc.pos() }),
                        _ => Ok(DictEvent::ValueEnd(piece)),
                    }
                },
            },
        }
    }

    fn key<'a>(&mut self, sc: &mut Scanner<'a>) -> Result<DictEvent<'a>, Halt<DictError>> {
        match sc.peek() {
            None => return Ok(DictEvent::End),
            Some(b'{') => sc.skip(1),
            Some(_) => return fail(DictError::KeyStart { at: sc.pos() }),
        }
        match dict_key(sc).map_err(|halt| halt.map(|at| DictError::KeyLength { at }))? {
            Key::Complete(key) => {
                self.part = Part::Value;
                Ok(DictEvent::Key(key))
            },
            Key::Partial { value, len } => {
                self.part = Part::KeyCont(len - value.len());
                Ok(DictEvent::KeyStart { value, len })
            },
        }
    }

    /// Value after a key, starting at the key's closing `}`.
    fn value<'a>(&mut self, sc: &mut Scanner<'a>) -> Result<DictEvent<'a>, Halt<DictError>> {
        match sc.peek() {
            Some(b'}') => sc.skip(1),
            None => return Err(sc.need_more().into()),
            Some(_) => return fail(DictError::KeyEnd { at: sc.pos() }),
        }
        let head = elem_head(sc, TypeIntro::Eq, Some(b'{')).map_err(|halt| halt.map(head_error))?;
        self.part = Part::Key;
        match elem_body(sc, &head, Some(b'{')) {
            Ok(ElemBody::Delimited(value)) => Ok(DictEvent::Value(head.elem(value))),
            Ok(ElemBody::Last(value)) => Ok(DictEvent::ValueLast(head.elem(value))),
            Ok(ElemBody::Partial { value, len }) => {
                self.part = Part::ValueCont(len - value.len());
                Ok(DictEvent::ValueStart { ty: head.ty, value, len })
            },
            Err(at) => fail(DictError::ValueEnd { at }),
        }
    }
}

fn head_error(error: HeadError) -> DictError {
    match error {
        HeadError::Type(at) => DictError::ValueType { at },
        HeadError::Length(at) => DictError::ValueLength { at },
    }
}
