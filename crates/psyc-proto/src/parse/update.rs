//! Update values: `index-path [SP] operator [type [":" length]] [SP value]`.

use tracing::{debug, trace};

use crate::{
    Elem, IndexEvent, IndexParser, IndexSegment, Operator, UpdateError,
    parse::{ElemBody, HeadError, Piece, TypeIntro, continue_value, elem_body, elem_head},
    scan::{Halt, Scanner, fail},
};

/// One unit of an update value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateEvent<'a> {
    /// The buffer ends inside the path, before the operator or inside a
    /// length-prefixed value head
    Insufficient,
    /// Complete path segment
    Segment(IndexSegment<'a>),
    /// First piece of a length-prefixed dict key in the path
    DictKeyStart {
        /// Bytes available so far
        value: &'a [u8],
        /// Announced length of the key
        len: usize,
    },
    /// Middle piece of a length-prefixed dict key
    DictKeyCont(&'a [u8]),
    /// Last piece of a length-prefixed dict key
    DictKeyEnd(&'a [u8]),
    /// The operator after the path
    Operator(Operator),
    /// Complete operand
    Value(Elem<'a>),
    /// First piece of a length-prefixed operand larger than the buffer
    ValueStart {
        /// Operand type, empty when absent
        ty: &'a [u8],
        /// Bytes available so far
        value: &'a [u8],
        /// Announced length of the operand
        len: usize,
    },
    /// Middle piece of a length-prefixed operand
    ValueCont(&'a [u8]),
    /// Last piece of a length-prefixed operand
    ValueEnd(&'a [u8]),
    /// End of the update
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Path,
    Operator,
    Value,
    ValueCont(usize),
    Done,
}

/// Resumable update value parser.
#[derive(Debug, Clone)]
pub struct UpdateParser {
    part: Part,
    cursor: usize,
    path: IndexParser,
}

impl Default for UpdateParser {
    fn default() -> Self {
        Self::new()
    }
}

impl UpdateParser {
    /// Create a parser at the start of an update value.
    pub fn new() -> Self {
        Self { part: Part::Path, cursor: 0, path: IndexParser::embedded() }
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
    /// Any [`UpdateError`] except `Truncated`. The parser is reset.
    pub fn parse<'a>(&mut self, buf: &'a [u8]) -> Result<UpdateEvent<'a>, UpdateError> {
        let mut sc = Scanner::new(buf, self.cursor);
        let step = self.step(&mut sc);
        self.cursor = sc.pos();
        match step {
            Ok(event) => {
                trace!(?event, cursor = self.cursor, "update unit");
                Ok(event)
            },
            Err(Halt::NeedMoreData) => Ok(UpdateEvent::Insufficient),
            Err(Halt::Fail(error)) => {
                debug!(%error, "update parse failed");
                self.reset();
                Err(error)
            },
        }
    }

    fn step<'a>(&mut self, sc: &mut Scanner<'a>) -> Result<UpdateEvent<'a>, Halt<UpdateError>> {
        sc.set_mark();
        match self.part {
            Part::Path => Ok(match self.path.step(sc).map_err(|halt| halt.map(UpdateError::from))? {
                IndexEvent::Segment(segment) => UpdateEvent::Segment(segment),
                IndexEvent::DictKeyStart { value, len } => UpdateEvent::DictKeyStart { value, len },
                IndexEvent::DictKeyCont(piece) => UpdateEvent::DictKeyCont(piece),
                IndexEvent::DictKeyEnd(piece) => UpdateEvent::DictKeyEnd(piece),
                IndexEvent::Insufficient => return Err(Halt::NeedMoreData),
                IndexEvent::End => {
                    self.part = Part::Operator;
                    sc.set_mark();
                    return self.operator(sc);
                },
            }),
            Part::Operator => self.operator(sc),
            Part::Value => self.value(sc),
            Part::ValueCont(remaining) => Ok(match continue_value(sc, remaining)? {
                Piece::Cont(piece, remaining) => {
                    self.part = Part::ValueCont(remaining);
                    UpdateEvent::ValueCont(piece)
                },
                Piece::End(piece) => {
                    self.part = Part::Done;
                    UpdateEvent::ValueEnd(piece)
                },
            }),
            Part::Done if sc.at_end() => Ok(UpdateEvent::End),
            Part::Done => fail(UpdateError::Value { at: sc.pos() }),
        }
    }

    fn operator<'a>(&mut self, sc: &mut Scanner<'a>) -> Result<UpdateEvent<'a>, Halt<UpdateError>> {
        if sc.peek() == Some(b' ') {
            sc.skip(1);
        }
        let at = sc.pos();
        let Some(oper) = Operator::from_glyph(sc.byte()?) else {
            return fail(UpdateError::Operator { at });
        };
        sc.skip(1);
        self.part = Part::Value;
        Ok(UpdateEvent::Operator(oper))
    }

    fn value<'a>(&mut self, sc: &mut Scanner<'a>) -> Result<UpdateEvent<'a>, Halt<UpdateError>> {
        let head = elem_head(sc, TypeIntro::Bare, None).map_err(|halt| halt.map(head_error))?;
        match elem_body(sc, &head, None) {
            Ok(ElemBody::Delimited(value) | ElemBody::Last(value)) => {
                self.part = Part::Done;
                Ok(UpdateEvent::Value(head.elem(value)))
            },
            Ok(ElemBody::Partial { value, len }) => {
                self.part = Part::ValueCont(len - value.len());
                Ok(UpdateEvent::ValueStart { ty: head.ty, value, len })
            },
            Err(at) => fail(UpdateError::Value { at }),
        }
    }
}

fn head_error(error: HeadError) -> UpdateError {
    match error {
        HeadError::Type(at) => UpdateError::Type { at },
        HeadError::Length(at) => UpdateError::Length { at },
    }
}
