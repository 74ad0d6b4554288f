//! List values: `[type] ("|" ["=" type] [":" length] [SP value])*`.

use tracing::{debug, trace};

use crate::{
    Elem, ListError,
    parse::{ElemBody, HeadError, Piece, TypeIntro, continue_value, elem_body, elem_head},
    scan::{Halt, Scanner, fail},
};

/// One unit of a list value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEvent<'a> {
    /// The buffer ends inside a length-prefixed element head
    Insufficient,
    /// Default type of all elements
    Type(&'a [u8]),
    /// Element followed by another
    Elem(Elem<'a>),
    /// Element running to the end of the buffer
    ElemLast(Elem<'a>),
    /// First piece of a length-prefixed element larger than the buffer
    ElemStart {
        /// Element type, empty for the default type
        ty: &'a [u8],
        /// Bytes available so far
        value: &'a [u8],
        /// Announced length of the whole value
        len: usize,
    },
    /// Middle piece of a length-prefixed element
    ElemCont(&'a [u8]),
    /// Last piece of a length-prefixed element
    ElemEnd(&'a [u8]),
    /// No more elements in the buffer
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Type,
    Elems,
    /// Inside a length-prefixed element, this many bytes missing
    Cont(usize),
}

/// Resumable list value parser.
#[derive(Debug, Clone)]
pub struct ListParser {
    part: Part,
    cursor: usize,
}

impl Default for ListParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ListParser {
    /// Create a parser at the start of a list value.
    pub fn new() -> Self {
        Self { part: Part::Type, cursor: 0 }
    }

    /// Offset of the next unit in the current buffer
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of leading bytes the caller may drop from the buffer. The
    /// cursor restarts at zero.
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
    /// Any [`ListError`] except `Truncated`. The parser is reset.
    pub fn parse<'a>(&mut self, buf: &'a [u8]) -> Result<ListEvent<'a>, ListError> {
        let mut sc = Scanner::new(buf, self.cursor);
        let step = self.step(&mut sc);
        self.cursor = sc.pos();
        match step {
            Ok(event) => {
                trace!(?event, cursor = self.cursor, "list unit");
                Ok(event)
            },
            Err(Halt::NeedMoreData) => Ok(ListEvent::Insufficient),
            Err(Halt::Fail(error)) => {
                debug!(%error, "list parse failed");
                self.reset();
                Err(error)
            },
        }
    }

    fn step<'a>(&mut self, sc: &mut Scanner<'a>) -> Result<ListEvent<'a>, Halt<ListError>> {
        sc.set_mark();
        match self.part {
            Part::Type => {
                self.part = Part::Elems;
                let ty = sc.keyword_to_end();
                if ty.is_empty() { self.elem(sc) } else { Ok(ListEvent::Type(ty)) }
            },
            Part::Elems => self.elem(sc),
            Part::Cont(remaining) => match continue_value(sc, remaining)? {
                Piece::Cont(piece, remaining) => {
                    self.part = Part::Cont(remaining);
                    Ok(ListEvent::ElemCont(piece))
                },
                Piece::End(piece) => {
                    self.part = Part::Elems;
                    match sc.peek() {
                        Some(byte) if byte != b'|' => fail(ListError::ElemEnd { at: sc.pos() }),
                        _ => Ok(ListEvent::ElemEnd(piece)),
                    }
                },
            },
        }
    }

    fn elem<'a>(&mut self, sc: &mut Scanner<'a>) -> Result<ListEvent<'a>, Halt<ListError>> {
        match sc.peek() {
            None => return Ok(ListEvent::End),
            Some(b'|') => sc.skip(1),
            Some(_) => return fail(ListError::ElemStart { at: sc.pos() }),
        }
        let head = elem_head(sc, TypeIntro::Eq, Some(b'|')).map_err(|halt| halt.map(head_error))?;
        match elem_body(sc, &head, Some(b'|')) {
            Ok(ElemBody::Delimited(value)) => Ok(ListEvent::Elem(head.elem(value))),
            Ok(ElemBody::Last(value)) => Ok(ListEvent::ElemLast(head.elem(value))),
            Ok(ElemBody::Partial { value, len }) => {
                self.part = Part::Cont(len - value.len());
                Ok(ListEvent::ElemStart { ty: head.ty, value, len })
            },
            Err(at) => fail(ListError::ElemEnd { at }),
        }
    }
}

fn head_error(error: HeadError) -> ListError {
    match error {
        HeadError::Type(at) => ListError::ElemType { at },
        HeadError::Length(at) => ListError::ElemLength { at },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ElemFlag;

    fn events(input: &[u8]) -> Result<Vec<ListEvent<'_>>, ListError> {
        let mut parser = ListParser::new();
        let mut out = Vec::new();
        loop {
            let event = parser.parse(input)?;
            out.push(event);
            if matches!(event, ListEvent::End | ListEvent::Insufficient) {
                return Ok(out);
            }
        }
    }

    fn plain(value: &[u8]) -> Elem<'_> {
        Elem { ty: b"", value, flag: ElemFlag::NoLength }
    }

    #[test]
    fn simple_elements() {
        assert_eq!(
            events(b"| foo| bar| baz").unwrap(),
            vec![
                ListEvent::Elem(plain(b"foo")),
                ListEvent::Elem(plain(b"bar")),
                ListEvent::ElemLast(plain(b"baz")),
                ListEvent::End,
            ]
        );
    }

    #[test]
    fn default_type_and_typed_elements() {
        assert_eq!(
            events(b"_nick|=_nick_place:3 a|b|").unwrap(),
            vec![
                ListEvent::Type(b"_nick"),
                ListEvent::Elem(Elem { ty: b"_nick_place", value: b"a|b", flag: ElemFlag::NeedLength }),
                ListEvent::ElemLast(plain(b"")),
                ListEvent::End,
            ]
        );
    }

    #[test]
    fn empty_list() {
        assert_eq!(events(b"").unwrap(), vec![ListEvent::End]);
    }

    #[test]
    fn element_split_across_buffers() {
        let mut parser = ListParser::new();
        assert_eq!(
            parser.parse(b"|:6 ab").unwrap(),
            ListEvent::ElemStart { ty: b"", value: b"ab", len: 6 }
        );
        assert_eq!(parser.discard_consumed(), 6);
        assert_eq!(parser.parse(b"|c").unwrap(), ListEvent::ElemCont(b"|c"));
        assert_eq!(parser.discard_consumed(), 2);
        assert_eq!(parser.parse(b"de| x").unwrap(), ListEvent::ElemEnd(b"de"));
        assert_eq!(parser.parse(b"de| x").unwrap(), ListEvent::ElemLast(plain(b"x")));
        assert_eq!(parser.parse(b"de| x").unwrap(), ListEvent::End);
    }

    #[test]
    fn split_length_is_insufficient() {
        let mut parser = ListParser::new();
        assert_eq!(parser.parse(b"| a|:1").unwrap(), ListEvent::Elem(plain(b"a")));
        assert_eq!(parser.parse(b"| a|:1").unwrap(), ListEvent::Insufficient);
        assert_eq!(parser.cursor(), 3);
    }

    #[test]
    fn errors() {
        assert_eq!(events(b"%"), Err(ListError::ElemStart { at: 0 }));
        assert_eq!(events(b"|=%"), Err(ListError::ElemType { at: 2 }));
        assert_eq!(events(b"|:x"), Err(ListError::ElemLength { at: 2 }));
        assert_eq!(events(b"|foo"), Err(ListError::ElemLength { at: 1 }));
        assert_eq!(events(b"|:2 abc|"), Err(ListError::ElemEnd { at: 6 }));
    }

    #[test]
    fn error_resets_parser() {
        let mut parser = ListParser::new();
        assert!(parser.parse(b"%").is_err());
        assert_eq!(parser.cursor(), 0);
        assert_eq!(parser.parse(b"| ok").unwrap(), ListEvent::ElemLast(plain(b"ok")));
    }
}
