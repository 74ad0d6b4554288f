//! Index paths: `("#" decimal | "." keyword | "{" [decimal SP] key "}")*`.

use tracing::{debug, trace};

use crate::{
    IndexError, IndexSegment,
    parse::{Key, Piece, continue_value, dict_key},
    scan::{Digits, Halt, Scanner, fail},
};

/// One unit of an index path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexEvent<'a> {
    /// The buffer ends inside a dict key
    Insufficient,
    /// Complete segment
    Segment(IndexSegment<'a>),
    /// First piece of a length-prefixed dict key larger than the buffer
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
    /// End of the path
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Segment,
    KeyCont(usize),
    /// Closing `}` of a key delivered in pieces
    Close,
}

/// Resumable index path parser.
#[derive(Debug, Clone)]
pub struct IndexParser {
    part: Part,
    cursor: usize,
    /// Stop at the first byte that starts no segment instead of failing
    embedded: bool,
}

impl Default for IndexParser {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexParser {
    /// Create a parser for a standalone path.
    pub fn new() -> Self {
        Self { part: Part::Segment, cursor: 0, embedded: false }
    }

    /// Create a parser for a path followed by more syntax.
    pub(crate) fn embedded() -> Self {
        Self { embedded: true, ..Self::new() }
    }

    /// Offset of the next unit in the current buffer
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of leading bytes the caller may drop from the buffer.
    pub fn discard_consumed(&mut self) -> usize {
        std::mem::take(&mut self.cursor)
    }

    /// Start over with a new path.
    pub fn reset(&mut self) {
        self.part = Part::Segment;
        self.cursor = 0;
    }

    /// Parse the next unit of `buf`.
    ///
    /// # Errors
    ///
    /// Any [`IndexError`] except `Truncated`. The parser is reset.
    pub fn parse<'a>(&mut self, buf: &'a [u8]) -> Result<IndexEvent<'a>, IndexError> {
        let mut sc = Scanner::new(buf, self.cursor);
        let step = self.step(&mut sc);
        self.cursor = sc.pos();
        match step {
            Ok(event) => {
                trace!(?event, cursor = self.cursor, "index unit");
                Ok(event)
            },
            Err(Halt::NeedMoreData) => Ok(IndexEvent::Insufficient),
            Err(Halt::Fail(error)) => {
                debug!(%error, "index parse failed");
                self.reset();
                Err(error)
            },
        }
    }

    pub(crate) fn step<'a>(&mut self, sc: &mut Scanner<'a>) -> Result<IndexEvent<'a>, Halt<IndexError>> {
        sc.set_mark();
        match self.part {
            Part::Segment => self.segment(sc),
            Part::KeyCont(remaining) => Ok(match continue_value(sc, remaining)? {
                Piece::Cont(piece, remaining) => {
                    self.part = Part::KeyCont(remaining);
                    IndexEvent::DictKeyCont(piece)
                },
                Piece::End(piece) => {
                    self.part = Part::Close;
                    IndexEvent::DictKeyEnd(piece)
                },
            }),
            Part::Close => {
                close_key(sc)?;
                self.part = Part::Segment;
                sc.set_mark();
                self.segment(sc)
            },
        }
    }

    fn segment<'a>(&mut self, sc: &mut Scanner<'a>) -> Result<IndexEvent<'a>, Halt<IndexError>> {
        let at = sc.pos();
        let segment = match sc.peek() {
            None => return Ok(IndexEvent::End),
            Some(b'#') => {
                sc.skip(1);
                match sc.digits_to_end() {
                    Digits::Value(n) => IndexSegment::List(n),
                    Digits::Absent | Digits::Overflow => {
                        return fail(IndexError::ListIndex { at: sc.pos() });
                    },
                }
            },
            Some(b'.') => {
                sc.skip(1);
                let field = sc.keyword_to_end();
                let field = field.strip_prefix(b"_").unwrap_or(field);
                if field.is_empty() {
                    return fail(IndexError::StructField { at: at + 1 });
                }
                IndexSegment::Struct(field)
            },
            Some(b'{') => {
                sc.skip(1);
                match dict_key(sc).map_err(|halt| halt.map(|at| IndexError::DictKeyLength { at }))? {
                    Key::Complete(key) => {
                        close_key(sc)?;
                        IndexSegment::Dict { key: key.value, flag: key.flag }
                    },
                    Key::Partial { value, len } => {
                        self.part = Part::KeyCont(len - value.len());
                        return Ok(IndexEvent::DictKeyStart { value, len });
                    },
                }
            },
            Some(_) if self.embedded => return Ok(IndexEvent::End),
            Some(_) => return fail(IndexError::Segment { at }),
        };
        Ok(IndexEvent::Segment(segment))
    }
}

fn close_key(sc: &mut Scanner<'_>) -> Result<(), Halt<IndexError>> {
    match sc.peek() {
        Some(b'}') => {
            sc.skip(1);
            Ok(())
        },
        None => Err(sc.need_more().into()),
        Some(_) => fail(IndexError::DictKeyEnd { at: sc.pos() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ElemFlag;

    fn segments(input: &[u8]) -> Result<Vec<IndexEvent<'_>>, IndexError> {
        let mut parser = IndexParser::new();
        let mut out = Vec::new();
        loop {
            let event = parser.parse(input)?;
            out.push(event);
            if matches!(event, IndexEvent::End | IndexEvent::Insufficient) {
                return Ok(out);
            }
        }
    }

    #[test]
    fn all_segment_kinds() {
        assert_eq!(
            segments(b"#1{foo}._bar{3 }}}}#20").unwrap(),
            vec![
                IndexEvent::Segment(IndexSegment::List(1)),
                IndexEvent::Segment(IndexSegment::Dict { key: b"foo", flag: ElemFlag::NoLength }),
                IndexEvent::Segment(IndexSegment::Struct(b"bar")),
                IndexEvent::Segment(IndexSegment::Dict { key: b"}}}", flag: ElemFlag::NeedLength }),
                IndexEvent::Segment(IndexSegment::List(20)),
                IndexEvent::End,
            ]
        );
    }

    #[test]
    fn embedded_path_stops_at_operator() {
        let mut parser = IndexParser::embedded();
        assert_eq!(parser.parse(b"#3 =x").unwrap(), IndexEvent::Segment(IndexSegment::List(3)));
        assert_eq!(parser.parse(b"#3 =x").unwrap(), IndexEvent::End);
        assert_eq!(parser.cursor(), 2);
    }

    #[test]
    fn key_split_across_buffers() {
        let mut parser = IndexParser::new();
        assert_eq!(parser.parse(b"{5 ab").unwrap(), IndexEvent::DictKeyStart { value: b"ab", len: 5 });
        parser.discard_consumed();
        assert_eq!(parser.parse(b"cde").unwrap(), IndexEvent::DictKeyEnd(b"cde"));
        parser.discard_consumed();
        assert_eq!(parser.parse(b"").unwrap(), IndexEvent::Insufficient);
        assert_eq!(parser.parse(b"}#0").unwrap(), IndexEvent::Segment(IndexSegment::List(0)));
    }

    #[test]
    fn errors() {
        assert_eq!(segments(b"x"), Err(IndexError::Segment { at: 0 }));
        assert_eq!(segments(b"#x"), Err(IndexError::ListIndex { at: 1 }));
        assert_eq!(segments(b"._"), Err(IndexError::StructField { at: 1 }));
        assert_eq!(segments(b"{2x}"), Err(IndexError::DictKeyLength { at: 2 }));
        assert_eq!(segments(b"{1 ab}"), Err(IndexError::DictKeyEnd { at: 4 }));
        assert_eq!(segments(b"{foo").unwrap(), vec![IndexEvent::Insufficient]);
    }
}
