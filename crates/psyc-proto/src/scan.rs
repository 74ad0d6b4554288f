//! Byte scanners shared by all parsers.
//!
//! A [`Scanner`] walks a borrowed buffer with a cursor and a unit mark. The
//! mark is the start of the grammar unit being parsed; every scan that runs
//! off the end of the buffer rewinds the cursor to the mark and returns
//! [`NeedMoreData`], so parsers can propagate it with `?` and leave their
//! cursor where the caller must resume.
//!
//! Nested values are self-contained, so their parsers also need scans where
//! the end of the buffer simply ends the token. Those are the `*_to_end`
//! variants; they never rewind.

use memchr::{memchr, memmem};

/// The buffer ended inside the current unit.
///
/// Only returned after the scanner rewound to the unit mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NeedMoreData;

/// Result of a scan that may run out of input.
pub(crate) type Step<T = ()> = Result<T, NeedMoreData>;

/// Why a parser step stopped without producing a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Halt<E> {
    NeedMoreData,
    Fail(E),
}

impl<E> From<NeedMoreData> for Halt<E> {
    fn from(_: NeedMoreData) -> Self {
        Self::NeedMoreData
    }
}

impl<E> Halt<E> {
    pub(crate) fn map<F>(self, f: impl FnOnce(E) -> F) -> Halt<F> {
        match self {
            Self::NeedMoreData => Halt::NeedMoreData,
            Self::Fail(e) => Halt::Fail(f(e)),
        }
    }
}

/// Shorthand for failing a parser step.
pub(crate) fn fail<T, E>(error: E) -> Result<T, Halt<E>> {
    Err(Halt::Fail(error))
}

/// Outcome of a decimal scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Digits {
    /// No digit under the cursor
    Absent,
    Value(usize),
    /// More digits than fit in `usize`
    Overflow,
}

/// Outcome of a fixed-length take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Take<'a> {
    Complete(&'a [u8]),
    /// The buffer ended first; holds everything that was available
    Partial(&'a [u8]),
}

pub(crate) fn is_keyword_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// Check if `bytes` is a non-empty keyword.
pub(crate) fn is_keyword(bytes: &[u8]) -> bool {
    !bytes.is_empty() && bytes.iter().all(|&b| is_keyword_char(b))
}

/// Number of decimal digits in `n`.
pub(crate) fn num_len(n: usize) -> usize {
    n.checked_ilog10().map_or(1, |digits| digits as usize + 1)
}

#[derive(Debug)]
pub(crate) struct Scanner<'a> {
    buf: &'a [u8],
    pos: usize,
    mark: usize,
}

impl<'a> Scanner<'a> {
    pub(crate) fn new(buf: &'a [u8], pos: usize) -> Self {
        let pos = pos.min(buf.len());
        Self { buf, pos, mark: pos }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    /// Start a new unit at the cursor.
    pub(crate) fn set_mark(&mut self) {
        self.mark = self.pos;
    }

    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub(crate) fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn rewind(&mut self) -> NeedMoreData {
        self.pos = self.mark;
        NeedMoreData
    }

    /// Give up on the current unit.
    pub(crate) fn need_more(&mut self) -> NeedMoreData {
        self.rewind()
    }

    /// Byte under the cursor.
    pub(crate) fn byte(&mut self) -> Step<u8> {
        self.byte_at(0)
    }

    /// Byte `offset` positions after the cursor.
    pub(crate) fn byte_at(&mut self, offset: usize) -> Step<u8> {
        match self.buf.get(self.pos + offset) {
            Some(&byte) => Ok(byte),
            None => Err(self.rewind()),
        }
    }

    /// Move past the current byte. Something must follow it: landing on the
    /// end of the buffer rewinds.
    pub(crate) fn advance(&mut self) -> Step {
        self.pos += 1;
        if self.pos >= self.buf.len() { Err(self.rewind()) } else { Ok(()) }
    }

    /// Move past `n` bytes already inspected by the caller.
    pub(crate) fn skip(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.buf.len());
    }

    /// Scan a keyword that must be terminated inside the buffer. Empty when no
    /// keyword character is under the cursor.
    pub(crate) fn keyword(&mut self) -> Step<&'a [u8]> {
        let start = self.pos;
        while is_keyword_char(self.byte()?) {
            self.pos += 1;
        }
        Ok(&self.buf[start..self.pos])
    }

    /// Scan a keyword that may run to the end of the buffer.
    pub(crate) fn keyword_to_end(&mut self) -> &'a [u8] {
        let start = self.pos;
        while self.peek().is_some_and(is_keyword_char) {
            self.pos += 1;
        }
        &self.buf[start..self.pos]
    }

    /// Scan a decimal number that must be terminated inside the buffer.
    pub(crate) fn digits(&mut self) -> Step<Digits> {
        let start = self.pos;
        let mut value: Option<usize> = Some(0);
        loop {
            let byte = self.byte()?;
            if !byte.is_ascii_digit() {
                break;
            }
            value = value
                .and_then(|v| v.checked_mul(10))
                .and_then(|v| v.checked_add(usize::from(byte - b'0')));
            self.pos += 1;
        }
        Ok(match value {
            _ if self.pos == start => Digits::Absent,
            Some(n) => Digits::Value(n),
            None => Digits::Overflow,
        })
    }

    /// Scan a decimal number that may run to the end of the buffer.
    pub(crate) fn digits_to_end(&mut self) -> Digits {
        let start = self.pos;
        let mut value: Option<usize> = Some(0);
        while let Some(byte) = self.peek().filter(u8::is_ascii_digit) {
            value = value
                .and_then(|v| v.checked_mul(10))
                .and_then(|v| v.checked_add(usize::from(byte - b'0')));
            self.pos += 1;
        }
        match value {
            _ if self.pos == start => Digits::Absent,
            Some(n) => Digits::Value(n),
            None => Digits::Overflow,
        }
    }

    /// Scan up to `delim`, leaving the cursor on it.
    pub(crate) fn until(&mut self, delim: u8) -> Step<&'a [u8]> {
        let start = self.pos;
        match memchr(delim, &self.buf[start..]) {
            Some(offset) => {
                self.pos = start + offset;
                Ok(&self.buf[start..self.pos])
            },
            None => Err(self.rewind()),
        }
    }

    /// Scan up to `delim` or the end of the buffer. The flag tells whether
    /// the delimiter was found; the cursor stays on it.
    pub(crate) fn until_or_end(&mut self, delim: Option<u8>) -> (&'a [u8], bool) {
        let start = self.pos;
        let found = delim.and_then(|d| memchr(d, &self.buf[start..]));
        self.pos = found.map_or(self.buf.len(), |offset| start + offset);
        (&self.buf[start..self.pos], found.is_some())
    }

    /// Offset of `needle` from the cursor, without moving.
    pub(crate) fn find(&self, needle: &[u8]) -> Option<usize> {
        memmem::find(&self.buf[self.pos..], needle)
    }

    /// Bytes from the cursor to the end of the buffer, without moving.
    pub(crate) fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    /// Take up to `want` bytes; fewer when the buffer ends first.
    pub(crate) fn take(&mut self, want: usize) -> Take<'a> {
        let start = self.pos;
        let available = self.buf.len() - start;
        if available >= want {
            self.pos = start + want;
            Take::Complete(&self.buf[start..self.pos])
        } else {
            self.pos = self.buf.len();
            Take::Partial(&self.buf[start..])
        }
    }
}
