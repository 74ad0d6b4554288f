//! Resumable parsers.
//!
//! All parsers share one calling convention: `parse(buf)` returns the next
//! event, or `Insufficient` when `buf` ends inside a unit. The parser keeps a
//! cursor into `buf` between calls. To continue after `Insufficient`, drop
//! the first [`discard_consumed`](PacketParser::discard_consumed) bytes of the
//! buffer, append new input, and call `parse` again with the result.
//!
//! Errors are terminal: the parser resets to its initial state and the caller
//! must drop the rest of the packet or value.

mod dict;
mod index;
mod list;
mod packet;
mod update;

pub use dict::{DictEvent, DictParser};
pub use index::{IndexEvent, IndexParser};
pub use list::{ListEvent, ListParser};
pub use packet::{PacketEvent, PacketParser};
pub use update::{UpdateEvent, UpdateParser};

use crate::{
    Elem, ElemFlag,
    scan::{Digits, Halt, Scanner, Take, fail},
};

/// How an element introduces its type keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TypeIntro {
    /// `"=" type`, in lists and dicts
    Eq,
    /// A bare keyword, in updates
    Bare,
}

/// Failure inside an element head, as an offset. Each parser maps it to its
/// own error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum HeadError {
    Type(usize),
    Length(usize),
}

/// `["=" type] [":" length] [SP]` of an element.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ElemHead<'a> {
    pub(crate) ty: &'a [u8],
    pub(crate) len: Option<usize>,
}

impl<'a> ElemHead<'a> {
    pub(crate) fn elem(&self, value: &'a [u8]) -> Elem<'a> {
        let flag = if self.len.is_some() { ElemFlag::NeedLength } else { ElemFlag::NoLength };
        Elem { ty: self.ty, value, flag }
    }
}

/// Parse an element head, leaving the cursor on the first value byte.
///
/// A length-prefixed head that reaches the end of the buffer before its SP
/// needs more data; any other head may end the buffer.
pub(crate) fn elem_head<'a>(
    sc: &mut Scanner<'a>,
    intro: TypeIntro,
    delim: Option<u8>,
) -> Result<ElemHead<'a>, Halt<HeadError>> {
    let ty = match intro {
        TypeIntro::Eq if sc.peek() == Some(b'=') => {
            sc.skip(1);
            let ty = sc.keyword_to_end();
            if ty.is_empty() {
                return fail(HeadError::Type(sc.pos()));
            }
            ty
        },
        TypeIntro::Eq => &[][..],
        TypeIntro::Bare => sc.keyword_to_end(),
    };

    let len = if sc.peek() == Some(b':') {
        sc.skip(1);
        match sc.digits_to_end() {
            Digits::Value(n) => Some(n),
            Digits::Absent | Digits::Overflow => return fail(HeadError::Length(sc.pos())),
        }
    } else {
        None
    };

    match sc.peek() {
        Some(b' ') => sc.skip(1),
        None if len.is_some_and(|n| n > 0) => return Err(sc.need_more().into()),
        None => {},
        Some(byte) if Some(byte) == delim && len.is_none_or(|n| n == 0) => {},
        Some(_) if intro == TypeIntro::Bare && len.is_none() => {
            return fail(HeadError::Type(sc.pos()));
        },
        Some(_) => return fail(HeadError::Length(sc.pos())),
    }
    Ok(ElemHead { ty, len })
}

/// Value of an element after its head.
#[derive(Debug, Clone, Copy)]
pub(crate) enum ElemBody<'a> {
    /// Followed by the delimiter
    Delimited(&'a [u8]),
    /// Runs to the end of the buffer
    Last(&'a [u8]),
    /// First piece of a length-prefixed value of `len` bytes
    Partial { value: &'a [u8], len: usize },
}

/// Parse an element value. Fails with the offset of bytes trailing a
/// length-prefixed value.
pub(crate) fn elem_body<'a>(
    sc: &mut Scanner<'a>,
    head: &ElemHead<'a>,
    delim: Option<u8>,
) -> Result<ElemBody<'a>, usize> {
    let Some(len) = head.len else {
        let (value, found) = sc.until_or_end(delim);
        return Ok(if found { ElemBody::Delimited(value) } else { ElemBody::Last(value) });
    };
    match sc.take(len) {
        Take::Complete(value) => match sc.peek() {
            None => Ok(ElemBody::Last(value)),
            Some(byte) if Some(byte) == delim => Ok(ElemBody::Delimited(value)),
            Some(_) => Err(sc.pos()),
        },
        Take::Partial(value) => Ok(ElemBody::Partial { value, len }),
    }
}

/// Piece of a length-prefixed value spanning buffers.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Piece<'a> {
    /// More bytes follow; holds the count still missing
    Cont(&'a [u8], usize),
    /// The value is complete
    End(&'a [u8]),
}

/// Continue a length-prefixed value with `remaining` bytes still missing.
pub(crate) fn continue_value<'a, E>(sc: &mut Scanner<'a>, remaining: usize) -> Result<Piece<'a>, Halt<E>> {
    if sc.at_end() {
        return Err(sc.need_more().into());
    }
    Ok(match sc.take(remaining) {
        Take::Complete(piece) => Piece::End(piece),
        Take::Partial(piece) => Piece::Cont(piece, remaining - piece.len()),
    })
}

/// Key of a dict entry or index segment.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Key<'a> {
    Complete(Elem<'a>),
    /// First piece of a length-prefixed key
    Partial { value: &'a [u8], len: usize },
}

/// Parse `[length SP] key` with the cursor after `{`. A complete key leaves
/// the cursor on its closing `}`, or at the end of the buffer when a
/// length-prefixed key fills it exactly. Fails with the offset of an invalid
/// length.
pub(crate) fn dict_key<'a>(sc: &mut Scanner<'a>) -> Result<Key<'a>, Halt<usize>> {
    let at = sc.pos();
    match sc.digits_to_end() {
        Digits::Value(len) => {
            match sc.peek() {
                Some(b' ') => sc.skip(1),
                None => return Err(sc.need_more().into()),
                Some(_) => return fail(sc.pos()),
            }
            Ok(match sc.take(len) {
                Take::Complete(key) => Key::Complete(Elem::new(key).with_flag(ElemFlag::NeedLength)),
                Take::Partial(value) => Key::Partial { value, len },
            })
        },
        Digits::Overflow => fail(at),
        Digits::Absent => {
            let key = sc.until(b'}')?;
            Ok(Key::Complete(Elem::new(key).with_flag(ElemFlag::NoLength)))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head(input: &[u8], intro: TypeIntro, delim: Option<u8>) -> (Result<ElemHead<'_>, Halt<HeadError>>, usize) {
        let mut sc = Scanner::new(input, 0);
        let head = elem_head(&mut sc, intro, delim);
        (head, sc.pos())
    }

    #[test]
    fn heads() {
        let (h, pos) = head(b"=_t:3 abc", TypeIntro::Eq, Some(b'|'));
        let h = h.unwrap();
        assert_eq!((h.ty, h.len, pos), (&b"_t"[..], Some(3), 6));

        let (h, pos) = head(b"|", TypeIntro::Eq, Some(b'|'));
        let h = h.unwrap();
        assert_eq!((h.ty, h.len, pos), (&b""[..], None, 0));

        let (h, _) = head(b"_foo:3 bar", TypeIntro::Bare, None);
        assert_eq!(h.unwrap().ty, b"_foo");
    }

    #[test]
    fn head_errors() {
        assert_eq!(head(b"= x", TypeIntro::Eq, Some(b'|')).0.unwrap_err(), Halt::Fail(HeadError::Type(1)));
        assert_eq!(head(b":x", TypeIntro::Eq, Some(b'|')).0.unwrap_err(), Halt::Fail(HeadError::Length(1)));
        assert_eq!(head(b":3|", TypeIntro::Eq, Some(b'|')).0.unwrap_err(), Halt::Fail(HeadError::Length(2)));
        assert_eq!(head(b"foo", TypeIntro::Eq, Some(b'|')).0.unwrap_err(), Halt::Fail(HeadError::Length(0)));
        assert_eq!(head(b"_t%", TypeIntro::Bare, None).0.unwrap_err(), Halt::Fail(HeadError::Type(2)));
    }

    #[test]
    fn lengthed_head_at_end_needs_more() {
        let (h, pos) = head(b":12", TypeIntro::Eq, Some(b'|'));
        assert_eq!(h.unwrap_err(), Halt::NeedMoreData);
        assert_eq!(pos, 0);
    }

    #[test]
    fn keys() {
        let mut sc = Scanner::new(b"foo}", 0);
        assert!(matches!(dict_key(&mut sc), Ok(Key::Complete(k)) if k.value == b"foo" && !k.has_length()));
        assert_eq!(sc.peek(), Some(b'}'));

        let mut sc = Scanner::new(b"4 a}{b}", 0);
        assert!(matches!(dict_key(&mut sc), Ok(Key::Complete(k)) if k.value == b"a}{b" && k.has_length()));

        let mut sc = Scanner::new(b"10 abc", 0);
        assert!(matches!(dict_key(&mut sc), Ok(Key::Partial { value: b"abc", len: 10 })));

        let mut sc = Scanner::new(b"1x}", 0);
        assert!(matches!(dict_key(&mut sc), Err(Halt::Fail(1))));
    }
}
