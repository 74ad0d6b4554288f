//! Index paths into structured values and update operations.

use crate::{
    IndexError, IndexEvent, IndexParser, Limits, Operator, RenderError, Result, UpdateError,
    UpdateEvent, UpdateParser,
    model::{Elem, ElemFlag, list::key_needs_length, needs_length},
    scan::{is_keyword, num_len},
};

/// One step of an index path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexSegment<'a> {
    /// `#n`, element `n` of a list
    List(usize),
    /// `._name`, field `name` of a struct
    Struct(&'a [u8]),
    /// `{key}`, entry `key` of a dict
    Dict {
        /// Entry key
        key: &'a [u8],
        /// Length flag of the key
        flag: ElemFlag,
    },
}

impl<'a> IndexSegment<'a> {
    /// Dict segment whose length flag is decided at build time.
    pub fn dict(key: &'a [u8]) -> Self {
        Self::Dict { key, flag: ElemFlag::Check }
    }

    pub(crate) fn wire_len(&self) -> usize {
        match *self {
            Self::List(n) => 1 + num_len(n),
            Self::Struct(name) => 2 + name.len(),
            Self::Dict { key, flag } => {
                let mut len = 2 + key.len();
                if flag == ElemFlag::NeedLength && !key.is_empty() {
                    len += num_len(key.len()) + 1;
                }
                len
            },
        }
    }
}

/// A path of segments, read left to right.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexPath<'a> {
    segments: Vec<IndexSegment<'a>>,
    len: usize,
}

impl<'a> IndexPath<'a> {
    /// Build a path with default limits.
    pub fn new(segments: Vec<IndexSegment<'a>>) -> Result<Self> {
        Self::build(segments, &Limits::default())
    }

    /// Build a path, checking struct field names and fixing key flags.
    pub fn build(mut segments: Vec<IndexSegment<'a>>, limits: &Limits) -> Result<Self> {
        for segment in &mut segments {
            match segment {
                IndexSegment::List(_) => {},
                IndexSegment::Struct(name) => {
                    if !is_keyword(name) {
                        return Err(RenderError::invalid_keyword(name));
                    }
                },
                IndexSegment::Dict { key, flag } => {
                    if *flag == ElemFlag::Check {
                        *flag = if key_needs_length(key, limits) {
                            ElemFlag::NeedLength
                        } else {
                            ElemFlag::NoLength
                        };
                    }
                },
            }
        }
        Ok(Self::with_resolved(segments))
    }

    fn with_resolved(segments: Vec<IndexSegment<'a>>) -> Self {
        let len = segments.iter().map(IndexSegment::wire_len).sum();
        Self { segments, len }
    }

    /// Parse a complete index path.
    ///
    /// # Errors
    ///
    /// Any [`IndexError`]; [`IndexError::Truncated`] when the path ends
    /// inside a dict key.
    pub fn parse(path: &'a [u8]) -> std::result::Result<Self, IndexError> {
        let mut parser = IndexParser::new();
        let mut segments = Vec::new();
        loop {
            match parser.parse(path)? {
                IndexEvent::Segment(segment) => segments.push(segment),
                IndexEvent::End => break,
                IndexEvent::Insufficient
                | IndexEvent::DictKeyStart { .. }
                | IndexEvent::DictKeyCont(_)
                | IndexEvent::DictKeyEnd(_) => return Err(IndexError::Truncated),
            }
        }
        Ok(Self::with_resolved(segments))
    }

    /// Segments in order
    pub fn segments(&self) -> &[IndexSegment<'a>] {
        &self.segments
    }

    /// Check if the path has no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Rendered size in bytes
    pub fn wire_len(&self) -> usize {
        self.len
    }
}

/// An update operation: `path SP operator [type [":" length]] [SP value]`.
///
/// The value's type is written bare, without the `=` of list elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update<'a> {
    path: IndexPath<'a>,
    oper: Operator,
    value: Elem<'a>,
    len: usize,
}

impl<'a> Update<'a> {
    /// Build an update with default limits.
    pub fn new(path: IndexPath<'a>, oper: Operator, value: Elem<'a>) -> Result<Self> {
        Self::build(path, oper, value, &Limits::default())
    }

    /// Build an update, fixing the value's length flag.
    pub fn build(path: IndexPath<'a>, oper: Operator, mut value: Elem<'a>, limits: &Limits) -> Result<Self> {
        value.validate_type()?;
        if value.flag == ElemFlag::Check {
            value.flag = if needs_length(value.value, limits.elem_threshold, None) {
                ElemFlag::NeedLength
            } else {
                ElemFlag::NoLength
            };
        }
        Ok(Self::with_resolved(path, oper, value))
    }

    fn with_resolved(path: IndexPath<'a>, oper: Operator, value: Elem<'a>) -> Self {
        let mut len = path.wire_len() + 1 + value.ty.len();
        if !path.is_empty() {
            len += 1;
        }
        if value.writes_length() {
            len += 1 + num_len(value.value.len());
        }
        if !value.value.is_empty() {
            len += 1 + value.value.len();
        }
        Self { path, oper, value, len }
    }

    /// Parse a complete update value.
    ///
    /// # Errors
    ///
    /// Any [`UpdateError`]; [`UpdateError::Truncated`] when the value ends
    /// inside the path, before the operator or inside a length-prefixed value.
    pub fn parse(update: &'a [u8]) -> std::result::Result<Self, UpdateError> {
        let mut parser = UpdateParser::new();
        let mut segments = Vec::new();
        let mut oper = None;
        let mut value = None;
        loop {
            match parser.parse(update)? {
                UpdateEvent::Segment(segment) => segments.push(segment),
                UpdateEvent::Operator(o) => oper = Some(o),
                UpdateEvent::Value(v) => value = Some(v),
                UpdateEvent::End => break,
                UpdateEvent::Insufficient
                | UpdateEvent::DictKeyStart { .. }
                | UpdateEvent::DictKeyCont(_)
                | UpdateEvent::DictKeyEnd(_)
                | UpdateEvent::ValueStart { .. }
                | UpdateEvent::ValueCont(_)
                | UpdateEvent::ValueEnd(_) => return Err(UpdateError::Truncated),
            }
        }
        let (Some(oper), Some(value)) = (oper, value) else {
            return Err(UpdateError::Truncated);
        };
        Ok(Self::with_resolved(IndexPath::with_resolved(segments), oper, value))
    }

    /// Path to the updated element
    pub fn path(&self) -> &IndexPath<'a> {
        &self.path
    }

    /// Operator applied at the path
    pub fn oper(&self) -> Operator {
        self.oper
    }

    /// Type keyword, empty when absent
    pub fn ty(&self) -> &'a [u8] {
        self.value.ty
    }

    /// Operand
    pub fn value(&self) -> &Elem<'a> {
        &self.value
    }

    /// Rendered size in bytes
    pub fn wire_len(&self) -> usize {
        self.len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_lengths() {
        assert_eq!(IndexSegment::List(0).wire_len(), 2);
        assert_eq!(IndexSegment::List(12).wire_len(), 3);
        assert_eq!(IndexSegment::Struct(b"bar").wire_len(), 5);
        assert_eq!(IndexSegment::Dict { key: b"foo", flag: ElemFlag::NoLength }.wire_len(), 5);
        assert_eq!(IndexSegment::Dict { key: b"1}", flag: ElemFlag::NeedLength }.wire_len(), 6);
    }

    #[test]
    fn build_checks_fields_and_keys() {
        assert!(matches!(
            IndexPath::new(vec![IndexSegment::Struct(b"")]),
            Err(RenderError::InvalidKeyword(_))
        ));

        let path = IndexPath::new(vec![IndexSegment::dict(b"9lives"), IndexSegment::dict(b"cat")]).unwrap();
        assert_eq!(
            path.segments(),
            &[
                IndexSegment::Dict { key: b"9lives", flag: ElemFlag::NeedLength },
                IndexSegment::Dict { key: b"cat", flag: ElemFlag::NoLength },
            ]
        );
    }

    #[test]
    fn update_len_without_path() {
        let update = Update::new(IndexPath::default(), Operator::Query, Elem::new(b"")).unwrap();
        assert_eq!(update.wire_len(), 1);
    }
}
