//! List and dict values.

use crate::{
    DictError, DictEvent, DictParser, Limits, ListError, ListEvent, ListParser, RenderError,
    Result,
    model::needs_length,
    scan::{is_keyword, num_len},
};

/// Length flag of a list element, dict key or value, or index key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ElemFlag {
    /// Decide when the value is built
    #[default]
    Check,
    /// Render with an explicit length
    NeedLength,
    /// Render without a length
    NoLength,
}

/// One element of a list or dict.
///
/// The parsers report `NeedLength` for elements that carried a length on the
/// wire and `NoLength` for the others.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elem<'a> {
    /// Element type keyword, empty for the default type
    pub ty: &'a [u8],
    /// Raw value
    pub value: &'a [u8],
    /// Length flag
    pub flag: ElemFlag,
}

impl<'a> Elem<'a> {
    /// Create an untyped element.
    pub fn new(value: &'a [u8]) -> Self {
        Self { ty: b"", value, flag: ElemFlag::Check }
    }

    /// Create an element with its own type.
    pub fn typed(ty: &'a [u8], value: &'a [u8]) -> Self {
        Self { ty, value, flag: ElemFlag::Check }
    }

    /// Override the length flag.
    #[must_use]
    pub fn with_flag(mut self, flag: ElemFlag) -> Self {
        self.flag = flag;
        self
    }

    /// Check if the element was or will be sent with an explicit length
    pub fn has_length(&self) -> bool {
        self.flag == ElemFlag::NeedLength
    }

    /// An empty value is never sent with a length.
    pub(crate) fn writes_length(&self) -> bool {
        self.has_length() && !self.value.is_empty()
    }

    /// Rendered size of `["=" type] [":" length] [SP value]`.
    pub(crate) fn wire_len(&self) -> usize {
        let mut len = 0;
        if !self.ty.is_empty() {
            len += 1 + self.ty.len();
        }
        if self.writes_length() {
            len += 1 + num_len(self.value.len());
        }
        if !self.value.is_empty() {
            len += 1 + self.value.len();
        }
        len
    }

    /// Rendered size of `"{" [length SP] key "}"`.
    pub(crate) fn key_wire_len(&self) -> usize {
        let mut len = 2 + self.value.len();
        if self.writes_length() {
            len += num_len(self.value.len()) + 1;
        }
        len
    }

    pub(crate) fn validate_type(&self) -> Result<()> {
        if self.ty.is_empty() || is_keyword(self.ty) {
            Ok(())
        } else {
            Err(RenderError::invalid_keyword(self.ty))
        }
    }

    pub(crate) fn resolve(&mut self, limits: &Limits, delim: Option<u8>) {
        if self.flag == ElemFlag::Check {
            self.flag = flag_for(needs_length(self.value, limits.elem_threshold, delim));
        }
    }

    pub(crate) fn resolve_key(&mut self, limits: &Limits) {
        if self.flag == ElemFlag::Check {
            self.flag = flag_for(key_needs_length(self.value, limits));
        }
    }
}

fn flag_for(need: bool) -> ElemFlag {
    if need { ElemFlag::NeedLength } else { ElemFlag::NoLength }
}

/// A key starting with a digit would read as a length prefix.
pub(crate) fn key_needs_length(key: &[u8], limits: &Limits) -> bool {
    needs_length(key, limits.elem_threshold, Some(b'}'))
        || key.first().is_some_and(u8::is_ascii_digit)
}

/// A list value: `[type] ("|" elem)*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct List<'a> {
    ty: &'a [u8],
    elems: Vec<Elem<'a>>,
    len: usize,
}

impl<'a> List<'a> {
    /// Build an untyped list with default limits.
    pub fn new(elems: Vec<Elem<'a>>) -> Result<Self> {
        Self::build(b"", elems, &Limits::default())
    }

    /// Build a list with a default element type.
    pub fn build(ty: &'a [u8], mut elems: Vec<Elem<'a>>, limits: &Limits) -> Result<Self> {
        if !ty.is_empty() && !is_keyword(ty) {
            return Err(RenderError::invalid_keyword(ty));
        }
        for elem in &mut elems {
            elem.validate_type()?;
            elem.resolve(limits, Some(b'|'));
        }
        Ok(Self::with_resolved(ty, elems))
    }

    fn with_resolved(ty: &'a [u8], elems: Vec<Elem<'a>>) -> Self {
        let len = ty.len() + elems.iter().map(|e| 1 + e.wire_len()).sum::<usize>();
        Self { ty, elems, len }
    }

    /// Parse a complete list value.
    ///
    /// # Errors
    ///
    /// Any [`ListError`]; [`ListError::Truncated`] when a length-prefixed
    /// element runs past the end of `value`.
    pub fn parse(value: &'a [u8]) -> std::result::Result<Self, ListError> {
        let mut parser = ListParser::new();
        let mut ty: &[u8] = b"";
        let mut elems = Vec::new();
        loop {
            match parser.parse(value)? {
                ListEvent::Type(t) => ty = t,
                ListEvent::Elem(elem) | ListEvent::ElemLast(elem) => elems.push(elem),
                ListEvent::End => break,
                ListEvent::Insufficient
                | ListEvent::ElemStart { .. }
                | ListEvent::ElemCont(_)
                | ListEvent::ElemEnd(_) => return Err(ListError::Truncated),
            }
        }
        Ok(Self::with_resolved(ty, elems))
    }

    /// Default element type, empty when absent
    pub fn ty(&self) -> &'a [u8] {
        self.ty
    }

    /// Elements in order
    pub fn elems(&self) -> &[Elem<'a>] {
        &self.elems
    }

    /// Rendered size in bytes
    pub fn wire_len(&self) -> usize {
        self.len
    }
}

/// One `{key}value` entry of a dict. The key's type is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DictEntry<'a> {
    /// Entry key
    pub key: Elem<'a>,
    /// Entry value
    pub value: Elem<'a>,
}

impl<'a> DictEntry<'a> {
    /// Create an entry with untyped key and value.
    pub fn new(key: &'a [u8], value: &'a [u8]) -> Self {
        Self { key: Elem::new(key), value: Elem::new(value) }
    }

    fn wire_len(&self) -> usize {
        self.key.key_wire_len() + self.value.wire_len()
    }
}

/// A dict value: `[type] ("{" key "}" elem)*`.
///
/// Entries keep wire order; duplicate keys are kept as sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dict<'a> {
    ty: &'a [u8],
    entries: Vec<DictEntry<'a>>,
    len: usize,
}

impl<'a> Dict<'a> {
    /// Build an untyped dict with default limits.
    pub fn new(entries: Vec<DictEntry<'a>>) -> Result<Self> {
        Self::build(b"", entries, &Limits::default())
    }

    /// Build a dict with a default value type.
    pub fn build(ty: &'a [u8], mut entries: Vec<DictEntry<'a>>, limits: &Limits) -> Result<Self> {
        if !ty.is_empty() && !is_keyword(ty) {
            return Err(RenderError::invalid_keyword(ty));
        }
        for entry in &mut entries {
            entry.key.ty = b"";
            entry.key.resolve_key(limits);
            entry.value.validate_type()?;
            entry.value.resolve(limits, Some(b'{'));
        }
        Ok(Self::with_resolved(ty, entries))
    }

    fn with_resolved(ty: &'a [u8], entries: Vec<DictEntry<'a>>) -> Self {
        let len = ty.len() + entries.iter().map(DictEntry::wire_len).sum::<usize>();
        Self { ty, entries, len }
    }

    /// Parse a complete dict value.
    ///
    /// # Errors
    ///
    /// Any [`DictError`]; [`DictError::Truncated`] when a key or a
    /// length-prefixed value runs past the end of `value`.
    pub fn parse(value: &'a [u8]) -> std::result::Result<Self, DictError> {
        let mut parser = DictParser::new();
        let mut ty: &[u8] = b"";
        let mut entries = Vec::new();
        let mut key = None;
        loop {
            match parser.parse(value)? {
                DictEvent::Type(t) => ty = t,
                DictEvent::Key(k) => key = Some(k),
                DictEvent::Value(v) | DictEvent::ValueLast(v) => {
                    let key = key.take().ok_or(DictError::Truncated)?;
                    entries.push(DictEntry { key, value: v });
                },
                DictEvent::End if key.is_none() => break,
                DictEvent::End
                | DictEvent::Insufficient
                | DictEvent::KeyStart { .. }
                | DictEvent::KeyCont(_)
                | DictEvent::KeyEnd(_)
                | DictEvent::ValueStart { .. }
                | DictEvent::ValueCont(_)
                | DictEvent::ValueEnd(_) => return Err(DictError::Truncated),
            }
        }
        Ok(Self::with_resolved(ty, entries))
    }

    /// Default value type, empty when absent
    pub fn ty(&self) -> &'a [u8] {
        self.ty
    }

    /// Entries in wire order
    pub fn entries(&self) -> &[DictEntry<'a>] {
        &self.entries
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &[u8]) -> Option<&Elem<'a>> {
        self.entries.iter().find(|e| e.key.value == key).map(|e| &e.value)
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
    fn elem_len_counts_each_part() {
        assert_eq!(Elem::new(b"").wire_len(), 0);
        assert_eq!(Elem::new(b"foo").with_flag(ElemFlag::NoLength).wire_len(), 4);
        assert_eq!(Elem::typed(b"_t", b"foo").with_flag(ElemFlag::NeedLength).wire_len(), 3 + 2 + 4);
        // no length digits for an empty value
        assert_eq!(Elem::typed(b"_t", b"").with_flag(ElemFlag::NeedLength).wire_len(), 3);
    }

    #[test]
    fn list_flags_elements_with_delimiter() {
        let list = List::new(vec![Elem::new(b"a|b"), Elem::new(b"plain")]).unwrap();
        assert_eq!(list.elems()[0].flag, ElemFlag::NeedLength);
        assert_eq!(list.elems()[1].flag, ElemFlag::NoLength);
        // "|:3 a|b" + "| plain"
        assert_eq!(list.wire_len(), 7 + 7);
    }

    #[test]
    fn list_rejects_bad_types() {
        assert!(matches!(
            List::build(b"not a type", vec![], &Limits::default()),
            Err(RenderError::InvalidKeyword(_))
        ));
        assert!(matches!(
            List::new(vec![Elem::typed(b"x-y", b"v")]),
            Err(RenderError::InvalidKeyword(_))
        ));
    }

    #[test]
    fn dict_keys_need_length_for_brace_or_digit() {
        let dict = Dict::new(vec![
            DictEntry::new(b"a}b", b"1"),
            DictEntry::new(b"7up", b"2"),
            DictEntry::new(b"plain", b"x{y"),
        ])
        .unwrap();
        let entries = dict.entries();
        assert_eq!(entries[0].key.flag, ElemFlag::NeedLength);
        assert_eq!(entries[1].key.flag, ElemFlag::NeedLength);
        assert_eq!(entries[2].key.flag, ElemFlag::NoLength);
        assert_eq!(entries[2].value.flag, ElemFlag::NeedLength);
        assert_eq!(dict.get(b"plain").map(|e| e.value), Some(&b"x{y"[..]));
        assert_eq!(dict.get(b"missing"), None);
    }

    #[test]
    fn elem_threshold_applies_to_lists() {
        let limits = Limits::default().with_elem_threshold(3);
        let list = List::build(b"", vec![Elem::new(b"abc"), Elem::new(b"abcd")], &limits).unwrap();
        assert_eq!(list.elems()[0].flag, ElemFlag::NoLength);
        assert_eq!(list.elems()[1].flag, ElemFlag::NeedLength);
    }
}
