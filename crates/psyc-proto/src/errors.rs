//! Error types for parsing and rendering.
//!
//! Offsets are relative to the buffer passed to the failing call. Running out
//! of input is never an error: parsers report it as an `Insufficient` event.

use thiserror::Error;

/// Result type for building and rendering models.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Packet framing errors.
///
/// Every variant is terminal for the current packet. The parser resets itself
/// so the next call starts a new packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A modifier glyph is not followed by a keyword
    #[error("modifier without a name at offset {at}")]
    MissingModifierName {
        /// Offset of the modifier glyph
        at: usize,
    },

    /// The content length line holds something other than digits and LF
    #[error("invalid content length at offset {at}")]
    InvalidLength {
        /// Offset of the offending byte
        at: usize,
    },

    /// A binary modifier value has no valid decimal length
    #[error("invalid modifier value length at offset {at}")]
    InvalidModifierLength {
        /// Offset of the offending byte
        at: usize,
    },

    /// A modifier name is followed by neither TAB, LF nor a binary length
    #[error("missing tab before modifier value at offset {at}")]
    MissingTab {
        /// Offset of the offending byte
        at: usize,
    },

    /// A modifier is not terminated by LF
    #[error("missing newline after modifier at offset {at}")]
    MissingModifierNewline {
        /// Offset of the offending byte
        at: usize,
    },

    /// The method keyword is not terminated by LF
    #[error("missing newline after method at offset {at}")]
    MissingMethodNewline {
        /// Offset of the offending byte
        at: usize,
    },

    /// Length-delimited body data is not terminated by LF
    #[error("missing newline after body data at offset {at}")]
    MissingBodyNewline {
        /// Offset of the offending byte
        at: usize,
    },

    /// A glyph at the start of the content followed by LF is not `=` or `?`
    #[error("invalid state operation {glyph:?} at offset {at}")]
    InvalidStateOp {
        /// The glyph found
        glyph: char,
        /// Offset of the glyph
        at: usize,
    },

    /// The announced content length does not match the parsed content
    #[error("content length mismatch: announced {expected} bytes, parsed {actual}")]
    ContentLength {
        /// Announced length
        expected: usize,
        /// Bytes parsed, or announced by a binary value, when the mismatch
        /// was detected
        actual: usize,
    },

    /// The packet does not end with `|` LF
    #[error("invalid packet delimiter at offset {at}")]
    InvalidDelimiter {
        /// Offset where the delimiter was expected
        at: usize,
    },
}

/// List value errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ListError {
    /// An element does not start with `|`
    #[error("expected element delimiter at offset {at}")]
    ElemStart {
        /// Offset of the offending byte
        at: usize,
    },

    /// `=` is not followed by a type keyword
    #[error("invalid element type at offset {at}")]
    ElemType {
        /// Offset of the offending byte
        at: usize,
    },

    /// Invalid element length, or bytes after a length that are not SP
    #[error("invalid element length at offset {at}")]
    ElemLength {
        /// Offset of the offending byte
        at: usize,
    },

    /// A length-prefixed element is not followed by `|` or the end of the value
    #[error("trailing bytes after element at offset {at}")]
    ElemEnd {
        /// Offset of the offending byte
        at: usize,
    },

    /// The value ended inside a length-prefixed element
    #[error("list value truncated")]
    Truncated,
}

/// Dict value errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DictError {
    /// An entry does not start with `{`
    #[error("expected key start at offset {at}")]
    KeyStart {
        /// Offset of the offending byte
        at: usize,
    },

    /// Invalid key length prefix
    #[error("invalid key length at offset {at}")]
    KeyLength {
        /// Offset of the offending byte
        at: usize,
    },

    /// A key is not closed by `}`
    #[error("expected key end at offset {at}")]
    KeyEnd {
        /// Offset of the offending byte
        at: usize,
    },

    /// `=` is not followed by a type keyword
    #[error("invalid value type at offset {at}")]
    ValueType {
        /// Offset of the offending byte
        at: usize,
    },

    /// Invalid value length, or bytes after a length that are not SP
    #[error("invalid value length at offset {at}")]
    ValueLength {
        /// Offset of the offending byte
        at: usize,
    },

    /// A length-prefixed value is not followed by `{` or the end of the value
    #[error("trailing bytes after value at offset {at}")]
    ValueEnd {
        /// Offset of the offending byte
        at: usize,
    },

    /// The value ended inside a key or a length-prefixed value
    #[error("dict value truncated")]
    Truncated,
}

/// Index path errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum IndexError {
    /// A byte that starts no segment
    #[error("invalid index segment at offset {at}")]
    Segment {
        /// Offset of the offending byte
        at: usize,
    },

    /// `#` is not followed by a decimal index
    #[error("invalid list index at offset {at}")]
    ListIndex {
        /// Offset of the offending byte
        at: usize,
    },

    /// `.` is not followed by a field keyword
    #[error("invalid struct field at offset {at}")]
    StructField {
        /// Offset of the offending byte
        at: usize,
    },

    /// Invalid dict key length prefix
    #[error("invalid dict key length at offset {at}")]
    DictKeyLength {
        /// Offset of the offending byte
        at: usize,
    },

    /// A dict key is not closed by `}`
    #[error("expected dict key end at offset {at}")]
    DictKeyEnd {
        /// Offset of the offending byte
        at: usize,
    },

    /// The path ended inside a dict key
    #[error("index path truncated")]
    Truncated,
}

/// Update value errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UpdateError {
    /// The index path is malformed
    #[error(transparent)]
    Index(#[from] IndexError),

    /// The path is not followed by an operator glyph
    #[error("invalid operator at offset {at}")]
    Operator {
        /// Offset of the offending byte
        at: usize,
    },

    /// Invalid type keyword after the operator
    #[error("invalid type at offset {at}")]
    Type {
        /// Offset of the offending byte
        at: usize,
    },

    /// Invalid value length, or bytes after a length that are not SP
    #[error("invalid value length at offset {at}")]
    Length {
        /// Offset of the offending byte
        at: usize,
    },

    /// Bytes after a length-prefixed value
    #[error("trailing bytes after value at offset {at}")]
    Value {
        /// Offset of the offending byte
        at: usize,
    },

    /// The value ended inside the path or a length-prefixed value
    #[error("update value truncated")]
    Truncated,
}

/// Errors from building or rendering models.
///
/// Rendering checks everything up front and writes nothing on error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    /// Output buffer smaller than the computed length
    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall {
        /// Bytes the rendered form takes
        needed: usize,
        /// Bytes available in the output buffer
        available: usize,
    },

    /// A modifier without a name
    #[error("modifier name is empty")]
    MissingName,

    /// A name, method or type that is not a keyword
    #[error("invalid keyword {0:?}")]
    InvalidKeyword(String),

    /// A routing modifier value that would need an explicit length
    #[error("routing modifier {0:?} has a value that needs a length")]
    RoutingValue(String),

    /// Raw content combined with entity modifiers, method, data or state
    #[error("raw content cannot be combined with entity, method or data")]
    ContentConflict,

    /// Data without a method
    #[error("packet data requires a method")]
    DataWithoutMethod,
}

impl RenderError {
    pub(crate) fn invalid_keyword(bytes: &[u8]) -> Self {
        Self::InvalidKeyword(String::from_utf8_lossy(bytes).into_owned())
    }
}
