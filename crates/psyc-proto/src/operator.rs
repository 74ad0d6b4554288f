//! Modifier operators and state operations.

use serde_repr::{Deserialize_repr, Serialize_repr};

/// Modifier operator glyph.
///
/// The discriminant is the wire byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Operator {
    /// `:` set the variable for this packet only
    Set = b':',
    /// `=` assign the variable for the rest of the session
    Assign = b'=',
    /// `+` augment a list or counter
    Augment = b'+',
    /// `-` diminish a list or counter
    Diminish = b'-',
    /// `@` update part of a structured value
    Update = b'@',
    /// `?` query the variable
    Query = b'?',
}

impl Operator {
    /// Parse an operator from its glyph
    #[must_use]
    pub fn from_glyph(byte: u8) -> Option<Self> {
        match byte {
            b':' => Some(Self::Set),
            b'=' => Some(Self::Assign),
            b'+' => Some(Self::Augment),
            b'-' => Some(Self::Diminish),
            b'@' => Some(Self::Update),
            b'?' => Some(Self::Query),
            _ => None,
        }
    }

    /// Wire glyph
    #[must_use]
    pub fn glyph(self) -> u8 {
        self as u8
    }
}

/// State operation at the start of the content part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum StateOp {
    /// No state operation
    #[default]
    NoOp = 0,
    /// `=` reset the entity state
    Reset = b'=',
    /// `?` ask the peer to resend its entity state
    Resync = b'?',
}

impl StateOp {
    /// Wire glyph, `None` for [`StateOp::NoOp`]
    #[must_use]
    pub fn glyph(self) -> Option<u8> {
        match self {
            Self::NoOp => None,
            Self::Reset | Self::Resync => Some(self as u8),
        }
    }
}
