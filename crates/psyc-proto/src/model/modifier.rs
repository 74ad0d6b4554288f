//! Header modifiers.

use crate::{
    Limits, Operator, RenderError, Result,
    model::needs_length,
    scan::{is_keyword, num_len},
};

/// Length flag of a modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModifierFlag {
    /// Decide when the packet is built
    #[default]
    Check,
    /// Render as `glyph name SP length TAB value`
    NeedLength,
    /// Render as `glyph name TAB value`
    NoLength,
    /// Routing modifier, never carries a length
    Routing,
}

/// One `glyph name value` header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modifier<'a> {
    /// Operator glyph
    pub oper: Operator,
    /// Variable name, a keyword
    pub name: &'a [u8],
    /// Raw value
    pub value: &'a [u8],
    /// Length flag
    pub flag: ModifierFlag,
}

impl<'a> Modifier<'a> {
    /// Create an entity modifier whose length flag is decided at build time.
    pub fn new(oper: Operator, name: &'a [u8], value: &'a [u8]) -> Self {
        Self { oper, name, value, flag: ModifierFlag::Check }
    }

    /// Create a routing modifier.
    pub fn routing(oper: Operator, name: &'a [u8], value: &'a [u8]) -> Self {
        Self { oper, name, value, flag: ModifierFlag::Routing }
    }

    /// Override the length flag.
    #[must_use]
    pub fn with_flag(mut self, flag: ModifierFlag) -> Self {
        self.flag = flag;
        self
    }

    /// Check if the value is rendered with an explicit length
    pub fn needs_length(&self) -> bool {
        self.flag == ModifierFlag::NeedLength
    }

    /// Rendered size in bytes.
    pub fn wire_len(&self) -> usize {
        // glyph name TAB value LF
        let mut len = self.name.len() + self.value.len() + 3;
        if self.needs_length() {
            len += 1 + num_len(self.value.len());
        }
        len
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(RenderError::MissingName);
        }
        if !is_keyword(self.name) {
            return Err(RenderError::invalid_keyword(self.name));
        }
        Ok(())
    }

    /// Fix a `Check` flag for an entity modifier.
    pub(crate) fn resolve(&mut self, limits: &Limits) {
        if self.flag == ModifierFlag::Check {
            self.flag = if needs_length(self.value, limits.modifier_threshold, Some(b'\n')) {
                ModifierFlag::NeedLength
            } else {
                ModifierFlag::NoLength
            };
        }
    }
}
