//! Length thresholds for rendering.
//!
//! Values longer than these thresholds are sent with an explicit length so a
//! receiver can take them as binary blobs instead of scanning for delimiters.
//! Both ends may use different limits: the parser accepts either form.

use serde::{Deserialize, Serialize};

/// Default threshold for list and dict elements.
pub const DEFAULT_ELEM_THRESHOLD: usize = 404;

/// Default threshold for modifier values.
pub const DEFAULT_MODIFIER_THRESHOLD: usize = 444;

/// Default threshold for packet body data.
pub const DEFAULT_CONTENT_THRESHOLD: usize = 444;

/// Length thresholds used when computing length flags.
///
/// A value is rendered with an explicit length when it is strictly longer than
/// its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum list/dict element size without an explicit length
    pub elem_threshold: usize,
    /// Maximum modifier value size without an explicit length
    pub modifier_threshold: usize,
    /// Maximum body data size without an explicit content length
    pub content_threshold: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            elem_threshold: DEFAULT_ELEM_THRESHOLD,
            modifier_threshold: DEFAULT_MODIFIER_THRESHOLD,
            content_threshold: DEFAULT_CONTENT_THRESHOLD,
        }
    }
}

impl Limits {
    /// Set the list/dict element threshold.
    #[must_use]
    pub fn with_elem_threshold(mut self, bytes: usize) -> Self {
        self.elem_threshold = bytes;
        self
    }

    /// Set the modifier value threshold.
    #[must_use]
    pub fn with_modifier_threshold(mut self, bytes: usize) -> Self {
        self.modifier_threshold = bytes;
        self
    }

    /// Set the body data threshold.
    #[must_use]
    pub fn with_content_threshold(mut self, bytes: usize) -> Self {
        self.content_threshold = bytes;
        self
    }
}
