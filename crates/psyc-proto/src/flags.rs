//! Packet parser mode flags.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Modes for [`crate::PacketParser`].
    ///
    /// The default (empty) mode parses the whole packet: routing modifiers,
    /// state operations, entity modifiers and the body.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ParseFlags: u8 {
        /// Parse only the routing header; the content part is delivered raw
        /// as `Content*` events. Used by relays that route packets without
        /// looking inside them.
        const ROUTING_ONLY = 0b0000_0001;

        /// Start at the content part. Parses a raw content buffer as produced
        /// by `ROUTING_ONLY` mode. Takes precedence over `ROUTING_ONLY`.
        const START_AT_CONTENT = 0b0000_0010;
    }
}

impl ParseFlags {
    /// Check if the routing header is the only part parsed
    #[must_use]
    pub fn routing_only(self) -> bool {
        self.contains(Self::ROUTING_ONLY) && !self.contains(Self::START_AT_CONTENT)
    }

    /// Check if parsing starts at the content part
    #[must_use]
    pub fn start_at_content(self) -> bool {
        self.contains(Self::START_AT_CONTENT)
    }
}
