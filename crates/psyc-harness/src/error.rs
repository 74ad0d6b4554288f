//! Reader errors.

use psyc_proto::{DictError, IndexError, ListError, ParseError, RenderError, UpdateError};
use thiserror::Error;

/// Errors from reading packets and decoding their values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReaderError {
    /// The stream is not valid packet framing. The reader dropped its
    /// buffered input.
    #[error("malformed packet: {0}")]
    Packet(#[from] ParseError),

    /// A list value is malformed
    #[error("malformed list value: {0}")]
    List(#[from] ListError),

    /// A dict value is malformed
    #[error("malformed dict value: {0}")]
    Dict(#[from] DictError),

    /// An index path is malformed
    #[error("malformed index path: {0}")]
    Index(#[from] IndexError),

    /// An update value is malformed
    #[error("malformed update value: {0}")]
    Update(#[from] UpdateError),

    /// A length-prefixed value announces more bytes than the reader accepts.
    /// The reader dropped its buffered input.
    #[error("value of {len} bytes exceeds the limit of {max}")]
    ValueTooLarge {
        /// Announced length
        len: usize,
        /// Configured maximum
        max: usize,
    },

    /// A received packet could not be rebuilt for sending
    #[error("cannot rebuild packet: {0}")]
    Render(#[from] RenderError),
}

/// Shorthand for reader results.
pub type Result<T> = std::result::Result<T, ReaderError>;
