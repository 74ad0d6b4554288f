//! Stream-level tooling on top of `psyc-proto`.
//!
//! [`PacketReader`] turns a byte stream of any fragmentation into owned
//! packets, [`decode_value`] re-parses structured modifier values, and
//! [`Fragmenter`] cuts byte streams into reproducible random chunks for
//! resumability tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod decode;
pub mod error;
pub mod fragment;
pub mod reader;
pub mod received;

pub use decode::{StructuredValue, decode_value};
pub use error::ReaderError;
pub use fragment::Fragmenter;
pub use reader::{DEFAULT_MAX_VALUE, PacketReader};
pub use received::{OwnedModifier, ReceivedPacket};
