//! Wire format for the PSYC protocol.
//!
//! A packet is a routing header, an optional content length line, and a
//! content part made of an entity header, a method and its data, closed by the
//! `|` LF delimiter:
//!
//! ```text
//! :_context\tpsyc://example.net/@room\n      routing modifier
//! 97\n                                      content length (optional)
//! =_degree_availability\t_here\n            entity modifier
//! =_description 25\tI'm omnipresent...\n    entity modifier, binary form
//! _notice_presence\n                        method
//! |\n                                       delimiter
//! ```
//!
//! Modifier values can carry nested structures (lists, dicts, index paths and
//! update operations), each with its own parser in [`parse`].
//!
//! # Streaming
//!
//! Every parser is a pull-based state machine over a caller-owned buffer. A
//! call returns one unit (a modifier, a list element, a body fragment) or an
//! `Insufficient` event when the buffer ends inside a unit. In that case the
//! cursor is left at the start of the unit, so the caller keeps the unconsumed
//! tail, appends new bytes and calls again. Values that announce an explicit
//! length are delivered in start/continuation/end pieces instead of waiting
//! for the whole value, so a large binary body never has to be buffered.
//!
//! Returned fragments borrow the input buffer and are invalidated by
//! compacting it; copy them out first if they must outlive the buffer.
//!
//! # Rendering
//!
//! The [`model`] types compute, once, whether each value needs an explicit
//! length and how many bytes the rendered form takes. Rendering reproduces
//! those decisions exactly, so anything rendered parses back unchanged.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod flags;
pub mod keyword;
pub mod limits;
pub mod model;
pub mod operator;
pub mod parse;
mod render;
mod scan;
pub mod vars;

pub use errors::{
    DictError, IndexError, ListError, ParseError, RenderError, Result, UpdateError,
};
pub use flags::ParseFlags;
pub use limits::Limits;
pub use model::{
    Dict, DictEntry, Elem, ElemFlag, IndexPath, IndexSegment, List, Modifier, ModifierFlag,
    Packet, PacketBuilder, PacketFlag, Update,
};
pub use operator::{Operator, StateOp};
pub use parse::{
    DictEvent, DictParser, IndexEvent, IndexParser, ListEvent, ListParser, PacketEvent,
    PacketParser, UpdateEvent, UpdateParser,
};
pub use vars::{KnownVars, VarType, VarTypes};
