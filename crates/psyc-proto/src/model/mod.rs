//! Models of packets and structured values to be sent.
//!
//! Building a model validates it, fixes every length flag still set to
//! `Check`, and computes the exact rendered size. Rendering (the `render`,
//! `to_bytes` and `encode` methods) then only copies bytes.
//!
//! Models borrow their strings; nothing is copied until rendering.

mod index;
mod list;
mod modifier;
mod packet;

pub use index::{IndexPath, IndexSegment, Update};
pub use list::{Dict, DictEntry, Elem, ElemFlag, List};
pub use modifier::{Modifier, ModifierFlag};
pub use packet::{Packet, PacketBuilder, PacketFlag};

use memchr::memchr;

/// Check if a value must carry an explicit length: longer than `threshold`,
/// or containing `delim`.
pub(crate) fn needs_length(value: &[u8], threshold: usize, delim: Option<u8>) -> bool {
    value.len() > threshold || delim.is_some_and(|d| memchr(d, value).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_exclusive() {
        assert!(!needs_length(&[b'a'; 444], 444, Some(b'\n')));
        assert!(needs_length(&[b'a'; 445], 444, Some(b'\n')));
        assert!(needs_length(b"a\nb", 444, Some(b'\n')));
        assert!(!needs_length(b"a\nb", 444, None));
    }
}
