//! Rendering of built models.
//!
//! Every model knows its exact size after building. Rendering checks the
//! output buffer once, then writes without further bounds decisions and
//! asserts the written size matches the computed one.

use bytes::{Bytes, BytesMut};
use tracing::debug;

use crate::{
    Dict, Elem, IndexPath, IndexSegment, List, Modifier, Packet, PacketFlag, RenderError, Result,
    Update, scan::num_len,
};

struct Writer<'b> {
    buf: &'b mut [u8],
    pos: usize,
}

impl<'b> Writer<'b> {
    fn new(buf: &'b mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn put(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    fn byte(&mut self, byte: u8) {
        self.buf[self.pos] = byte;
        self.pos += 1;
    }

    fn num(&mut self, mut n: usize) {
        let len = num_len(n);
        for slot in self.buf[self.pos..self.pos + len].iter_mut().rev() {
            // n % 10 < 10
            #[allow(clippy::cast_possible_truncation)]
            let digit = (n % 10) as u8;
            *slot = b'0' + digit;
            n /= 10;
        }
        self.pos += len;
    }

    fn modifier(&mut self, m: &Modifier<'_>) {
        self.byte(m.oper.glyph());
        self.put(m.name);
        if m.needs_length() {
            self.byte(b' ');
            self.num(m.value.len());
        }
        self.byte(b'\t');
        self.put(m.value);
        self.byte(b'\n');
    }

    /// `["=" type] [":" length] [SP value]`, or with a bare type for updates.
    fn elem(&mut self, e: &Elem<'_>, type_intro: Option<u8>) {
        if !e.ty.is_empty() {
            if let Some(intro) = type_intro {
                self.byte(intro);
            }
            self.put(e.ty);
        }
        if e.writes_length() {
            self.byte(b':');
            self.num(e.value.len());
        }
        if !e.value.is_empty() {
            self.byte(b' ');
            self.put(e.value);
        }
    }

    fn key(&mut self, key: &Elem<'_>) {
        self.byte(b'{');
        if key.writes_length() {
            self.num(key.value.len());
            self.byte(b' ');
        }
        self.put(key.value);
        self.byte(b'}');
    }
}

/// A model with a precomputed rendered size.
trait Wire {
    fn wire_size(&self) -> usize;
    fn write(&self, w: &mut Writer<'_>);
}

fn render_into<T: Wire>(value: &T, out: &mut [u8]) -> Result<usize> {
    let needed = value.wire_size();
    if out.len() < needed {
        debug!(needed, available = out.len(), "render buffer too small");
        return Err(RenderError::BufferTooSmall { needed, available: out.len() });
    }
    let mut w = Writer::new(&mut out[..needed]);
    value.write(&mut w);
    assert_eq!(w.pos, needed, "rendered size differs from computed size");
    Ok(needed)
}

fn encode_into<T: Wire>(value: &T, dst: &mut BytesMut) {
    let start = dst.len();
    let needed = value.wire_size();
    dst.resize(start + needed, 0);
    let mut w = Writer::new(&mut dst[start..]);
    value.write(&mut w);
    assert_eq!(w.pos, needed, "rendered size differs from computed size");
}

fn to_bytes<T: Wire>(value: &T) -> Bytes {
    let mut buf = BytesMut::with_capacity(value.wire_size());
    encode_into(value, &mut buf);
    buf.freeze()
}

impl Wire for Packet<'_> {
    fn wire_size(&self) -> usize {
        self.total_len()
    }

    fn write(&self, w: &mut Writer<'_>) {
        for m in self.routing() {
            w.modifier(m);
        }
        let need_length = self.flag() == PacketFlag::NeedLength;
        if need_length {
            w.num(self.content_len());
        }
        if need_length || self.content_len() > 0 {
            w.byte(b'\n');
        }
        if self.content().is_empty() {
            if let Some(glyph) = self.state_op().glyph() {
                w.byte(glyph);
                w.byte(b'\n');
            }
            for m in self.entity() {
                w.modifier(m);
            }
            if !self.method().is_empty() {
                w.put(self.method());
                w.byte(b'\n');
                if !self.data().is_empty() {
                    w.put(self.data());
                    w.byte(b'\n');
                }
            }
        } else {
            w.put(self.content());
        }
        w.put(b"|\n");
    }
}

impl Wire for List<'_> {
    fn wire_size(&self) -> usize {
        self.wire_len()
    }

    fn write(&self, w: &mut Writer<'_>) {
        w.put(self.ty());
        for e in self.elems() {
            w.byte(b'|');
            w.elem(e, Some(b'='));
        }
    }
}

impl Wire for Dict<'_> {
    fn wire_size(&self) -> usize {
        self.wire_len()
    }

    fn write(&self, w: &mut Writer<'_>) {
        w.put(self.ty());
        for entry in self.entries() {
            w.key(&entry.key);
            w.elem(&entry.value, Some(b'='));
        }
    }
}

impl Wire for IndexPath<'_> {
    fn wire_size(&self) -> usize {
        self.wire_len()
    }

    fn write(&self, w: &mut Writer<'_>) {
        for segment in self.segments() {
            match *segment {
                IndexSegment::List(n) => {
                    w.byte(b'#');
                    w.num(n);
                },
                IndexSegment::Struct(name) => {
                    w.put(b"._");
                    w.put(name);
                },
                IndexSegment::Dict { key, flag } => {
                    w.key(&Elem::new(key).with_flag(flag));
                },
            }
        }
    }
}

impl Wire for Update<'_> {
    fn wire_size(&self) -> usize {
        self.wire_len()
    }

    fn write(&self, w: &mut Writer<'_>) {
        self.path().write(w);
        if !self.path().is_empty() {
            w.byte(b' ');
        }
        w.byte(self.oper().glyph());
        w.elem(self.value(), None);
    }
}

macro_rules! render_methods {
    ($($ty:ident),*) => {$(
        impl $ty<'_> {
            /// Render into `out`, returning the number of bytes written.
            ///
            /// # Errors
            ///
            /// [`RenderError::BufferTooSmall`] when `out` is shorter than the
            /// rendered size; nothing is written then.
            pub fn render(&self, out: &mut [u8]) -> Result<usize> {
                render_into(self, out)
            }

            /// Render into a new buffer.
            pub fn to_bytes(&self) -> Bytes {
                to_bytes(self)
            }

            /// Append the rendered form to `dst`.
            pub fn encode(&self, dst: &mut BytesMut) {
                encode_into(self, dst);
            }
        }
    )*};
}

render_methods!(Packet, List, Dict, IndexPath, Update);
