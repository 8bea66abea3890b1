// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Little-endian byte writer for synthesizing trace files.

use bytes::{BufMut, BytesMut};

/// Append-only writer for little-endian scalars and NUL-terminated text.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: BytesMut,
}

impl ByteWriter {
    /// Create an empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write raw bytes.
    pub fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.put_slice(bytes);
        self
    }

    /// Write a little-endian u16.
    pub fn u16(&mut self, value: u16) -> &mut Self {
        self.buf.put_u16_le(value);
        self
    }

    /// Write a little-endian i16.
    pub fn i16(&mut self, value: i16) -> &mut Self {
        self.buf.put_i16_le(value);
        self
    }

    /// Write a little-endian u32.
    pub fn u32(&mut self, value: u32) -> &mut Self {
        self.buf.put_u32_le(value);
        self
    }

    /// Write a little-endian i32.
    pub fn i32(&mut self, value: i32) -> &mut Self {
        self.buf.put_i32_le(value);
        self
    }

    /// Write `text` followed by a NUL terminator.
    pub fn cstr(&mut self, text: &str) -> &mut Self {
        self.buf.put_slice(text.as_bytes());
        self.buf.put_u8(0);
        self
    }

    /// Write exactly `width` bytes of `text`, space padded or truncated.
    pub fn fixed(&mut self, text: &str, width: usize) -> &mut Self {
        let raw = text.as_bytes();
        let take = raw.len().min(width);
        self.buf.put_slice(&raw[..take]);
        self.buf.put_bytes(b' ', width - take);
        self
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Consume the writer and return the buffer.
    pub fn into_vec(self) -> Vec<u8> {
        Vec::from(self.buf)
    }
}
