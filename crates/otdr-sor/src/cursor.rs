// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bounds-checked little-endian reader over an immutable byte slice.
//!
//! Every read either advances the cursor or returns
//! [`CursorError::OutOfBounds`] with the offset it failed at; nothing here
//! indexes without checking. Offsets are relative to the slice the cursor
//! was built over, and callers lift them to absolute file offsets.

use thiserror::Error;

/// Errors produced by [`Cursor`] reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CursorError {
    /// Attempted to read or seek beyond the end of the buffer.
    #[error("out of bounds at offset {offset}: need {needed} bytes, {remaining} remaining")]
    OutOfBounds {
        /// Cursor position when the read was attempted.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the buffer.
        remaining: usize,
    },
}

/// Base-10 divisor applied to a raw integer to obtain a physical value.
///
/// The same integer width encodes different units in different blocks, so
/// the scale is supplied per field by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale(u32);

impl Scale {
    /// Raw value is already in physical units.
    pub const UNIT: Self = Self(1);
    /// Value stored in tenths.
    pub const TENTHS: Self = Self(10);
    /// Value stored in hundredths.
    pub const HUNDREDTHS: Self = Self(100);
    /// Value stored in thousandths.
    pub const THOUSANDTHS: Self = Self(1_000);
    /// Value stored in ten-thousandths.
    pub const TEN_THOUSANDTHS: Self = Self(10_000);
    /// Value stored in hundred-thousandths.
    pub const HUNDRED_THOUSANDTHS: Self = Self(100_000);
    /// Value stored in millionths.
    pub const MILLIONTHS: Self = Self(1_000_000);

    /// Build a scale from an arbitrary divisor; zero is treated as one.
    pub const fn new(divisor: u32) -> Self {
        if divisor == 0 {
            Self::UNIT
        } else {
            Self(divisor)
        }
    }

    /// The divisor.
    pub const fn divisor(self) -> u32 {
        self.0
    }

    /// Apply the scale to a raw value.
    #[inline]
    pub fn apply(self, raw: f64) -> f64 {
        raw / f64::from(self.0)
    }
}

/// Decode ISO-8859-1 bytes into a `String`, trimming trailing spaces.
///
/// Instrument text is 8-bit and frequently not valid UTF-8; Latin-1 maps every
/// byte to a char so decoding cannot fail.
pub fn latin1(bytes: &[u8]) -> String {
    let text: String = bytes.iter().map(|&b| char::from(b)).collect();
    let trimmed = text.trim_end_matches([' ', '\0']);
    trimmed.to_string()
}

/// Sequential reader over a borrowed byte slice.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> Cursor<'a> {
    /// Create a cursor positioned at offset 0.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Current offset from the start of the slice.
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Total length of the underlying slice.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    /// Whether every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// The unread tail of the slice.
    pub fn rest(&self) -> &'a [u8] {
        self.bytes.get(self.offset..).unwrap_or_default()
    }

    /// Whether the unread tail begins with `prefix`.
    pub fn starts_with(&self, prefix: &[u8]) -> bool {
        self.rest().starts_with(prefix)
    }

    fn out_of_bounds(&self, needed: usize) -> CursorError {
        CursorError::OutOfBounds {
            offset: self.offset,
            needed,
            remaining: self.remaining(),
        }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CursorError> {
        let end = self
            .offset
            .checked_add(len)
            .ok_or_else(|| self.out_of_bounds(len))?;
        let out = self
            .bytes
            .get(self.offset..end)
            .ok_or_else(|| self.out_of_bounds(len))?;
        self.offset = end;
        Ok(out)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CursorError> {
        let chunk = self.take(N)?;
        let mut raw = [0u8; N];
        raw.copy_from_slice(chunk);
        Ok(raw)
    }

    /// Take `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], CursorError> {
        self.take(len)
    }

    /// Read a single byte.
    pub fn read_u8(&mut self) -> Result<u8, CursorError> {
        let [b] = self.take_array::<1>()?;
        Ok(b)
    }

    /// Read a little-endian u16.
    pub fn read_u16(&mut self) -> Result<u16, CursorError> {
        self.take_array().map(u16::from_le_bytes)
    }

    /// Read a little-endian i16.
    pub fn read_i16(&mut self) -> Result<i16, CursorError> {
        self.take_array().map(i16::from_le_bytes)
    }

    /// Read a little-endian u32.
    pub fn read_u32(&mut self) -> Result<u32, CursorError> {
        self.take_array().map(u32::from_le_bytes)
    }

    /// Read a little-endian i32.
    pub fn read_i32(&mut self) -> Result<i32, CursorError> {
        self.take_array().map(i32::from_le_bytes)
    }

    /// Read a little-endian u16 without advancing.
    pub fn peek_u16(&self) -> Result<u16, CursorError> {
        self.clone().read_u16()
    }

    /// Read a u16 and divide it by `scale`.
    pub fn read_fixed_u16(&mut self, scale: Scale) -> Result<f64, CursorError> {
        self.read_u16().map(|raw| scale.apply(f64::from(raw)))
    }

    /// Read an i16 and divide it by `scale`.
    pub fn read_fixed_i16(&mut self, scale: Scale) -> Result<f64, CursorError> {
        self.read_i16().map(|raw| scale.apply(f64::from(raw)))
    }

    /// Read a u32 and divide it by `scale`.
    pub fn read_fixed_u32(&mut self, scale: Scale) -> Result<f64, CursorError> {
        self.read_u32().map(|raw| scale.apply(f64::from(raw)))
    }

    /// Read an i32 and divide it by `scale`.
    pub fn read_fixed_i32(&mut self, scale: Scale) -> Result<f64, CursorError> {
        self.read_i32().map(|raw| scale.apply(f64::from(raw)))
    }

    /// Read a fixed-width text field of exactly `width` bytes.
    pub fn read_fixed_str(&mut self, width: usize) -> Result<String, CursorError> {
        self.take(width).map(latin1)
    }

    /// Read a NUL-terminated string of at most `max_len` bytes.
    ///
    /// The terminator is consumed but not returned. Reading stops without
    /// error at `max_len` bytes or at the end of the buffer, whichever comes
    /// first. Fails only when no byte is left at all.
    pub fn read_string(&mut self, max_len: usize) -> Result<String, CursorError> {
        if self.is_empty() {
            return Err(self.out_of_bounds(1));
        }
        let window = self.rest();
        let limit = window.len().min(max_len);
        let window = window.get(..limit).unwrap_or_default();
        match window.iter().position(|&b| b == 0) {
            Some(nul) => {
                let text = self.take(nul + 1)?;
                Ok(latin1(text.get(..nul).unwrap_or_default()))
            }
            None => self.take(limit).map(latin1),
        }
    }

    /// Advance by `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<(), CursorError> {
        self.take(n).map(|_| ())
    }

    /// Move to an absolute offset within the slice (the end is allowed).
    pub fn seek(&mut self, offset: usize) -> Result<(), CursorError> {
        if offset > self.bytes.len() {
            return Err(CursorError::OutOfBounds {
                offset,
                needed: offset - self.bytes.len(),
                remaining: 0,
            });
        }
        self.offset = offset;
        Ok(())
    }
}
