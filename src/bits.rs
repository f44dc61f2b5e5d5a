//! Bit-granularity reads over record data.
//!
//! Record fields are packed at arbitrary bit offsets and widths. Reading a field loads a full
//! little-endian 64-bit window starting at the field's first byte and shifts it down, so every
//! buffer handed to a [`BitReader`] must carry [`PADDING`] zero bytes past its logical end. That
//! guarantee lives in [`PaddedBytes`]: it is the only buffer type a `BitReader` accepts, and it
//! adds the padding when it is constructed.

use crate::error::{Error, Result};

/// Number of zero bytes kept past the logical end of every record buffer.
pub const PADDING: usize = 8;

/// An immutable byte buffer with [`PADDING`] trailing zero bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct PaddedBytes {
    buf: Box<[u8]>,
}

impl PaddedBytes {
    pub fn new(data: &[u8]) -> Self {
        let mut buf = Vec::with_capacity(data.len() + PADDING);
        buf.extend_from_slice(data);
        buf.resize(data.len() + PADDING, 0);
        Self {
            buf: buf.into_boxed_slice(),
        }
    }

    /// Length of the data, not counting the padding.
    pub fn len(&self) -> usize {
        self.buf.len() - PADDING
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The data, without the padding.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len()]
    }

    /// Load the 8-byte little-endian window starting at `byte`. The caller must have checked that
    /// `byte` is within the logical data.
    fn window(&self, byte: usize) -> u64 {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&self.buf[byte..byte + 8]);
        u64::from_le_bytes(raw)
    }
}

impl std::fmt::Debug for PaddedBytes {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("PaddedBytes")
            .field("len", &self.len())
            .finish()
    }
}

/// A positionable cursor that reads unsigned integers of up to 32 bits from any bit offset.
///
/// The absolute bit read next is `offset + position`. `offset` marks the start of the record
/// being read, `position` moves forward as values are read. No read may cross `limit`, an
/// absolute bit index that defaults to the end of the data.
#[derive(Clone, Debug)]
pub struct BitReader<'a> {
    data: &'a PaddedBytes,
    offset: usize,
    position: usize,
    limit: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a PaddedBytes) -> Self {
        Self::with_offset(data, 0)
    }

    /// Create a reader whose record starts at the given bit offset.
    pub fn with_offset(data: &'a PaddedBytes, offset: usize) -> Self {
        Self {
            data,
            offset,
            position: 0,
            limit: data.len() * 8,
        }
    }

    /// Create a reader confined to the `len` bits starting at `offset`.
    pub fn bounded(data: &'a PaddedBytes, offset: usize, len: usize) -> Self {
        Self {
            data,
            offset,
            position: 0,
            limit: offset.saturating_add(len).min(data.len() * 8),
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn set_offset(&mut self, offset: usize) {
        self.offset = offset;
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    /// Absolute bit index no read may cross.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Read `width` bits as an unsigned integer and advance the position past them.
    pub fn read_value(&mut self, width: u32) -> Result<u32> {
        if width > 32 {
            return Err(Error::StructuralInconsistency(format!(
                "Bit width {} is wider than 32 bits",
                width
            )));
        }
        if width == 0 {
            return Ok(0);
        }
        let bit = self.offset + self.position;
        let end = bit + width as usize;
        if end > self.limit {
            return Err(Error::LengthTooShort {
                step: "read record bits",
                actual: self.limit,
                expected: end,
            });
        }
        let window = self.data.window(bit >> 3) >> (bit & 7);
        let mask = (1u64 << width) - 1;
        self.position += width as usize;
        Ok((window & mask) as u32)
    }

    /// Read `width` bits and sign-extend them from the top bit of the field.
    pub fn read_signed(&mut self, width: u32) -> Result<i32> {
        let raw = self.read_value(width)?;
        if width == 0 || width >= 32 {
            return Ok(raw as i32);
        }
        let shift = 32 - width;
        Ok(((raw << shift) as i32) >> shift)
    }

    /// Read a NUL-terminated string at the current byte-aligned position, advancing past the
    /// terminator. The terminator must come before the reader's limit.
    pub fn read_cstr(&mut self) -> Result<&'a str> {
        let bit = self.offset + self.position;
        if bit & 7 != 0 {
            return Err(Error::BadString(format!(
                "Inline string at bit {} isn't byte-aligned",
                bit
            )));
        }
        let data = self.data.as_slice();
        let start = bit >> 3;
        let end = self.limit >> 3;
        let rest = data.get(start..end).ok_or(Error::LengthTooShort {
            step: "read inline string",
            actual: end,
            expected: start,
        })?;
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(Error::LengthTooShort {
                step: "read inline string",
                actual: rest.len(),
                expected: rest.len() + 1,
            })?;
        let s = std::str::from_utf8(&rest[..len])
            .map_err(|e| Error::BadString(format!("Inline string isn't UTF-8: {}", e)))?;
        self.position += (len + 1) * 8;
        Ok(s)
    }
}
