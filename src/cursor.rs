use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};

/// Little-endian reader over the byte-aligned regions of a table file: the header, section
/// descriptors, column metadata, shared data, and per-section side tables.
///
/// Every read names the step it belongs to, so a truncated file reports where it ran out.
#[derive(Clone, Debug)]
pub(crate) struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    pub fn seek(&mut self, pos: usize, step: &'static str) -> Result<()> {
        if pos > self.data.len() {
            return Err(Error::LengthTooShort {
                step,
                actual: self.data.len(),
                expected: pos,
            });
        }
        self.pos = pos;
        Ok(())
    }

    fn rest(&self) -> &'a [u8] {
        &self.data[self.pos.min(self.data.len())..]
    }

    fn too_short(&self, step: &'static str, expected: usize) -> Error {
        Error::LengthTooShort {
            step,
            actual: self.remaining(),
            expected,
        }
    }

    pub fn bytes(&mut self, len: usize, step: &'static str) -> Result<&'a [u8]> {
        let rest = self.rest();
        if rest.len() < len {
            return Err(self.too_short(step, len));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    pub fn array4(&mut self, step: &'static str) -> Result<[u8; 4]> {
        let mut out = [0u8; 4];
        out.copy_from_slice(self.bytes(4, step)?);
        Ok(out)
    }

    pub fn u16(&mut self, step: &'static str) -> Result<u16> {
        let mut rest = self.rest();
        let v = rest
            .read_u16::<LittleEndian>()
            .map_err(|_| self.too_short(step, 2))?;
        self.pos += 2;
        Ok(v)
    }

    pub fn i16(&mut self, step: &'static str) -> Result<i16> {
        let mut rest = self.rest();
        let v = rest
            .read_i16::<LittleEndian>()
            .map_err(|_| self.too_short(step, 2))?;
        self.pos += 2;
        Ok(v)
    }

    pub fn u32(&mut self, step: &'static str) -> Result<u32> {
        let mut rest = self.rest();
        let v = rest
            .read_u32::<LittleEndian>()
            .map_err(|_| self.too_short(step, 4))?;
        self.pos += 4;
        Ok(v)
    }

    pub fn u64(&mut self, step: &'static str) -> Result<u64> {
        let mut rest = self.rest();
        let v = rest
            .read_u64::<LittleEndian>()
            .map_err(|_| self.too_short(step, 8))?;
        self.pos += 8;
        Ok(v)
    }

    /// Read `count` little-endian u32 values, checking the full length up front so a corrupt
    /// count can't trigger a huge allocation.
    pub fn u32_array(&mut self, count: usize, step: &'static str) -> Result<Vec<u32>> {
        let len = count
            .checked_mul(4)
            .ok_or_else(|| self.too_short(step, usize::MAX))?;
        let mut raw = self.bytes(len, step)?;
        let mut out = vec![0u32; count];
        raw.read_u32_into::<LittleEndian>(&mut out)
            .map_err(|_| self.too_short(step, len))?;
        Ok(out)
    }

    /// Make sure `count` records of `size` bytes each are available before allocating for them.
    pub fn ensure(&self, count: usize, size: usize, step: &'static str) -> Result<()> {
        match count.checked_mul(size) {
            Some(len) if len <= self.remaining() => Ok(()),
            Some(len) => Err(self.too_short(step, len)),
            None => Err(self.too_short(step, usize::MAX)),
        }
    }
}
