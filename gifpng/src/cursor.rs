//! Forward-only reader over a borrowed byte slice.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{FormatError, Result};

/// Byte cursor that tracks how much of its input has been consumed.
///
/// Parsers hand back `cursor.position()` as their consumed length so the
/// caller can advance its own offset without copying the input.
#[derive(Debug, Clone)]
pub(crate) struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes consumed so far.
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub(crate) fn peek_u8(&self) -> Option<u8> {
        self.data.get(self.pos).copied()
    }

    pub(crate) fn read_u8(&mut self, what: &'static str) -> Result<u8> {
        Ok(self.read_bytes(1, what)?[0])
    }

    pub(crate) fn read_u16_le(&mut self, what: &'static str) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.read_bytes(2, what)?))
    }

    pub(crate) fn read_bytes(&mut self, len: usize, what: &'static str) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(FormatError::Truncated {
                what,
                needed: len,
                available: self.remaining(),
            }
            .into());
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub(crate) fn skip(&mut self, len: usize, what: &'static str) -> Result<()> {
        self.read_bytes(len, what).map(|_| ())
    }

    /// Skip length-prefixed sub-blocks through the zero-length terminator.
    pub(crate) fn skip_sub_blocks(&mut self, what: &'static str) -> Result<()> {
        loop {
            let size = self.read_u8(what)? as usize;
            if size == 0 {
                return Ok(());
            }
            self.skip(size, what)?;
        }
    }
}
