//! Variable-width LZW decompression over GIF sub-block framing.
//!
//! The compressed stream starts with the minimum code size byte, followed by
//! length-prefixed sub-blocks (a zero length terminates the sequence). Codes
//! are packed least-significant bit first across sub-block boundaries.

use tracing::{trace, warn};

use super::LZW_MIN_CODE_SIZES;
use crate::error::{DecodeError, FormatError, Result};

/// Widest code GIF allows.
const MAX_CODE_SIZE: u8 = 12;

/// Dictionary capacity for 12-bit codes.
const MAX_CODES: usize = 1 << MAX_CODE_SIZE;

/// Prefix marker for single-pixel root entries.
const NO_PREFIX: u16 = u16::MAX;

/// Outcome of reading one code from the sub-block stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Code {
    /// A complete code.
    Value(u16),
    /// The zero-length terminator was reached.
    EndOfData,
}

/// Bit reader over length-prefixed sub-blocks.
struct SubBlockBits<'a> {
    data: &'a [u8],
    pos: usize,
    block_remaining: usize,
    bit_buffer: u32,
    bits_in_buffer: u8,
    terminated: bool,
}

impl<'a> SubBlockBits<'a> {
    /// `data` must start at the first sub-block length byte.
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            block_remaining: 0,
            bit_buffer: 0,
            bits_in_buffer: 0,
            terminated: false,
        }
    }

    fn next_byte(&mut self) -> std::result::Result<Option<u8>, DecodeError> {
        if self.terminated {
            return Ok(None);
        }
        if self.block_remaining == 0 {
            let size = *self.data.get(self.pos).ok_or(DecodeError::UnexpectedEof)?;
            self.pos += 1;
            if size == 0 {
                self.terminated = true;
                return Ok(None);
            }
            self.block_remaining = size as usize;
        }
        let byte = *self.data.get(self.pos).ok_or(DecodeError::UnexpectedEof)?;
        self.pos += 1;
        self.block_remaining -= 1;
        Ok(Some(byte))
    }

    fn read_code(&mut self, size: u8) -> std::result::Result<Code, DecodeError> {
        while self.bits_in_buffer < size {
            match self.next_byte()? {
                Some(byte) => {
                    self.bit_buffer |= (byte as u32) << self.bits_in_buffer;
                    self.bits_in_buffer += 8;
                }
                None => return Ok(Code::EndOfData),
            }
        }
        let code = (self.bit_buffer & ((1u32 << size) - 1)) as u16;
        self.bit_buffer >>= size;
        self.bits_in_buffer -= size;
        Ok(Code::Value(code))
    }

    /// Skip whatever follows the end code, through the terminator.
    ///
    /// Returns `false` if the input ran out first.
    fn skip_to_terminator(&mut self) -> bool {
        if self.terminated {
            return true;
        }
        self.pos = (self.pos + self.block_remaining).min(self.data.len());
        self.block_remaining = 0;
        while let Some(&size) = self.data.get(self.pos) {
            self.pos += 1;
            if size == 0 {
                self.terminated = true;
                return true;
            }
            self.pos = (self.pos + size as usize).min(self.data.len());
        }
        false
    }

    fn consumed(&self) -> usize {
        self.pos
    }
}

#[derive(Debug, Clone, Copy)]
struct DictEntry {
    prefix: u16,
    pixel: u8,
}

/// Decoder state for a single image's pixel stream.
pub(crate) struct LzwState {
    dict: Vec<DictEntry>,
    min_code_size: u8,
    clear_code: u16,
    end_code: u16,
    code_size: u8,
    next_code: u16,
    prev_code: Option<u16>,
    stack: Vec<u8>,
}

impl LzwState {
    pub(crate) fn new(min_code_size: u8) -> Self {
        let clear_code = 1u16 << min_code_size;
        let mut state = Self {
            dict: vec![DictEntry { prefix: NO_PREFIX, pixel: 0 }; MAX_CODES],
            min_code_size,
            clear_code,
            end_code: clear_code + 1,
            code_size: min_code_size + 1,
            next_code: clear_code + 2,
            prev_code: None,
            stack: Vec::with_capacity(MAX_CODES),
        };
        for code in 0..clear_code {
            state.dict[code as usize] = DictEntry { prefix: NO_PREFIX, pixel: code as u8 };
        }
        state
    }

    fn reset(&mut self) {
        self.code_size = self.min_code_size + 1;
        self.next_code = self.end_code + 1;
        self.prev_code = None;
    }

    /// Expand `code` onto the stack (last pixel first); returns its first pixel.
    fn expand(&mut self, code: u16) -> std::result::Result<u8, DecodeError> {
        self.stack.clear();
        let mut current = code;
        loop {
            let entry = self.dict[current as usize];
            self.stack.push(entry.pixel);
            if entry.prefix == NO_PREFIX {
                return Ok(entry.pixel);
            }
            if entry.prefix == current || self.stack.len() >= MAX_CODES {
                return Err(DecodeError::CircularEntry { code: current });
            }
            current = entry.prefix;
        }
    }

    fn add_entry(&mut self, prefix: u16, pixel: u8) {
        if (self.next_code as usize) < MAX_CODES {
            self.dict[self.next_code as usize] = DictEntry { prefix, pixel };
            self.next_code += 1;
            if self.next_code == (1u16 << self.code_size) && self.code_size < MAX_CODE_SIZE {
                self.code_size += 1;
            }
        }
    }

    /// Process one data code, leaving its pixels on the stack.
    fn process(&mut self, code: u16) -> std::result::Result<(), DecodeError> {
        let invalid = DecodeError::InvalidCode { code, next: self.next_code };
        match self.prev_code {
            None => {
                if code >= self.clear_code {
                    return Err(invalid);
                }
                self.expand(code)?;
            }
            Some(prev) => {
                if code > self.next_code || code as usize >= MAX_CODES {
                    return Err(invalid);
                }
                // KwKwK: the code names the entry about to be defined.
                let defining = code == self.next_code;
                let first = if defining { self.expand(prev)? } else { self.expand(code)? };
                self.add_entry(prev, first);
                if defining {
                    self.expand(code)?;
                }
            }
        }
        self.prev_code = Some(code);
        Ok(())
    }
}

/// Result of decompressing one image's pixel stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LzwOutput {
    /// Decoded indices, capped at the requested limit.
    pub pixels: Vec<u8>,
    /// Total indices the stream produced, including any beyond the cap.
    pub produced: usize,
    /// Bytes consumed, from the code size byte through the block terminator.
    pub consumed: usize,
}

/// Decompress an LZW stream that starts at the minimum code size byte.
///
/// At most `limit` indices are kept; decoding still runs to the end code so
/// the consumed length covers the whole stream.
pub fn decompress(data: &[u8], limit: usize) -> Result<LzwOutput> {
    let min_code_size = *data.first().ok_or(FormatError::Truncated {
        what: "LZW code size",
        needed: 1,
        available: 0,
    })?;
    if !LZW_MIN_CODE_SIZES.contains(&min_code_size) {
        return Err(FormatError::InvalidMinCodeSize(min_code_size).into());
    }

    let mut state = LzwState::new(min_code_size);
    let mut bits = SubBlockBits::new(&data[1..]);
    let mut pixels = Vec::with_capacity(limit.min(1 << 20));
    let produced = run(&mut state, &mut bits, &mut pixels, limit)?;

    if !bits.skip_to_terminator() {
        warn!("image data ended without a sub-block terminator");
    }

    trace!(min_code_size, produced, consumed = bits.consumed() + 1, "LZW stream decoded");
    Ok(LzwOutput {
        pixels,
        produced,
        consumed: bits.consumed() + 1,
    })
}

fn run(
    state: &mut LzwState,
    bits: &mut SubBlockBits<'_>,
    out: &mut Vec<u8>,
    limit: usize,
) -> std::result::Result<usize, DecodeError> {
    let mut produced = 0usize;
    loop {
        let code = match bits.read_code(state.code_size)? {
            Code::Value(code) => code,
            Code::EndOfData => return Err(DecodeError::MissingEndCode),
        };

        if code == state.clear_code {
            state.reset();
            continue;
        }
        if code == state.end_code {
            return Ok(produced);
        }

        state.process(code)?;
        produced += state.stack.len();
        let room = limit.saturating_sub(out.len());
        out.extend(state.stack.iter().rev().take(room));
    }
}
