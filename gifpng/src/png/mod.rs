//! PNG output.
//!
//! Only what an indexed-color conversion needs:
//! - 8-bit palette images (color type 3)
//! - PLTE and tRNS chunks
//! - A single zlib-compressed IDAT
//! - A chunk reader for checking what was written

mod crc;
mod encoder;

pub use crc::{chunk_crc, crc32, Crc32};
pub use encoder::{PngConfig, PngEncoder};

use byteorder::{BigEndian, ByteOrder};

use crate::error::{FormatError, Result};

/// PNG signature bytes.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Length, type and CRC fields around each chunk's data.
pub const CHUNK_OVERHEAD: usize = 12;

/// IHDR color type for palette images.
pub const COLOR_TYPE_INDEXED: u8 = 3;

/// IHDR bit depth; one palette index per byte.
pub const BIT_DEPTH: u8 = 8;

/// PNG chunk type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkType([u8; 4]);

impl ChunkType {
    /// IHDR - Image header.
    pub const IHDR: Self = Self(*b"IHDR");
    /// PLTE - Palette.
    pub const PLTE: Self = Self(*b"PLTE");
    /// IDAT - Image data.
    pub const IDAT: Self = Self(*b"IDAT");
    /// IEND - Image end.
    pub const IEND: Self = Self(*b"IEND");
    /// tRNS - Transparency.
    pub const TRNS: Self = Self(*b"tRNS");

    /// Create from bytes.
    pub fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Get bytes.
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl std::fmt::Display for ChunkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// zlib compression level for IDAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum CompressionLevel {
    /// No compression (level 0).
    None,
    /// Fast compression (level 1).
    Fast,
    /// Default compression (level 6).
    Default,
    /// Best compression (level 9).
    #[default]
    Best,
    /// Custom level, clamped to 0-9.
    Custom(u8),
}

impl CompressionLevel {
    /// Get numeric level.
    pub fn level(&self) -> u8 {
        match self {
            CompressionLevel::None => 0,
            CompressionLevel::Fast => 1,
            CompressionLevel::Default => 6,
            CompressionLevel::Best => 9,
            CompressionLevel::Custom(l) => (*l).min(9),
        }
    }
}

impl std::str::FromStr for CompressionLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(CompressionLevel::None),
            "fast" => Ok(CompressionLevel::Fast),
            "default" => Ok(CompressionLevel::Default),
            "best" => Ok(CompressionLevel::Best),
            other => match other.parse::<u8>() {
                Ok(level) if level <= 9 => Ok(CompressionLevel::Custom(level)),
                _ => Err(format!(
                    "invalid compression level '{s}', expected none, fast, default, best or 0-9"
                )),
            },
        }
    }
}

/// One chunk read back from an encoded PNG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Chunk type.
    pub chunk_type: ChunkType,
    /// Chunk payload.
    pub data: &'a [u8],
    /// CRC stored in the trailer.
    pub crc: u32,
}

impl Chunk<'_> {
    /// Whether the stored CRC matches the type and data.
    pub fn crc_matches(&self) -> bool {
        chunk_crc(self.chunk_type, self.data) == self.crc
    }
}

/// Iterator over the chunks of a PNG file.
#[derive(Debug, Clone)]
pub struct Chunks<'a> {
    data: &'a [u8],
    offset: usize,
    done: bool,
}

/// Walk the chunks of `data`, which must start with the PNG signature.
///
/// Iteration ends after IEND or at the end of input. A chunk whose declared
/// length runs past the input yields an error and stops the iterator.
pub fn chunks(data: &[u8]) -> Result<Chunks<'_>> {
    if data.len() < PNG_SIGNATURE.len() || data[..PNG_SIGNATURE.len()] != PNG_SIGNATURE {
        let seen = data.len().min(PNG_SIGNATURE.len());
        return Err(FormatError::InvalidSignature(data[..seen].to_vec()).into());
    }
    Ok(Chunks {
        data,
        offset: PNG_SIGNATURE.len(),
        done: false,
    })
}

impl<'a> Iterator for Chunks<'a> {
    type Item = Result<Chunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.data.len() {
            return None;
        }
        let rest = &self.data[self.offset..];
        if rest.len() < CHUNK_OVERHEAD {
            self.done = true;
            return Some(Err(truncated(CHUNK_OVERHEAD, rest.len())));
        }

        let length = BigEndian::read_u32(&rest[0..4]) as usize;
        let total = match length.checked_add(CHUNK_OVERHEAD) {
            Some(total) if total <= rest.len() => total,
            _ => {
                self.done = true;
                return Some(Err(truncated(length.saturating_add(CHUNK_OVERHEAD), rest.len())));
            }
        };

        let chunk_type = ChunkType::new([rest[4], rest[5], rest[6], rest[7]]);
        let chunk = Chunk {
            chunk_type,
            data: &rest[8..8 + length],
            crc: BigEndian::read_u32(&rest[8 + length..total]),
        };
        self.offset += total;
        self.done = chunk_type == ChunkType::IEND;
        Some(Ok(chunk))
    }
}

fn truncated(needed: usize, available: usize) -> crate::error::ImageError {
    FormatError::Truncated {
        what: "PNG chunk",
        needed,
        available,
    }
    .into()
}
