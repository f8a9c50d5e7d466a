//! CRC-32 for chunk trailers.

use super::ChunkType;

/// Running CRC-32 (polynomial `0xEDB88320`), as used by PNG and zlib.
#[derive(Debug, Clone, Default)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl Crc32 {
    /// Start a new checksum.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed more bytes.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Final checksum value.
    pub fn finalize(self) -> u32 {
        self.hasher.finalize()
    }
}

/// CRC-32 of a byte string.
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// CRC-32 of a chunk, covering the type and the data but not the length.
pub fn chunk_crc(chunk_type: ChunkType, data: &[u8]) -> u32 {
    let mut crc = Crc32::new();
    crc.update(chunk_type.as_bytes());
    crc.update(data);
    crc.finalize()
}
