//! PNG encoder implementation.

use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use tracing::debug;

use super::{
    chunk_crc, ChunkType, CompressionLevel, BIT_DEPTH, COLOR_TYPE_INDEXED, PNG_SIGNATURE,
};
use crate::error::{ImageError, Result};
use crate::gif::Canvas;

/// PNG encoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PngConfig {
    /// Compression level.
    pub compression: CompressionLevel,
}

/// Indexed-color PNG encoder.
#[derive(Debug, Clone, Default)]
pub struct PngEncoder {
    config: PngConfig,
}

impl PngEncoder {
    /// Create a new PNG encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create encoder with configuration.
    pub fn with_config(config: PngConfig) -> Self {
        Self { config }
    }

    /// Encoder configuration.
    pub fn config(&self) -> &PngConfig {
        &self.config
    }

    /// Encode a composited canvas to PNG.
    ///
    /// Chunks are written in the order signature, IHDR, PLTE, tRNS (only when
    /// the canvas has a transparent index), IDAT, IEND.
    pub fn encode(&self, canvas: &Canvas) -> Result<Vec<u8>> {
        let expected = canvas.width as usize * canvas.height as usize;
        if canvas.pixels.len() != expected {
            return Err(ImageError::Encoder(format!(
                "canvas holds {} pixels, {}x{} needs {}",
                canvas.pixels.len(),
                canvas.width,
                canvas.height,
                expected
            )));
        }
        if canvas.palette.is_empty() {
            return Err(ImageError::Encoder("palette is empty".into()));
        }

        let mut output = Vec::with_capacity(expected / 2 + 1024);
        output.extend_from_slice(&PNG_SIGNATURE);

        self.write_ihdr(&mut output, canvas.width, canvas.height)?;
        write_chunk(&mut output, ChunkType::PLTE, &canvas.palette.to_bytes())?;

        if let Some(index) = canvas.transparent_index {
            if index as usize >= canvas.palette.len() {
                return Err(ImageError::Encoder(format!(
                    "transparent index {index} outside {}-entry palette",
                    canvas.palette.len()
                )));
            }
            write_chunk(&mut output, ChunkType::TRNS, &transparency(canvas.palette.len(), index))?;
        }

        let raw = scanlines(&canvas.pixels, canvas.width as usize);
        let compressed = self.compress(&raw)?;
        write_chunk(&mut output, ChunkType::IDAT, &compressed)?;

        write_chunk(&mut output, ChunkType::IEND, &[])?;

        debug!(
            width = canvas.width,
            height = canvas.height,
            colors = canvas.palette.len(),
            transparent = canvas.transparent_index.is_some(),
            bytes = output.len(),
            "encoded PNG"
        );
        Ok(output)
    }

    /// Write IHDR chunk.
    fn write_ihdr(&self, output: &mut Vec<u8>, width: u32, height: u32) -> Result<()> {
        let mut data = Vec::with_capacity(13);
        data.write_u32::<BigEndian>(width)?;
        data.write_u32::<BigEndian>(height)?;
        data.push(BIT_DEPTH);
        data.push(COLOR_TYPE_INDEXED);
        data.push(0); // Compression method
        data.push(0); // Filter method
        data.push(0); // Interlace method

        write_chunk(output, ChunkType::IHDR, &data)
    }

    /// Compress filtered scanlines with zlib.
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let level = Compression::new(self.config.compression.level() as u32);
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), level);
        encoder.write_all(data)?;
        Ok(encoder.finish()?)
    }
}

/// Write a chunk: length, type, data, CRC over type and data.
fn write_chunk(output: &mut Vec<u8>, chunk_type: ChunkType, data: &[u8]) -> Result<()> {
    let length = u32::try_from(data.len())
        .map_err(|_| ImageError::Encoder(format!("{chunk_type} chunk too large")))?;
    output.write_u32::<BigEndian>(length)?;
    output.extend_from_slice(chunk_type.as_bytes());
    output.extend_from_slice(data);
    output.write_u32::<BigEndian>(chunk_crc(chunk_type, data))?;
    Ok(())
}

/// Prefix each row with filter type 0 (None).
fn scanlines(pixels: &[u8], width: usize) -> Vec<u8> {
    let width = width.max(1);
    let mut raw = Vec::with_capacity(pixels.len() + pixels.len() / width);
    for row in pixels.chunks_exact(width) {
        raw.push(0);
        raw.extend_from_slice(row);
    }
    raw
}

/// tRNS payload: fully opaque except `index`.
fn transparency(palette_len: usize, index: u8) -> Vec<u8> {
    let mut alpha = vec![0xFF; palette_len];
    if let Some(a) = alpha.get_mut(index as usize) {
        *a = 0x00;
    }
    alpha
}
