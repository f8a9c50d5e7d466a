//! Logical screen descriptor.

use tracing::debug;

use super::palette::ColorTable;
use super::{GIF87A_SIGNATURE, GIF89A_SIGNATURE};
use crate::cursor::ByteCursor;
use crate::error::{FormatError, Result};

/// Signature plus logical screen descriptor, in bytes.
pub const HEADER_LEN: usize = 13;

/// GIF file header: signature, logical screen descriptor and global color table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GifHeader {
    /// `GIF87a` or `GIF89a`.
    pub version: [u8; 6],
    /// Canvas width.
    pub width: u16,
    /// Canvas height.
    pub height: u16,
    /// Global color table follows the header.
    pub has_global_color_table: bool,
    /// Color resolution (3 bits, as stored).
    pub color_resolution: u8,
    /// Global color table is sorted by importance.
    pub sorted: bool,
    /// Number of global color table entries (`2 << exponent`).
    pub table_size: usize,
    /// Background color index.
    pub background_index: u8,
    /// Pixel aspect ratio byte.
    pub pixel_aspect: u8,
    /// Global color table, when the flag is set.
    pub global_color_table: Option<ColorTable>,
}

impl GifHeader {
    /// Parse the header from the start of `data`.
    ///
    /// Returns the header and the bytes consumed: 13, plus three per
    /// global color table entry.
    pub fn load(data: &[u8]) -> Result<(Self, usize)> {
        let mut cursor = ByteCursor::new(data);

        let signature = cursor.read_bytes(6, "GIF signature")?;
        if signature != GIF87A_SIGNATURE && signature != GIF89A_SIGNATURE {
            return Err(FormatError::InvalidSignature(signature.to_vec()).into());
        }
        let mut version = [0u8; 6];
        version.copy_from_slice(signature);

        let width = cursor.read_u16_le("logical screen descriptor")?;
        let height = cursor.read_u16_le("logical screen descriptor")?;
        if width == 0 || height == 0 {
            return Err(FormatError::ZeroDimension { width, height }.into());
        }

        let flags = cursor.read_u8("logical screen descriptor")?;
        let background_index = cursor.read_u8("logical screen descriptor")?;
        let pixel_aspect = cursor.read_u8("logical screen descriptor")?;

        let has_global_color_table = flags & 0x80 != 0;
        let table_size = 2usize << (flags & 0x07);

        let global_color_table = if has_global_color_table {
            let (table, consumed) = ColorTable::load(&data[cursor.position()..], table_size)?;
            cursor.skip(consumed, "global color table")?;
            Some(table)
        } else {
            None
        };

        debug!(
            width,
            height,
            global_colors = global_color_table.as_ref().map_or(0, |t| t.len()),
            "parsed GIF header"
        );

        let header = GifHeader {
            version,
            width,
            height,
            has_global_color_table,
            color_resolution: (flags >> 4) & 0x07,
            sorted: flags & 0x08 != 0,
            table_size,
            background_index,
            pixel_aspect,
            global_color_table,
        };
        Ok((header, cursor.position()))
    }

    /// Whether the file declares the 89a revision.
    pub fn is_gif89a(&self) -> bool {
        &self.version == GIF89A_SIGNATURE
    }
}
