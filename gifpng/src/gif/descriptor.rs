//! Image descriptor.

use super::palette::ColorTable;
use crate::cursor::ByteCursor;
use crate::error::{FormatError, Result};

/// Local image header that follows the `0x2C` separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    /// Column of the frame's left edge on the canvas.
    pub left: u16,
    /// Row of the frame's top edge on the canvas.
    pub top: u16,
    /// Frame width.
    pub width: u16,
    /// Frame height.
    pub height: u16,
    /// Local color table follows the descriptor.
    pub has_local_color_table: bool,
    /// Rows are stored in four-pass interlaced order.
    pub interlaced: bool,
    /// Local color table is sorted.
    pub sorted: bool,
    /// Number of local color table entries (`2 << exponent`).
    pub table_size: usize,
    /// Local color table, when the flag is set.
    pub local_color_table: Option<ColorTable>,
}

impl ImageDescriptor {
    /// Parse a descriptor starting just after the image separator.
    ///
    /// Returns the descriptor and the bytes consumed.
    pub fn load(data: &[u8]) -> Result<(Self, usize)> {
        let mut cursor = ByteCursor::new(data);

        let left = cursor.read_u16_le("image descriptor")?;
        let top = cursor.read_u16_le("image descriptor")?;
        let width = cursor.read_u16_le("image descriptor")?;
        let height = cursor.read_u16_le("image descriptor")?;
        let flags = cursor.read_u8("image descriptor")?;

        if width == 0 || height == 0 {
            return Err(FormatError::ZeroDimension { width, height }.into());
        }

        let has_local_color_table = flags & 0x80 != 0;
        let table_size = 2usize << (flags & 0x07);

        let local_color_table = if has_local_color_table {
            let (table, consumed) = ColorTable::load(&data[cursor.position()..], table_size)?;
            cursor.skip(consumed, "local color table")?;
            Some(table)
        } else {
            None
        };

        let descriptor = ImageDescriptor {
            left,
            top,
            width,
            height,
            has_local_color_table,
            interlaced: flags & 0x40 != 0,
            sorted: flags & 0x20 != 0,
            table_size,
            local_color_table,
        };
        Ok((descriptor, cursor.position()))
    }

    /// Number of pixels in the frame.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}
