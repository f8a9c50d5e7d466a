//! GIF decoding.
//!
//! Reads GIF87a and GIF89a streams far enough to extract a single frame:
//!
//! - Logical screen descriptor and global color table
//! - Graphic control extensions (transparency, disposal, delay)
//! - All other extensions are skipped structurally
//! - LZW decompression over sub-block framing
//! - Interlaced images

mod descriptor;
mod file;
mod frame;
mod header;
pub mod lzw;
mod palette;

pub use descriptor::ImageDescriptor;
pub use file::{Canvas, GifFile, PaletteSource};
pub use frame::{deinterlace, interlaced_rows, DecodedFrame, FrameDecoder};
pub use header::{GifHeader, HEADER_LEN};
pub use palette::{ColorTable, ParseRgbError, Rgb, MAX_PALETTE_ENTRIES};

use crate::cursor::ByteCursor;
use crate::error::{FormatError, Result};

/// Default cap on canvas and frame area, in pixels.
pub const DEFAULT_MAX_PIXELS: u64 = 1 << 26;

/// Valid range for the LZW minimum code size byte.
pub(crate) const LZW_MIN_CODE_SIZES: std::ops::RangeInclusive<u8> = 2..=8;

/// GIF87a file signature.
pub const GIF87A_SIGNATURE: &[u8; 6] = b"GIF87a";
/// GIF89a file signature.
pub const GIF89A_SIGNATURE: &[u8; 6] = b"GIF89a";

/// Extension introducer byte.
pub const EXTENSION_INTRODUCER: u8 = 0x21;
/// Image separator byte.
pub const IMAGE_SEPARATOR: u8 = 0x2C;
/// File trailer byte.
pub const TRAILER: u8 = 0x3B;

/// Graphic control extension label.
pub const GRAPHIC_CONTROL_LABEL: u8 = 0xF9;
/// Comment extension label.
pub const COMMENT_LABEL: u8 = 0xFE;
/// Application extension label.
pub const APPLICATION_LABEL: u8 = 0xFF;
/// Plain text extension label.
pub const PLAIN_TEXT_LABEL: u8 = 0x01;

/// Reject a `width` x `height` area larger than `max_pixels`.
pub(crate) fn check_area(width: u16, height: u16, max_pixels: u64) -> Result<()> {
    if width as u64 * height as u64 > max_pixels {
        return Err(FormatError::DimensionsExceeded {
            width,
            height,
            max_pixels,
        }
        .into());
    }
    Ok(())
}

/// GIF frame disposal method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisposalMethod {
    /// No disposal specified.
    #[default]
    None,
    /// Do not dispose.
    Keep,
    /// Restore to background color.
    RestoreBackground,
    /// Restore to previous frame.
    RestorePrevious,
    /// Values 4-7, reserved by the format.
    Reserved(u8),
}

impl DisposalMethod {
    /// Parse the disposal method from the packed GCE flags byte.
    pub fn from_flags(flags: u8) -> Self {
        match (flags >> 2) & 0x07 {
            0 => DisposalMethod::None,
            1 => DisposalMethod::Keep,
            2 => DisposalMethod::RestoreBackground,
            3 => DisposalMethod::RestorePrevious,
            other => DisposalMethod::Reserved(other),
        }
    }
}

/// Graphic control extension (label `0xF9`).
///
/// Applies to the image block that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphicControlInfo {
    /// Disposal method.
    pub disposal: DisposalMethod,
    /// Wait for user input before continuing.
    pub user_input: bool,
    /// The transparent index field is meaningful.
    pub has_transparency: bool,
    /// Delay in hundredths of a second.
    pub delay: u16,
    /// Transparent color index.
    pub transparent_index: u8,
}

impl GraphicControlInfo {
    /// Parse the extension body that follows the `0xF9` label.
    ///
    /// Consumes the block size byte, the fixed fields and the trailing
    /// sub-blocks through the terminator.
    pub(crate) fn load(cursor: &mut ByteCursor<'_>) -> Result<Self> {
        let block_size = cursor.read_u8("graphic control extension")? as usize;
        if block_size < 4 {
            return Err(FormatError::Truncated {
                what: "graphic control extension",
                needed: 4,
                available: block_size,
            }
            .into());
        }
        let flags = cursor.read_u8("graphic control extension")?;
        let delay = cursor.read_u16_le("graphic control extension")?;
        let transparent_index = cursor.read_u8("graphic control extension")?;
        cursor.skip(block_size - 4, "graphic control extension")?;
        cursor.skip_sub_blocks("graphic control extension")?;

        Ok(GraphicControlInfo {
            disposal: DisposalMethod::from_flags(flags),
            user_input: flags & 0x02 != 0,
            has_transparency: flags & 0x01 != 0,
            delay,
            transparent_index,
        })
    }

    /// Transparent index, if transparency is enabled.
    pub fn transparent_index(&self) -> Option<u8> {
        self.has_transparency.then_some(self.transparent_index)
    }

    /// Frame delay in milliseconds.
    pub fn delay_ms(&self) -> u32 {
        self.delay as u32 * 10
    }
}
