//! GIF to PNG conversion.
//!
//! This crate decodes a single frame of a GIF87a/GIF89a file and re-encodes it
//! as an indexed-color PNG:
//! - GIF header, color tables and extension parsing
//! - Variable-width LZW decompression over sub-block framing
//! - Interlaced row reconstruction
//! - Compositing onto the logical screen with a background fill
//! - PNG chunk encoding with palette and single-index transparency
//!
//! ## Features
//!
//! - `serde` - `Serialize`/`Deserialize` for the option types
//!
//! ## Example
//!
//! ```no_run
//! use gifpng::{gif_to_png, ConvertOptions, Rgb};
//!
//! # let gif_data: Vec<u8> = vec![];
//! let options = ConvertOptions::new().background(Rgb::new(255, 255, 255));
//! let png_data = gif_to_png(&gif_data, &options)?;
//! # Ok::<(), gifpng::ImageError>(())
//! ```
//!
//! Lower-level access goes through [`GifFile`] and [`PngEncoder`]:
//!
//! ```no_run
//! use gifpng::{GifFile, PngEncoder};
//!
//! # let gif_data: Vec<u8> = vec![];
//! let gif = GifFile::load(&gif_data, 0)?;
//! let canvas = gif.image_data(None)?;
//! let png_data = PngEncoder::new().encode(&canvas)?;
//! # Ok::<(), gifpng::ImageError>(())
//! ```

#![warn(missing_docs)]

mod cursor;
mod error;
mod options;

pub mod gif;
pub mod png;

use std::path::Path;

use tracing::debug;

pub use error::{DecodeError, FormatError, ImageError, Result};
pub use gif::{Canvas, ColorTable, GifFile, PaletteSource, Rgb};
pub use options::{ConvertOptions, MissingPalettePolicy};
pub use png::{CompressionLevel, PngConfig, PngEncoder};

/// Convert one frame of a GIF to PNG.
///
/// Either a complete PNG is returned or nothing is; malformed input never
/// produces partial output.
pub fn gif_to_png(data: &[u8], options: &ConvertOptions) -> Result<Vec<u8>> {
    let gif = GifFile::load_with_limit(data, options.frame_index, options.max_pixels)?;
    let canvas = gif.image_data_with(options.background, options.missing_palette)?;
    let png = PngEncoder::with_config(options.png_config()).encode(&canvas)?;
    debug!(
        input = data.len(),
        output = png.len(),
        frame = options.frame_index,
        "converted GIF to PNG"
    );
    Ok(png)
}

/// Read a GIF file and convert one frame to PNG.
pub fn gif_file_to_png(path: impl AsRef<Path>, options: &ConvertOptions) -> Result<Vec<u8>> {
    let data = std::fs::read(path.as_ref())?;
    gif_to_png(&data, options)
}

/// Whether `data` starts with a GIF signature.
pub fn is_gif(data: &[u8]) -> bool {
    detect_format(data) == Some(ImageFormat::Gif)
}

/// Detect image format from magic bytes.
pub fn detect_format(data: &[u8]) -> Option<ImageFormat> {
    if data.starts_with(gif::GIF87A_SIGNATURE) || data.starts_with(gif::GIF89A_SIGNATURE) {
        return Some(ImageFormat::Gif);
    }

    if data.starts_with(&png::PNG_SIGNATURE) {
        return Some(ImageFormat::Png);
    }

    None
}

/// Image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// GIF image.
    Gif,
    /// PNG image.
    Png,
}
