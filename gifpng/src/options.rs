//! Conversion options.

use crate::gif::{Rgb, DEFAULT_MAX_PIXELS};
use crate::png::{CompressionLevel, PngConfig};

/// What to do when a frame has neither a local nor a global color table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MissingPalettePolicy {
    /// Use a 256-entry gray ramp, so index `i` renders as `(i, i, i)`.
    #[default]
    GrayscaleRamp,
    /// Fail with [`FormatError::MissingPalette`](crate::FormatError::MissingPalette).
    Reject,
}

/// GIF to PNG conversion options using builder pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConvertOptions {
    /// Zero-based frame to extract.
    pub frame_index: usize,
    /// Color the area outside the frame should approximate; `None` uses the
    /// header's background index.
    pub background: Option<Rgb>,
    /// zlib compression level for the image data.
    pub compression: CompressionLevel,
    /// Handling of palette-less images.
    pub missing_palette: MissingPalettePolicy,
    /// Largest canvas or frame area accepted, in pixels.
    pub max_pixels: u64,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ConvertOptions {
    /// Options for the first frame, best compression.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frame_index: 0,
            background: None,
            compression: CompressionLevel::Best,
            missing_palette: MissingPalettePolicy::GrayscaleRamp,
            max_pixels: DEFAULT_MAX_PIXELS,
        }
    }

    /// Set the frame to extract.
    #[must_use]
    pub fn frame_index(mut self, index: usize) -> Self {
        self.frame_index = index;
        self
    }

    /// Set the background color override.
    #[must_use]
    pub fn background(mut self, color: impl Into<Option<Rgb>>) -> Self {
        self.background = color.into();
        self
    }

    /// Set the compression level.
    #[must_use]
    pub fn compression(mut self, level: CompressionLevel) -> Self {
        self.compression = level;
        self
    }

    /// Set the palette-less image policy.
    #[must_use]
    pub fn missing_palette(mut self, policy: MissingPalettePolicy) -> Self {
        self.missing_palette = policy;
        self
    }

    /// Set the pixel area limit.
    #[must_use]
    pub fn max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    /// Encoder configuration derived from these options.
    pub fn png_config(&self) -> PngConfig {
        PngConfig {
            compression: self.compression,
        }
    }
}
