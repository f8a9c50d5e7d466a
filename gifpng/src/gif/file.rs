//! Whole-file loading and canvas compositing.

use std::path::Path;

use tracing::{debug, warn};

use super::frame::{DecodedFrame, FrameDecoder};
use super::header::GifHeader;
use super::palette::{ColorTable, Rgb, MAX_PALETTE_ENTRIES};
use super::{check_area, DEFAULT_MAX_PIXELS};
use crate::error::{DecodeError, FormatError, Result};
use crate::options::MissingPalettePolicy;

/// Where a canvas's palette came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteSource {
    /// The frame's local color table.
    Local,
    /// The header's global color table.
    Global,
    /// No table in the file; a gray ramp was substituted.
    Synthesized,
}

/// Full-size indexed image ready for PNG encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    /// Canvas width.
    pub width: u32,
    /// Canvas height.
    pub height: u32,
    /// Palette indices, `width * height` bytes, row-major.
    pub pixels: Vec<u8>,
    /// Palette covering every index in `pixels`.
    pub palette: ColorTable,
    /// Origin of `palette`.
    pub palette_source: PaletteSource,
    /// Index rendered fully transparent, if any.
    pub transparent_index: Option<u8>,
    /// Index used outside the frame's bounding box.
    pub background_index: u8,
}

impl Canvas {
    /// Row `y` of the canvas, or `None` past the last row.
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let width = self.width as usize;
        let start = y as usize * width;
        self.pixels.get(start..start + width)
    }
}

/// A GIF with one decoded frame.
#[derive(Debug, Clone)]
pub struct GifFile {
    header: GifHeader,
    frame: DecodedFrame,
    frame_index: usize,
}

impl GifFile {
    /// Parse the header and decode frame `frame_index` (zero-based).
    ///
    /// Every earlier frame is decoded and discarded to find where the
    /// requested one starts.
    pub fn load(data: &[u8], frame_index: usize) -> Result<Self> {
        Self::load_with_limit(data, frame_index, DEFAULT_MAX_PIXELS)
    }

    /// Like [`GifFile::load`], refusing any canvas or frame larger than
    /// `max_pixels`.
    pub fn load_with_limit(data: &[u8], frame_index: usize, max_pixels: u64) -> Result<Self> {
        let (header, header_len) = GifHeader::load(data)?;
        check_area(header.width, header.height, max_pixels)?;
        let mut frames = FrameDecoder::new(data, header_len).max_pixels(max_pixels);

        let mut decoded = 0usize;
        let frame = loop {
            match frames.next_frame()? {
                Some(frame) if decoded == frame_index => break frame,
                Some(_) => decoded += 1,
                None => {
                    return Err(DecodeError::FrameNotFound {
                        index: frame_index,
                        available: decoded,
                    }
                    .into())
                }
            }
        };

        debug!(
            frame_index,
            width = frame.width(),
            height = frame.height(),
            left = frame.descriptor.left,
            top = frame.descriptor.top,
            interlaced = frame.descriptor.interlaced,
            "decoded GIF frame"
        );

        Ok(Self {
            header,
            frame,
            frame_index,
        })
    }

    /// Read `path` and decode frame `frame_index`.
    pub fn open(path: impl AsRef<Path>, frame_index: usize) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::load(&data, frame_index)
    }

    /// Count the image blocks in `data`.
    ///
    /// Each image is fully decoded, so a corrupt frame anywhere in the file
    /// is reported as an error.
    pub fn count_frames(data: &[u8]) -> Result<usize> {
        let (_, header_len) = GifHeader::load(data)?;
        FrameDecoder::new(data, header_len).try_fold(0, |count, frame| frame.map(|_| count + 1))
    }

    /// The file header.
    pub fn header(&self) -> &GifHeader {
        &self.header
    }

    /// The decoded frame.
    pub fn frame(&self) -> &DecodedFrame {
        &self.frame
    }

    /// Which frame was decoded.
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Composite the frame onto a full canvas, gray-ramp fallback palette.
    pub fn image_data(&self, background: Option<Rgb>) -> Result<Canvas> {
        self.image_data_with(background, MissingPalettePolicy::default())
    }

    /// Composite the frame onto a full canvas.
    ///
    /// The palette is the frame's local table, else the global table, else
    /// whatever `policy` prescribes. `background` is matched to the nearest
    /// palette entry; without it the header's background index is used.
    pub fn image_data_with(
        &self,
        background: Option<Rgb>,
        policy: MissingPalettePolicy,
    ) -> Result<Canvas> {
        let (mut palette, palette_source) = self.effective_palette(policy)?;

        let background_index = match background.and_then(|c| palette.nearest_color_index(c)) {
            Some(index) => index,
            None => self.header.background_index,
        };

        let width = self.header.width as usize;
        let height = self.header.height as usize;
        let mut pixels = vec![background_index; width * height];

        let desc = &self.frame.descriptor;
        let frame_width = desc.width as usize;
        let left = desc.left as usize;
        let top = desc.top as usize;
        if left < width {
            let visible = frame_width.min(width - left);
            for (y, row) in self.frame.pixels.chunks_exact(frame_width).enumerate() {
                let canvas_y = top + y;
                if canvas_y >= height {
                    break;
                }
                let start = canvas_y * width + left;
                pixels[start..start + visible].copy_from_slice(&row[..visible]);
            }
        }

        let transparent_index = self.frame.transparent_index();
        let max_index = pixels
            .iter()
            .copied()
            .chain(transparent_index)
            .max()
            .unwrap_or(0)
            .max(background_index) as usize;
        if max_index >= palette.len() {
            warn!(
                max_index,
                palette_len = palette.len(),
                "pixel indices exceed palette, padding with black"
            );
            palette.pad_to((max_index + 1).min(MAX_PALETTE_ENTRIES));
        }

        debug!(?palette_source, colors = palette.len(), background_index, "composited canvas");

        Ok(Canvas {
            width: self.header.width as u32,
            height: self.header.height as u32,
            pixels,
            palette,
            palette_source,
            transparent_index,
            background_index,
        })
    }

    fn effective_palette(&self, policy: MissingPalettePolicy) -> Result<(ColorTable, PaletteSource)> {
        if let Some(local) = self.frame.local_color_table() {
            return Ok((local.clone(), PaletteSource::Local));
        }
        if let Some(global) = &self.header.global_color_table {
            return Ok((global.clone(), PaletteSource::Global));
        }
        match policy {
            MissingPalettePolicy::GrayscaleRamp => {
                Ok((ColorTable::grayscale(MAX_PALETTE_ENTRIES), PaletteSource::Synthesized))
            }
            MissingPalettePolicy::Reject => Err(FormatError::MissingPalette.into()),
        }
    }
}
