//! Block walking and single-frame decoding.

use tracing::{debug, trace, warn};

use super::descriptor::ImageDescriptor;
use super::lzw;
use super::palette::ColorTable;
use super::{
    check_area, GraphicControlInfo, APPLICATION_LABEL, COMMENT_LABEL, DEFAULT_MAX_PIXELS,
    EXTENSION_INTRODUCER, GRAPHIC_CONTROL_LABEL, IMAGE_SEPARATOR, PLAIN_TEXT_LABEL, TRAILER,
};
use crate::cursor::ByteCursor;
use crate::error::{FormatError, Result};

/// Interlace passes as (first row, row step).
const INTERLACE_PASSES: [(usize, usize); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];

/// One decoded image block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    /// The image's descriptor.
    pub descriptor: ImageDescriptor,
    /// Graphic control extension that preceded the image, if any.
    pub graphic_control: Option<GraphicControlInfo>,
    /// Palette indices, `width * height` bytes in top-to-bottom row order.
    pub pixels: Vec<u8>,
}

impl DecodedFrame {
    /// Frame width.
    pub fn width(&self) -> u16 {
        self.descriptor.width
    }

    /// Frame height.
    pub fn height(&self) -> u16 {
        self.descriptor.height
    }

    /// Local color table, if the frame has one.
    pub fn local_color_table(&self) -> Option<&ColorTable> {
        self.descriptor.local_color_table.as_ref()
    }

    /// Transparent index declared by the graphic control extension.
    pub fn transparent_index(&self) -> Option<u8> {
        self.graphic_control.as_ref().and_then(|g| g.transparent_index())
    }
}

/// Walks the block stream after the header, one image at a time.
#[derive(Debug, Clone)]
pub struct FrameDecoder<'a> {
    data: &'a [u8],
    offset: usize,
    max_pixels: u64,
    finished: bool,
}

impl<'a> FrameDecoder<'a> {
    /// Start walking `data` at `offset`, normally just past the header.
    pub fn new(data: &'a [u8], offset: usize) -> Self {
        Self {
            data,
            offset: offset.min(data.len()),
            max_pixels: DEFAULT_MAX_PIXELS,
            finished: false,
        }
    }

    /// Refuse frames whose area exceeds `max_pixels`.
    #[must_use]
    pub fn max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    /// Absolute offset of the next unread block.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Decode the next image block, skipping any extensions before it.
    ///
    /// Returns `Ok(None)` at the trailer or when the input ends on a block
    /// boundary. The offset only advances when a frame is returned.
    pub fn next_frame(&mut self) -> Result<Option<DecodedFrame>> {
        let rest = &self.data[self.offset..];
        let mut cursor = ByteCursor::new(rest);
        let mut graphic_control = None;

        loop {
            let block_offset = self.offset + cursor.position();
            let Some(introducer) = cursor.peek_u8() else {
                trace!(offset = block_offset, "input ended without a trailer");
                return Ok(None);
            };
            trace!(introducer, offset = block_offset, "block");

            match introducer {
                EXTENSION_INTRODUCER => {
                    cursor.skip(1, "extension")?;
                    let label = cursor.read_u8("extension label")?;
                    if label == GRAPHIC_CONTROL_LABEL {
                        graphic_control = Some(GraphicControlInfo::load(&mut cursor)?);
                    } else {
                        trace!(label, kind = extension_name(label), "skipping extension");
                        cursor.skip_sub_blocks("extension")?;
                    }
                }
                IMAGE_SEPARATOR => {
                    cursor.skip(1, "image separator")?;
                    let (frame, consumed) = decode_image(
                        &rest[cursor.position()..],
                        graphic_control,
                        self.max_pixels,
                    )?;
                    cursor.skip(consumed, "image data")?;
                    self.offset += cursor.position();
                    return Ok(Some(frame));
                }
                TRAILER => return Ok(None),
                other => {
                    return Err(FormatError::UnknownBlock {
                        introducer: other,
                        offset: block_offset,
                    }
                    .into())
                }
            }
        }
    }
}

impl Iterator for FrameDecoder<'_> {
    type Item = Result<DecodedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_frame() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Display name of an extension label.
fn extension_name(label: u8) -> &'static str {
    match label {
        GRAPHIC_CONTROL_LABEL => "graphic control",
        COMMENT_LABEL => "comment",
        APPLICATION_LABEL => "application",
        PLAIN_TEXT_LABEL => "plain text",
        _ => "unknown",
    }
}

/// Decode one image starting just after the `0x2C` separator.
///
/// Returns the frame and the bytes consumed.
fn decode_image(
    data: &[u8],
    graphic_control: Option<GraphicControlInfo>,
    max_pixels: u64,
) -> Result<(DecodedFrame, usize)> {
    let (descriptor, header_len) = ImageDescriptor::load(data)?;
    check_area(descriptor.width, descriptor.height, max_pixels)?;
    let expected = descriptor.pixel_count();

    let output = lzw::decompress(&data[header_len..], expected)?;
    let mut pixels = output.pixels;

    if output.produced < expected {
        warn!(
            produced = output.produced,
            expected, "image data short, padding with index 0"
        );
        pixels.resize(expected, 0);
    } else if output.produced > expected {
        debug!(
            produced = output.produced,
            expected, "image data longer than frame, extra pixels dropped"
        );
    }

    if descriptor.interlaced {
        pixels = deinterlace(&pixels, descriptor.width as usize, descriptor.height as usize);
    }

    let frame = DecodedFrame {
        descriptor,
        graphic_control,
        pixels,
    };
    Ok((frame, header_len + output.consumed))
}

/// Destination row of each stored row of an interlaced image, in storage order.
pub fn interlaced_rows(height: usize) -> impl Iterator<Item = usize> {
    INTERLACE_PASSES
        .into_iter()
        .flat_map(move |(start, step)| (start..height).step_by(step))
}

/// Reorder interlaced rows into natural top-to-bottom order.
pub fn deinterlace(data: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut output = vec![0u8; width * height];
    if width == 0 {
        return output;
    }
    for (src, dst_row) in data.chunks_exact(width).zip(interlaced_rows(height)) {
        output[dst_row * width..(dst_row + 1) * width].copy_from_slice(src);
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, ImageError};

    /// A 2x2 image: descriptor, then LZW codes clear, 0, 1, 2, 3, end.
    fn image_block(flags: u8) -> Vec<u8> {
        let mut data = vec![IMAGE_SEPARATOR, 0, 0, 0, 0, 2, 0, 2, 0, flags];
        data.extend_from_slice(&[0x02, 0x03, 0x44, 0x34, 0x05, 0x00]);
        data
    }

    #[test]
    fn test_extension_name() {
        assert_eq!(extension_name(COMMENT_LABEL), "comment");
        assert_eq!(extension_name(APPLICATION_LABEL), "application");
        assert_eq!(extension_name(PLAIN_TEXT_LABEL), "plain text");
        assert_eq!(extension_name(0x42), "unknown");
    }

    #[test]
    fn test_interlaced_rows() {
        let rows: Vec<usize> = interlaced_rows(8).collect();
        assert_eq!(rows, vec![0, 4, 2, 6, 1, 3, 5, 7]);
        let rows: Vec<usize> = interlaced_rows(3).collect();
        assert_eq!(rows, vec![0, 2, 1]);
        assert_eq!(interlaced_rows(1).collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_deinterlace() {
        let width = 4;
        let height = 8;
        let mut interlaced = Vec::new();
        for row in [0u8, 4, 2, 6, 1, 3, 5, 7] {
            interlaced.extend(vec![row; width]);
        }

        let result = deinterlace(&interlaced, width, height);
        for y in 0..height {
            assert!(result[y * width..(y + 1) * width].iter().all(|&p| p == y as u8));
        }
    }

    #[test]
    fn test_decode_image_block() {
        let data = image_block(0x00);
        let mut decoder = FrameDecoder::new(&data, 0);
        let frame = decoder.next_frame().unwrap().unwrap();
        assert_eq!(frame.pixels, vec![0, 1, 2, 3]);
        assert_eq!((frame.width(), frame.height()), (2, 2));
        assert_eq!(decoder.offset(), data.len());
        assert!(decoder.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_graphic_control_attaches_to_next_image() {
        let mut data = vec![EXTENSION_INTRODUCER, GRAPHIC_CONTROL_LABEL, 4, 0x01, 0, 0, 3, 0];
        // A comment extension in between is skipped.
        data.extend_from_slice(&[EXTENSION_INTRODUCER, 0xFE, 3, b'h', b'i', b'!', 0]);
        data.extend(image_block(0x00));
        data.push(TRAILER);

        let frames: Vec<_> = FrameDecoder::new(&data, 0).collect::<Result<_>>().unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].transparent_index(), Some(3));
    }

    #[test]
    fn test_application_extension_skipped() {
        let mut data = vec![EXTENSION_INTRODUCER, 0xFF, 11];
        data.extend_from_slice(b"NETSCAPE2.0");
        data.extend_from_slice(&[3, 1, 0, 0, 0]);
        data.extend(image_block(0x00));

        let frame = FrameDecoder::new(&data, 0).next_frame().unwrap().unwrap();
        assert_eq!(frame.pixels, vec![0, 1, 2, 3]);
        assert!(frame.graphic_control.is_none());
    }

    #[test]
    fn test_unknown_block() {
        let data = [0x00, 0x01];
        let err = FrameDecoder::new(&data, 0).next_frame().unwrap_err();
        assert!(matches!(
            err,
            ImageError::Format(FormatError::UnknownBlock { introducer: 0x00, offset: 0 })
        ));
    }

    #[test]
    fn test_short_stream_is_padded() {
        // Claims 3x2 but only encodes four pixels.
        let mut data = image_block(0x00);
        data[5] = 3;
        let frame = FrameDecoder::new(&data, 0).next_frame().unwrap().unwrap();
        assert_eq!(frame.pixels, vec![0, 1, 2, 3, 0, 0]);
    }

    #[test]
    fn test_long_stream_is_truncated() {
        // Claims 1x2 but encodes four pixels.
        let mut data = image_block(0x00);
        data[5] = 1;
        let frame = FrameDecoder::new(&data, 0).next_frame().unwrap().unwrap();
        assert_eq!(frame.pixels, vec![0, 1]);
    }

    #[test]
    fn test_interlaced_block_is_reordered() {
        // Two rows: interlaced storage order for height 2 is 0, 1, so the
        // result matches the progressive decode.
        let data = image_block(0x40);
        let frame = FrameDecoder::new(&data, 0).next_frame().unwrap().unwrap();
        assert!(frame.descriptor.interlaced);
        assert_eq!(frame.pixels, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_missing_end_code_propagates() {
        // clear, 0, then the terminator.
        let mut data = vec![IMAGE_SEPARATOR, 0, 0, 0, 0, 1, 0, 1, 0, 0];
        data.extend_from_slice(&[0x02, 0x01, 0x04, 0x00]);
        let err = FrameDecoder::new(&data, 0).next_frame().unwrap_err();
        assert!(matches!(err, ImageError::Decode(DecodeError::MissingEndCode)));
    }

    #[test]
    fn test_frame_area_limit() {
        let data = image_block(0x00);
        let err = FrameDecoder::new(&data, 0).max_pixels(3).next_frame().unwrap_err();
        assert!(matches!(
            err,
            ImageError::Format(FormatError::DimensionsExceeded { width: 2, height: 2, .. })
        ));
    }

    #[test]
    fn test_iterator_stops_after_error() {
        let data = [0x00];
        let mut decoder = FrameDecoder::new(&data, 0);
        assert!(decoder.next().unwrap().is_err());
        assert!(decoder.next().is_none());
    }
}
