//! GIF writer and PNG reader helpers shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Read;

use flate2::read::ZlibDecoder;
use gifpng::gif::{
    APPLICATION_LABEL, COMMENT_LABEL, EXTENSION_INTRODUCER, GRAPHIC_CONTROL_LABEL, PLAIN_TEXT_LABEL,
};
use gifpng::png::{chunks, ChunkType};

/// LZW-compress `pixels` with `weezl`, framed the same way as [`lzw_encode`].
pub fn weezl_encode(pixels: &[u8], min_code_size: u8) -> Vec<u8> {
    let codes = weezl::encode::Encoder::new(weezl::BitOrder::Lsb, min_code_size)
        .encode(pixels)
        .unwrap();
    let mut out = vec![min_code_size];
    out.extend(sub_blocks(&codes));
    out
}

/// LZW-compress `pixels` the way GIF encoders do, framed in sub-blocks.
///
/// The result starts with the minimum code size byte and ends with the
/// zero-length terminator. The dictionary is never cleared once full.
pub fn lzw_encode(pixels: &[u8], min_code_size: u8) -> Vec<u8> {
    let clear = 1u16 << min_code_size;
    let end = clear + 1;
    let mut size = min_code_size + 1;
    let mut next = end + 1;
    let mut table: HashMap<(u16, u8), u16> = HashMap::new();
    let mut writer = CodeWriter::default();

    writer.write(clear, size);
    let mut current: Option<u16> = None;
    for &pixel in pixels {
        assert!((pixel as u16) < clear, "pixel {pixel} needs a larger code size");
        current = match current {
            None => Some(pixel as u16),
            Some(prefix) => match table.get(&(prefix, pixel)) {
                Some(&code) => Some(code),
                None => {
                    writer.write(prefix, size);
                    if next < 4096 {
                        table.insert((prefix, pixel), next);
                        next += 1;
                        if next > (1 << size) && size < 12 {
                            size += 1;
                        }
                    }
                    Some(pixel as u16)
                }
            },
        };
    }
    if let Some(code) = current {
        writer.write(code, size);
        // The decoder defines one more entry on this code unless it is the
        // first after the clear, which can widen the end code.
        if next > end + 1 && next < 4096 {
            next += 1;
            if next > (1 << size) && size < 12 {
                size += 1;
            }
        }
    }
    writer.write(end, size);

    let mut out = vec![min_code_size];
    out.extend(sub_blocks(&writer.finish()));
    out
}

/// Split `data` into 255-byte sub-blocks plus the terminator.
pub fn sub_blocks(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 255 + 2);
    for block in data.chunks(255) {
        out.push(block.len() as u8);
        out.extend_from_slice(block);
    }
    out.push(0);
    out
}

#[derive(Default)]
struct CodeWriter {
    bytes: Vec<u8>,
    buffer: u32,
    bits: u8,
}

impl CodeWriter {
    fn write(&mut self, code: u16, size: u8) {
        self.buffer |= (code as u32) << self.bits;
        self.bits += size;
        while self.bits >= 8 {
            self.bytes.push(self.buffer as u8);
            self.buffer >>= 8;
            self.bits -= 8;
        }
    }

    fn finish(mut self) -> Vec<u8> {
        if self.bits > 0 {
            self.bytes.push(self.buffer as u8);
        }
        self.bytes
    }
}

/// Rows of `pixels` in interlaced storage order.
pub fn interlace(pixels: &[u8], width: usize, height: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixels.len());
    for (start, step) in [(0, 8), (4, 8), (2, 4), (1, 2)] {
        for y in (start..height).step_by(step) {
            out.extend_from_slice(&pixels[y * width..(y + 1) * width]);
        }
    }
    out
}

/// Packed-field exponent and padded bytes for a color table.
fn color_table(colors: &[[u8; 3]]) -> (u8, Vec<u8>) {
    let mut exponent = 0u8;
    while (2usize << exponent) < colors.len() {
        exponent += 1;
    }
    let mut bytes: Vec<u8> = colors.iter().flatten().copied().collect();
    bytes.resize((2usize << exponent) * 3, 0);
    (exponent, bytes)
}

/// Smallest valid minimum code size covering every index in `pixels`.
fn min_code_size_for(pixels: &[u8]) -> u8 {
    let max = pixels.iter().copied().max().unwrap_or(0);
    let mut size = 2u8;
    while size < 8 && (max as u16) >= (1u16 << size) {
        size += 1;
    }
    size
}

/// One image block.
#[derive(Debug, Clone)]
pub struct Image {
    pub left: u16,
    pub top: u16,
    pub width: u16,
    pub height: u16,
    /// Natural top-to-bottom order; interlaced on write if requested.
    pub pixels: Vec<u8>,
    pub interlaced: bool,
    pub local_table: Option<Vec<[u8; 3]>>,
    pub min_code_size: u8,
    /// Compress with `weezl` instead of [`lzw_encode`].
    pub weezl: bool,
}

impl Image {
    pub fn new(width: u16, height: u16, pixels: Vec<u8>) -> Self {
        assert_eq!(pixels.len(), width as usize * height as usize);
        let min_code_size = min_code_size_for(&pixels);
        Self {
            left: 0,
            top: 0,
            width,
            height,
            pixels,
            interlaced: false,
            local_table: None,
            min_code_size,
            weezl: false,
        }
    }

    pub fn at(mut self, left: u16, top: u16) -> Self {
        self.left = left;
        self.top = top;
        self
    }

    pub fn interlaced(mut self) -> Self {
        self.interlaced = true;
        self
    }

    pub fn weezl(mut self) -> Self {
        self.weezl = true;
        self
    }

    pub fn local_table(mut self, colors: &[[u8; 3]]) -> Self {
        self.local_table = Some(colors.to_vec());
        self
    }

    /// Descriptor and local table, without the pixel data.
    pub fn header_bytes(&self) -> Vec<u8> {
        let mut out = vec![0x2C];
        for v in [self.left, self.top, self.width, self.height] {
            out.extend_from_slice(&v.to_le_bytes());
        }
        let mut flags = if self.interlaced { 0x40 } else { 0 };
        let table = self.local_table.as_deref().map(color_table);
        if let Some((exponent, _)) = &table {
            flags |= 0x80 | exponent;
        }
        out.push(flags);
        if let Some((_, bytes)) = table {
            out.extend(bytes);
        }
        out
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let stored = if self.interlaced {
            interlace(&self.pixels, self.width as usize, self.height as usize)
        } else {
            self.pixels.clone()
        };
        let mut out = self.header_bytes();
        if self.weezl {
            out.extend(weezl_encode(&stored, self.min_code_size));
        } else {
            out.extend(lzw_encode(&stored, self.min_code_size));
        }
        out
    }
}

/// Assembles a GIF byte stream block by block.
#[derive(Debug, Clone)]
pub struct GifBuilder {
    signature: &'static [u8; 6],
    width: u16,
    height: u16,
    global_table: Option<Vec<[u8; 3]>>,
    background: u8,
    blocks: Vec<u8>,
}

impl GifBuilder {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            signature: b"GIF89a",
            width,
            height,
            global_table: None,
            background: 0,
            blocks: Vec::new(),
        }
    }

    pub fn gif87a(mut self) -> Self {
        self.signature = b"GIF87a";
        self
    }

    pub fn global_table(mut self, colors: &[[u8; 3]]) -> Self {
        self.global_table = Some(colors.to_vec());
        self
    }

    pub fn background(mut self, index: u8) -> Self {
        self.background = index;
        self
    }

    pub fn graphic_control(mut self, transparent: Option<u8>, delay: u16) -> Self {
        // Disposal method 1 (keep).
        let flags = (1u8 << 2) | u8::from(transparent.is_some());
        self.blocks.extend_from_slice(&[EXTENSION_INTRODUCER, GRAPHIC_CONTROL_LABEL, 4, flags]);
        self.blocks.extend_from_slice(&delay.to_le_bytes());
        self.blocks.extend_from_slice(&[transparent.unwrap_or(0), 0]);
        self
    }

    pub fn comment(mut self, text: &[u8]) -> Self {
        self.blocks.extend_from_slice(&[EXTENSION_INTRODUCER, COMMENT_LABEL]);
        self.blocks.extend(sub_blocks(text));
        self
    }

    pub fn netscape_loop(mut self) -> Self {
        self.blocks.extend_from_slice(&[EXTENSION_INTRODUCER, APPLICATION_LABEL, 11]);
        self.blocks.extend_from_slice(b"NETSCAPE2.0");
        self.blocks.extend_from_slice(&[3, 1, 0, 0, 0]);
        self
    }

    pub fn plain_text(mut self, text: &[u8]) -> Self {
        self.blocks.extend_from_slice(&[EXTENSION_INTRODUCER, PLAIN_TEXT_LABEL, 12]);
        self.blocks.extend_from_slice(&[0; 12]);
        self.blocks.extend(sub_blocks(text));
        self
    }

    pub fn image(mut self, image: &Image) -> Self {
        self.blocks.extend(image.to_bytes());
        self
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.blocks.extend_from_slice(bytes);
        self
    }

    /// Header, global table and blocks, with no trailer.
    pub fn build_without_trailer(&self) -> Vec<u8> {
        let mut out = self.signature.to_vec();
        out.extend_from_slice(&self.width.to_le_bytes());
        out.extend_from_slice(&self.height.to_le_bytes());
        let table = self.global_table.as_deref().map(color_table);
        let flags = match &table {
            Some((exponent, _)) => 0x80 | 0x70 | exponent,
            None => 0x00,
        };
        out.extend_from_slice(&[flags, self.background, 0]);
        if let Some((_, bytes)) = table {
            out.extend(bytes);
        }
        out.extend_from_slice(&self.blocks);
        out
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = self.build_without_trailer();
        out.push(0x3B);
        out
    }
}

/// Deterministic pseudo-random indices below `colors`.
pub fn pattern(len: usize, colors: u16, seed: u32) -> Vec<u8> {
    let mut state = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    (0..len)
        .map(|_| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            ((state >> 16) % colors as u32) as u8
        })
        .collect()
}

/// Chunks of an encoded PNG as owned (type, data) pairs.
pub fn png_chunks(png: &[u8]) -> Vec<(ChunkType, Vec<u8>)> {
    chunks(png)
        .expect("PNG signature")
        .map(|c| {
            let c = c.expect("well-formed chunk");
            (c.chunk_type, c.data.to_vec())
        })
        .collect()
}

/// Payload of the first chunk of type `chunk_type`.
pub fn chunk_data(png: &[u8], chunk_type: ChunkType) -> Option<Vec<u8>> {
    png_chunks(png)
        .into_iter()
        .find(|(t, _)| *t == chunk_type)
        .map(|(_, data)| data)
}

/// Width and height from IHDR.
pub fn png_size(png: &[u8]) -> (u32, u32) {
    let ihdr = chunk_data(png, ChunkType::IHDR).expect("IHDR");
    let width = u32::from_be_bytes([ihdr[0], ihdr[1], ihdr[2], ihdr[3]]);
    let height = u32::from_be_bytes([ihdr[4], ihdr[5], ihdr[6], ihdr[7]]);
    (width, height)
}

/// Palette indices from IDAT, filter bytes removed.
pub fn png_pixels(png: &[u8]) -> Vec<u8> {
    let (width, _) = png_size(png);
    let idat = chunk_data(png, ChunkType::IDAT).expect("IDAT");
    let mut raw = Vec::new();
    ZlibDecoder::new(idat.as_slice())
        .read_to_end(&mut raw)
        .expect("zlib stream");

    let mut pixels = Vec::new();
    for row in raw.chunks_exact(width as usize + 1) {
        assert_eq!(row[0], 0, "filter type");
        pixels.extend_from_slice(&row[1..]);
    }
    pixels
}
