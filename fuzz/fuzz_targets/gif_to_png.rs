#![no_main]

//! Fuzz target for the GIF to PNG conversion path.
//!
//! Any output produced must be a well-formed PNG whose chunk CRCs verify.

use arbitrary::Arbitrary;
use gifpng::png::{chunks, ChunkType};
use gifpng::{gif_to_png, CompressionLevel, ConvertOptions, MissingPalettePolicy, Rgb};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct ConvertInput {
    data: Vec<u8>,
    frame_index: u8,
    mode: ConvertMode,
}

#[derive(Arbitrary, Debug)]
enum ConvertMode {
    /// Default options
    Default,
    /// Background override and no compression
    Background { r: u8, g: u8, b: u8 },
    /// Palette-less input rejected
    Strict,
}

fuzz_target!(|input: ConvertInput| {
    // Limit input size
    if input.data.len() > 1024 * 1024 {
        return;
    }

    let mut options = ConvertOptions::new()
        .frame_index(input.frame_index as usize)
        .max_pixels(1 << 22);
    match input.mode {
        ConvertMode::Default => {}
        ConvertMode::Background { r, g, b } => {
            options = options
                .background(Rgb::new(r, g, b))
                .compression(CompressionLevel::None);
        }
        ConvertMode::Strict => {
            options = options.missing_palette(MissingPalettePolicy::Reject);
        }
    }

    let Ok(png) = gif_to_png(&input.data, &options) else {
        return;
    };

    let mut last = None;
    for chunk in chunks(&png).expect("output has a PNG signature") {
        let chunk = chunk.expect("output chunks are complete");
        assert!(chunk.crc_matches(), "bad CRC on {}", chunk.chunk_type);
        last = Some(chunk.chunk_type);
    }
    assert_eq!(last, Some(ChunkType::IEND));
});
