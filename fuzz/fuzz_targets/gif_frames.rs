#![no_main]

//! Fuzz target for GIF block walking and frame decoding.

use libfuzzer_sys::fuzz_target;
use gifpng::gif::{FrameDecoder, GifHeader};
use gifpng::GifFile;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Ok((header, offset)) = GifHeader::load(data) else {
        return;
    };

    let mut decoded = 0;
    for frame in FrameDecoder::new(data, offset).max_pixels(1 << 22) {
        let Ok(frame) = frame else {
            break;
        };
        assert_eq!(frame.pixels.len(), frame.descriptor.pixel_count());
        decoded += 1;
    }

    if let Ok(count) = GifFile::count_frames(data) {
        assert!(count >= decoded);
    }
    let _ = header.is_gif89a();
});
