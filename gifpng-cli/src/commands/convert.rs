//! GIF to PNG conversion command.

use anyhow::Context;
use clap::Args;
use gifpng::png::chunks;
use gifpng::{gif_file_to_png, CompressionLevel, ConvertOptions, MissingPalettePolicy, Rgb};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Convert one GIF frame to PNG.
#[derive(Args, Debug)]
pub struct CmdConvert {
    /// Source GIF file.
    pub input: PathBuf,

    /// Destination PNG file.
    #[arg(short, long)]
    pub output: PathBuf,

    /// JSON file with conversion options; flags given here override it.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Zero-based frame to extract.
    #[arg(long)]
    pub frame: Option<usize>,

    /// Color to fill the canvas outside the frame (#rrggbb).
    #[arg(long)]
    pub background: Option<Rgb>,

    /// zlib compression: none, fast, default, best or 0-9.
    #[arg(long)]
    pub compression: Option<CompressionLevel>,

    /// Fail instead of substituting a gray ramp when the GIF has no palette.
    #[arg(long)]
    pub reject_missing_palette: bool,

    /// Largest canvas or frame area accepted, in pixels.
    #[arg(long)]
    pub max_pixels: Option<u64>,

    /// PNG to write instead when the conversion fails.
    #[arg(long)]
    pub placeholder: Option<PathBuf>,

    /// Check every chunk CRC of the PNG before writing it.
    #[arg(long)]
    pub verify: bool,
}

impl CmdConvert {
    /// Execute the convert command.
    pub fn run(&self) -> anyhow::Result<()> {
        let options = self.options()?;
        debug!(?options, "conversion options");

        let png = match gif_file_to_png(&self.input, &options) {
            Ok(png) => png,
            Err(err) => match &self.placeholder {
                Some(placeholder) => {
                    warn!(
                        input = %self.input.display(),
                        error = %err,
                        "conversion failed, writing placeholder"
                    );
                    std::fs::read(placeholder).with_context(|| {
                        format!("Failed to read placeholder {}", placeholder.display())
                    })?
                }
                None => {
                    return Err(err)
                        .with_context(|| format!("Failed to convert {}", self.input.display()))
                }
            },
        };

        if self.verify {
            let count = verify_png(&png)?;
            debug!(chunks = count, "verified PNG chunks");
        }

        std::fs::write(&self.output, &png)
            .with_context(|| format!("Failed to write {}", self.output.display()))?;
        info!(output = %self.output.display(), bytes = png.len(), "wrote PNG");
        Ok(())
    }

    /// Options from the config file, if any, overridden by flags.
    pub fn options(&self) -> anyhow::Result<ConvertOptions> {
        let mut options = match &self.config {
            Some(path) => load_config(path)?,
            None => ConvertOptions::default(),
        };

        if let Some(frame) = self.frame {
            options = options.frame_index(frame);
        }
        if let Some(background) = self.background {
            options = options.background(background);
        }
        if let Some(compression) = self.compression {
            options = options.compression(compression);
        }
        if self.reject_missing_palette {
            options = options.missing_palette(MissingPalettePolicy::Reject);
        }
        if let Some(max_pixels) = self.max_pixels {
            options = options.max_pixels(max_pixels);
        }
        Ok(options)
    }
}

/// Read [`ConvertOptions`] from a JSON file; missing fields keep their defaults.
fn load_config(path: &Path) -> anyhow::Result<ConvertOptions> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

/// Walk the PNG's chunks, failing on a malformed chunk or a CRC mismatch.
///
/// Returns the number of chunks checked.
pub fn verify_png(png: &[u8]) -> anyhow::Result<usize> {
    let mut count = 0;
    for chunk in chunks(png)? {
        let chunk = chunk?;
        if !chunk.crc_matches() {
            anyhow::bail!("CRC mismatch in {} chunk", chunk.chunk_type);
        }
        count += 1;
    }
    Ok(count)
}
