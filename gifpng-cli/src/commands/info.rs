//! GIF inspection command.

use anyhow::Context;
use clap::Args;
use console::style;
use gifpng::gif::{FrameDecoder, GifHeader};
use serde::Serialize;
use std::path::PathBuf;

/// Frame information for display.
#[derive(Debug, Clone, Serialize)]
pub struct FrameInfo {
    /// Zero-based frame index.
    pub index: usize,
    /// Left edge on the canvas.
    pub left: u16,
    /// Top edge on the canvas.
    pub top: u16,
    /// Frame width.
    pub width: u16,
    /// Frame height.
    pub height: u16,
    /// Rows stored in interlaced order.
    pub interlaced: bool,
    /// Local color table size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_colors: Option<usize>,
    /// Transparent palette index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transparent_index: Option<u8>,
    /// Frame delay in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u32>,
}

/// GIF file information.
#[derive(Debug, Clone, Serialize)]
pub struct GifInfo {
    /// File path.
    pub file: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Signature, `GIF87a` or `GIF89a`.
    pub version: String,
    /// Canvas width.
    pub width: u16,
    /// Canvas height.
    pub height: u16,
    /// Global color table size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_colors: Option<usize>,
    /// Background palette index.
    pub background_index: u8,
    /// Frames decoded successfully.
    pub frames: Vec<FrameInfo>,
    /// Why decoding stopped early, if it did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Inspect a GIF file.
#[derive(Args, Debug)]
pub struct CmdInfo {
    /// Path to the GIF file.
    pub file: PathBuf,

    /// Output in JSON format.
    #[arg(long)]
    pub json: bool,
}

impl CmdInfo {
    /// Execute the info command.
    pub fn run(&self) -> anyhow::Result<()> {
        let data = std::fs::read(&self.file)
            .with_context(|| format!("Failed to read {}", self.file.display()))?;
        let info = analyze(&self.file.display().to_string(), &data)?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&info)?);
        } else {
            print_info(&info);
        }
        Ok(())
    }
}

/// Parse the header and walk every frame.
///
/// A frame that fails to decode ends the walk; the error is reported
/// alongside the frames read before it.
pub fn analyze(file: &str, data: &[u8]) -> anyhow::Result<GifInfo> {
    let (header, header_len) = GifHeader::load(data)?;

    let mut frames = Vec::new();
    let mut error = None;
    for (index, frame) in FrameDecoder::new(data, header_len).enumerate() {
        match frame {
            Ok(frame) => {
                frames.push(FrameInfo {
                    index,
                    left: frame.descriptor.left,
                    top: frame.descriptor.top,
                    width: frame.width(),
                    height: frame.height(),
                    interlaced: frame.descriptor.interlaced,
                    local_colors: frame.local_color_table().map(|t| t.len()),
                    transparent_index: frame.transparent_index(),
                    delay_ms: frame.graphic_control.as_ref().map(|g| g.delay_ms()),
                });
            }
            Err(err) => error = Some(err.to_string()),
        }
    }

    Ok(GifInfo {
        file: file.to_string(),
        size_bytes: data.len() as u64,
        version: String::from_utf8_lossy(&header.version).into_owned(),
        width: header.width,
        height: header.height,
        global_colors: header.global_color_table.as_ref().map(|t| t.len()),
        background_index: header.background_index,
        frames,
        error,
    })
}

fn print_info(info: &GifInfo) {
    println!("{}", style(&info.file).bold());
    println!("  Format:      {}", info.version);
    println!("  Size:        {} bytes", info.size_bytes);
    println!("  Canvas:      {}x{}", info.width, info.height);
    match info.global_colors {
        Some(colors) => println!("  Palette:     {} colors (global)", colors),
        None => println!("  Palette:     none"),
    }
    println!("  Background:  index {}", info.background_index);
    println!("  Frames:      {}", info.frames.len());

    for frame in &info.frames {
        let mut line = format!(
            "    #{} {}x{} at ({}, {})",
            frame.index, frame.width, frame.height, frame.left, frame.top
        );
        if frame.interlaced {
            line.push_str(" interlaced");
        }
        if let Some(colors) = frame.local_colors {
            line.push_str(&format!(" local palette {colors}"));
        }
        if let Some(index) = frame.transparent_index {
            line.push_str(&format!(" transparent {index}"));
        }
        if let Some(delay) = frame.delay_ms {
            line.push_str(&format!(" {delay}ms"));
        }
        println!("{}", line);
    }

    if let Some(error) = &info.error {
        println!("  {} {}", style("Error:").red().bold(), error);
    }
}
