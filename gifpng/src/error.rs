//! Codec error types.
//!
//! Failures fall into three families: the input is not a well-formed GIF
//! container ([`FormatError`]), the pixel stream inside it cannot be decoded
//! ([`DecodeError`]), or the source could not be read at all (I/O).

use thiserror::Error;

/// Structural problems with the GIF container.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// The first six bytes are neither `GIF87a` nor `GIF89a`.
    #[error("Invalid GIF signature: {0:?}")]
    InvalidSignature(Vec<u8>),

    /// Canvas or image descriptor declares a zero dimension.
    #[error("Invalid dimensions: {width}x{height}")]
    ZeroDimension {
        /// Declared width.
        width: u16,
        /// Declared height.
        height: u16,
    },

    /// Canvas or image area exceeds the configured pixel limit.
    #[error("Dimensions {width}x{height} exceed the limit of {max_pixels} pixels")]
    DimensionsExceeded {
        /// Declared width.
        width: u16,
        /// Declared height.
        height: u16,
        /// Configured limit.
        max_pixels: u64,
    },

    /// The input ended inside a fixed-size structure.
    #[error("Truncated {what}: need {needed} bytes, have {available}")]
    Truncated {
        /// Structure being read.
        what: &'static str,
        /// Bytes required.
        needed: usize,
        /// Bytes left in the input.
        available: usize,
    },

    /// A block introducer that is neither an extension nor an image.
    #[error("Unknown block introducer 0x{introducer:02X} at offset {offset}")]
    UnknownBlock {
        /// The offending byte.
        introducer: u8,
        /// Absolute offset in the input.
        offset: usize,
    },

    /// LZW minimum code size outside the range GIF allows.
    #[error("Invalid LZW minimum code size: {0}")]
    InvalidMinCodeSize(u8),

    /// Neither a local nor a global color table is present.
    #[error("Image has no color table")]
    MissingPalette,
}

/// Problems with the compressed pixel stream or frame selection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The sub-block sequence ended before the LZW end code.
    #[error("LZW stream ended without an end code")]
    MissingEndCode,

    /// The input ended inside the sub-block sequence.
    #[error("Image data truncated before the LZW end code")]
    UnexpectedEof,

    /// A dictionary entry refers to itself as its own prefix.
    #[error("Circular LZW dictionary entry at code {code}")]
    CircularEntry {
        /// The corrupt code.
        code: u16,
    },

    /// A code beyond the next free dictionary slot.
    #[error("LZW code {code} out of range (next free slot {next})")]
    InvalidCode {
        /// Code read from the stream.
        code: u16,
        /// Next free dictionary slot at that point.
        next: u16,
    },

    /// The stream has fewer frames than requested.
    #[error("Frame {index} not found ({available} frames present)")]
    FrameNotFound {
        /// Requested zero-based frame.
        index: usize,
        /// Frames actually decoded before the stream ended.
        available: usize,
    },
}

/// Top-level codec error.
#[derive(Error, Debug)]
pub enum ImageError {
    /// Malformed GIF structure.
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    /// Undecodable pixel data.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoder error.
    #[error("Encoder error: {0}")]
    Encoder(String),
}

impl ImageError {
    /// Whether this is a structural (format) failure.
    pub fn is_format(&self) -> bool {
        matches!(self, ImageError::Format(_))
    }

    /// Whether this is a pixel-stream (decode) failure.
    pub fn is_decode(&self) -> bool {
        matches!(self, ImageError::Decode(_))
    }

    /// Whether the source could not be read.
    pub fn is_io(&self) -> bool {
        matches!(self, ImageError::Io(_))
    }
}

/// Codec result type.
pub type Result<T> = std::result::Result<T, ImageError>;
