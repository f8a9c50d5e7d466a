//! Color tables.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::cursor::ByteCursor;
use crate::error::Result;

/// Maximum number of entries a GIF or PNG palette can hold.
pub const MAX_PALETTE_ENTRIES: usize = 256;

/// An RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
}

impl Rgb {
    /// Create a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Manhattan distance across the three channels.
    pub fn distance(&self, other: &Rgb) -> u32 {
        (self.r as i32 - other.r as i32).unsigned_abs()
            + (self.g as i32 - other.g as i32).unsigned_abs()
            + (self.b as i32 - other.b as i32).unsigned_abs()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Error returned when parsing an [`Rgb`] from a hex string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid color '{0}', expected #rrggbb")]
pub struct ParseRgbError(String);

impl FromStr for Rgb {
    type Err = ParseRgbError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(ParseRgbError(s.to_string()));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ParseRgbError(s.to_string()))
        };
        Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

/// Ordered list of palette colors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColorTable {
    entries: Vec<Rgb>,
}

impl ColorTable {
    /// Build a table from existing colors.
    pub fn new(entries: Vec<Rgb>) -> Self {
        Self { entries }
    }

    /// Read `num_colors` consecutive RGB triples.
    ///
    /// Returns the table and the number of bytes consumed.
    pub fn load(data: &[u8], num_colors: usize) -> Result<(Self, usize)> {
        let mut cursor = ByteCursor::new(data);
        let raw = cursor.read_bytes(num_colors * 3, "color table")?;
        let entries = raw
            .chunks_exact(3)
            .map(|c| Rgb::new(c[0], c[1], c[2]))
            .collect();
        Ok((Self { entries }, cursor.position()))
    }

    /// A `size`-entry gray ramp spanning black to white.
    pub fn grayscale(size: usize) -> Self {
        let size = size.clamp(1, MAX_PALETTE_ENTRIES);
        let entries = (0..size)
            .map(|i| {
                let v = if size == 1 { 0 } else { (i * 255 / (size - 1)) as u8 };
                Rgb::new(v, v, v)
            })
            .collect();
        Self { entries }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Color at `index`.
    pub fn get(&self, index: usize) -> Option<Rgb> {
        self.entries.get(index).copied()
    }

    /// All entries in order.
    pub fn entries(&self) -> &[Rgb] {
        &self.entries
    }

    /// Serialize as packed R,G,B bytes (PNG `PLTE` payload).
    pub fn to_bytes(&self) -> Vec<u8> {
        self.entries.iter().flat_map(|c| [c.r, c.g, c.b]).collect()
    }

    /// Index of the entry closest to `color`; ties go to the lowest index.
    ///
    /// Returns `None` for an empty table.
    pub fn nearest_color_index(&self, color: Rgb) -> Option<u8> {
        let mut best: Option<(usize, u32)> = None;
        for (i, entry) in self.entries.iter().take(MAX_PALETTE_ENTRIES).enumerate() {
            let d = entry.distance(&color);
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((i, d));
            }
        }
        best.map(|(i, _)| i as u8)
    }

    /// Extend with black entries until the table holds `len` colors.
    pub(crate) fn pad_to(&mut self, len: usize) {
        let len = len.min(MAX_PALETTE_ENTRIES);
        if self.entries.len() < len {
            self.entries.resize(len, Rgb::default());
        }
    }
}
