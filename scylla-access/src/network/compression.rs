//! Selection of the frame compression algorithm negotiated with the nodes.

use std::fmt;
use std::str::FromStr;

use scylla::client::Compression;
use serde::{Deserialize, Deserializer};

/// Compression requested for every connection of a cluster.
///
/// Selection from a symbol is total: unknown symbols fall back to [`CompressionMode::None`]
/// instead of failing, so a typo in configuration never prevents connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompressionMode {
    /// Frames are sent uncompressed.
    #[default]
    None,
    /// Snappy compression.
    Snappy,
    /// LZ4 compression.
    Lz4,
}

impl CompressionMode {
    /// Maps a symbolic name (`"snappy"`, `"lz4"`, case-insensitive) to a mode.
    pub fn from_symbol(symbol: &str) -> Self {
        if symbol.eq_ignore_ascii_case("snappy") {
            CompressionMode::Snappy
        } else if symbol.eq_ignore_ascii_case("lz4") {
            CompressionMode::Lz4
        } else {
            CompressionMode::None
        }
    }

    /// The driver's representation, `None` meaning no compression.
    pub fn to_driver(self) -> Option<Compression> {
        match self {
            CompressionMode::None => None,
            CompressionMode::Snappy => Some(Compression::Snappy),
            CompressionMode::Lz4 => Some(Compression::Lz4),
        }
    }

    /// Symbolic name of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            CompressionMode::None => "none",
            CompressionMode::Snappy => "snappy",
            CompressionMode::Lz4 => "lz4",
        }
    }
}

/// Selects a compression mode for an optional symbol. Absence selects no compression.
pub fn select_compression(symbol: Option<&str>) -> CompressionMode {
    symbol.map_or(CompressionMode::None, CompressionMode::from_symbol)
}

impl FromStr for CompressionMode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(CompressionMode::from_symbol(s))
    }
}

impl fmt::Display for CompressionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CompressionMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let symbol = Option::<String>::deserialize(deserializer)?;
        Ok(select_compression(symbol.as_deref()))
    }
}
