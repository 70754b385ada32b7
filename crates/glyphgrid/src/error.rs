//! Error types shared by the slot pool, bitmap cache and atlas.

use std::fmt;

use crate::Codepoint;

/// Rejected construction parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Texture width or height is zero.
    ZeroTextureSize,
    /// `grid_width * grid_height` is zero.
    ZeroAreaGrid,
    /// The grid is finer than the texture, so a cell would be 0 px wide or tall.
    CellTooSmall,
    /// A slot pool was asked for zero slots.
    ZeroCapacity,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroTextureSize => write!(f, "texture width and height must be non-zero"),
            Self::ZeroAreaGrid => write!(f, "grid must have at least one cell"),
            Self::CellTooSmall => write!(f, "grid is finer than the texture (0 px cells)"),
            Self::ZeroCapacity => write!(f, "slot capacity must be non-zero"),
        }
    }
}

/// Failure reported by a [`GlyphRasterizer`](crate::GlyphRasterizer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterizerError {
    /// No font has been loaded yet.
    NoFont,
    /// The font has no glyph for this codepoint.
    MissingGlyph(Codepoint),
    /// The rasterizer produced a bitmap whose pixel count does not match its size.
    InvalidBitmap,
    /// The font could not be read or parsed.
    FontLoad(String),
}

impl fmt::Display for RasterizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFont => write!(f, "no font loaded"),
            Self::MissingGlyph(cp) => write!(f, "font has no glyph for U+{cp:04X}"),
            Self::InvalidBitmap => write!(f, "invalid bitmap (pixel count mismatch)"),
            Self::FontLoad(reason) => write!(f, "font load failed: {reason}"),
        }
    }
}

impl std::error::Error for RasterizerError {}

/// Errors produced by the atlas and its caches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtlasError {
    /// Construction parameters were rejected; the object stays released.
    Config(ConfigError),
    /// The pixel buffer or slot array could not be allocated.
    Allocation { bytes: usize },
    /// No eviction candidate exists (zero capacity, or every slot pinned).
    EvictionExhausted,
    /// The rasterizer could not produce a glyph; the target slot is untouched.
    Rasterization {
        codepoint: Codepoint,
        source: RasterizerError,
    },
    /// The rasterizer rejected a font or encoding change.
    Font(RasterizerError),
    /// The operation needs a created atlas.
    NotCreated,
}

impl fmt::Display for AtlasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "invalid atlas configuration: {err}"),
            Self::Allocation { bytes } => write!(f, "failed to allocate {bytes} bytes"),
            Self::EvictionExhausted => write!(f, "no slot available for eviction"),
            Self::Rasterization { codepoint, source } => {
                write!(f, "rasterization of U+{codepoint:04X} failed: {source}")
            }
            Self::Font(source) => write!(f, "font error: {source}"),
            Self::NotCreated => write!(f, "atlas has not been created"),
        }
    }
}

impl std::error::Error for AtlasError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Rasterization { source, .. } | Self::Font(source) => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for AtlasError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn rasterization_error_exposes_source() {
        let err = AtlasError::Rasterization {
            codepoint: 0x41,
            source: RasterizerError::MissingGlyph(0x41),
        };
        assert_eq!(
            err.to_string(),
            "rasterization of U+0041 failed: font has no glyph for U+0041"
        );
        assert!(err.source().is_some());
        assert!(AtlasError::EvictionExhausted.source().is_none());
    }

    #[test]
    fn config_error_converts() {
        let err: AtlasError = ConfigError::ZeroAreaGrid.into();
        assert_eq!(err, AtlasError::Config(ConfigError::ZeroAreaGrid));
    }
}
