//! The font rasterizer seam.
//!
//! Glyph decoding lives outside this crate. Anything that can turn a
//! codepoint into an R8 bitmap plus metrics implements [`GlyphRasterizer`];
//! the bitmap cache calls it only on misses.

use std::path::Path;

use crate::Codepoint;
use crate::bitmap::GlyphBitmap;
use crate::config::RasterConfig;
use crate::error::RasterizerError;

/// Per-glyph placement metrics, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlyphMetrics {
    pub advance_x: i32,
    pub bearing_x: i32,
    pub bearing_y: i32,
}

/// Rasterizer output for one codepoint.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RasterizedGlyph {
    pub bitmap: GlyphBitmap,
    pub metrics: GlyphMetrics,
}

/// Kerning adjustment between two glyphs, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Kerning {
    pub dx: i32,
    pub dy: i32,
}

/// Where font data comes from.
#[derive(Debug, Clone, Copy)]
pub enum FontSource<'a> {
    Path(&'a Path),
    Memory(&'a [u8]),
}

/// Character map the rasterizer selects codepoints through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontEncoding {
    #[default]
    Unicode,
    Symbol,
    Latin1,
    AppleRoman,
}

/// Font rasterization engine.
pub trait GlyphRasterizer {
    fn load_font(&mut self, source: FontSource<'_>) -> Result<(), RasterizerError>;

    /// Called when the bitmap cache is created, before any `rasterize`.
    fn configure(&mut self, config: &RasterConfig);

    fn rasterize(&mut self, codepoint: Codepoint) -> Result<RasterizedGlyph, RasterizerError>;

    fn kerning(&self, left: Codepoint, right: Codepoint) -> Kerning;

    fn is_monospaced(&self) -> bool;

    /// Ascender as a fraction of the full line height.
    fn ascender_to_height_ratio(&self) -> f32 {
        0.8
    }

    fn encoding(&self) -> FontEncoding {
        FontEncoding::Unicode
    }

    fn set_encoding(&mut self, _encoding: FontEncoding) {}
}

impl<R: GlyphRasterizer + ?Sized> GlyphRasterizer for &mut R {
    fn load_font(&mut self, source: FontSource<'_>) -> Result<(), RasterizerError> {
        (**self).load_font(source)
    }

    fn configure(&mut self, config: &RasterConfig) {
        (**self).configure(config);
    }

    fn rasterize(&mut self, codepoint: Codepoint) -> Result<RasterizedGlyph, RasterizerError> {
        (**self).rasterize(codepoint)
    }

    fn kerning(&self, left: Codepoint, right: Codepoint) -> Kerning {
        (**self).kerning(left, right)
    }

    fn is_monospaced(&self) -> bool {
        (**self).is_monospaced()
    }

    fn ascender_to_height_ratio(&self) -> f32 {
        (**self).ascender_to_height_ratio()
    }

    fn encoding(&self) -> FontEncoding {
        (**self).encoding()
    }

    fn set_encoding(&mut self, encoding: FontEncoding) {
        (**self).set_encoding(encoding);
    }
}

impl<R: GlyphRasterizer + ?Sized> GlyphRasterizer for Box<R> {
    fn load_font(&mut self, source: FontSource<'_>) -> Result<(), RasterizerError> {
        (**self).load_font(source)
    }

    fn configure(&mut self, config: &RasterConfig) {
        (**self).configure(config);
    }

    fn rasterize(&mut self, codepoint: Codepoint) -> Result<RasterizedGlyph, RasterizerError> {
        (**self).rasterize(codepoint)
    }

    fn kerning(&self, left: Codepoint, right: Codepoint) -> Kerning {
        (**self).kerning(left, right)
    }

    fn is_monospaced(&self) -> bool {
        (**self).is_monospaced()
    }

    fn ascender_to_height_ratio(&self) -> f32 {
        (**self).ascender_to_height_ratio()
    }

    fn encoding(&self) -> FontEncoding {
        (**self).encoding()
    }

    fn set_encoding(&mut self, encoding: FontEncoding) {
        (**self).set_encoding(encoding);
    }
}
