#![forbid(unsafe_code)]

//! Codepoint-keyed glyph texture atlas.
//!
//! Text renderers sample glyphs out of one shared R8 texture instead of
//! calling the font rasterizer for every character of every frame. Two cache
//! tiers sit between the renderer and the rasterizer:
//!
//! - [`GlyphBitmapCache`] - a few decoded bitmaps in front of the
//!   [`GlyphRasterizer`]
//! - [`TextureAtlas`] - a uniform grid of cells with LRU eviction, which is
//!   what rendering reads from
//!
//! Both are built on [`SlotPool`], a fixed-capacity slot arena with a
//! `codepoint -> slot` table and generation-based recency.
//!
//! # Example
//! ```
//! use glyphgrid::{
//!     AtlasConfig, FontSource, GlyphBitmap, GlyphMetrics, GlyphRasterizer, Kerning,
//!     PrecacheOutcome, RasterConfig, RasterizedGlyph, RasterizerError, TextureAtlas,
//! };
//!
//! struct Boxes;
//!
//! impl GlyphRasterizer for Boxes {
//!     fn load_font(&mut self, _: FontSource<'_>) -> Result<(), RasterizerError> {
//!         Ok(())
//!     }
//!     fn configure(&mut self, _: &RasterConfig) {}
//!     fn rasterize(&mut self, _: u32) -> Result<RasterizedGlyph, RasterizerError> {
//!         Ok(RasterizedGlyph {
//!             bitmap: GlyphBitmap::from_pixels(2, 2, vec![255; 4])?,
//!             metrics: GlyphMetrics { advance_x: 3, ..GlyphMetrics::default() },
//!         })
//!     }
//!     fn kerning(&self, _: u32, _: u32) -> Kerning {
//!         Kerning::default()
//!     }
//!     fn is_monospaced(&self) -> bool {
//!         true
//!     }
//! }
//!
//! let mut atlas = TextureAtlas::with_config(Boxes, &AtlasConfig::new(64, 64, 8, 8)).unwrap();
//! assert_eq!(atlas.precache_str("AB"), Ok(PrecacheOutcome::Updated));
//! assert_eq!(atlas.precache_str("AB"), Ok(PrecacheOutcome::Unchanged));
//!
//! let slot = atlas.char_slot('A' as u32);
//! let quad = slot.and_then(|slot| atlas.texture_coord(slot)).unwrap();
//! assert_eq!(quad.size, (3, 3));
//! assert_eq!(atlas.horizontal_advance('A' as u32), Some(3));
//! ```

pub mod atlas;
pub mod bitmap;
pub mod bitmap_cache;
pub mod config;
pub mod error;
pub mod export;
pub mod rasterizer;
pub mod slot_pool;

#[cfg(doctest)]
#[doc = include_str!("../../../README.md")]
struct ReadmeDoctests;

/// A Unicode scalar value; the cache key at both tiers.
pub type Codepoint = u32;

pub use atlas::{AtlasGlyph, AtlasRect, AtlasStats, GlyphQuad, PrecacheOutcome, TextureAtlas};
pub use bitmap::GlyphBitmap;
pub use bitmap_cache::{BitmapCacheStats, GlyphBitmapCache};
pub use config::{
    AtlasConfig, DEFAULT_BITMAP_CACHE_CAPACITY, RasterConfig, SmoothAmount, SmoothMethod,
    Smoothing,
};
pub use error::{AtlasError, ConfigError, RasterizerError};
pub use export::encode_bmp;
pub use rasterizer::{
    FontEncoding, FontSource, GlyphMetrics, GlyphRasterizer, Kerning, RasterizedGlyph,
};
pub use slot_pool::{Occupant, Slot, SlotIndex, SlotPool, Usage};
