//! Small bounded cache of decoded glyph bitmaps in front of the rasterizer.
//!
//! The atlas pulls from here on its own misses. Keeping a handful of decoded
//! bitmaps around means a glyph that was just evicted from the atlas can be
//! blitted back without decoding it again.

use tracing::{debug, trace, warn};

use crate::Codepoint;
use crate::config::RasterConfig;
use crate::error::AtlasError;
use crate::rasterizer::{FontEncoding, FontSource, GlyphRasterizer, Kerning, RasterizedGlyph};
use crate::slot_pool::SlotPool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitmapCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub rasterizations: u64,
}

/// Decoded-bitmap cache keyed by codepoint.
///
/// Pass `&mut R` as the rasterizer to keep ownership outside the cache.
#[derive(Debug)]
pub struct GlyphBitmapCache<R> {
    rasterizer: R,
    pool: SlotPool<RasterizedGlyph>,
    stats: BitmapCacheStats,
}

impl<R: GlyphRasterizer> GlyphBitmapCache<R> {
    /// A released cache (capacity 0) around `rasterizer`.
    pub fn new(rasterizer: R) -> Self {
        Self {
            rasterizer,
            pool: SlotPool::empty(),
            stats: BitmapCacheStats::default(),
        }
    }

    /// Allocate `capacity` bitmap slots and hand `config` to the rasterizer.
    ///
    /// On error the cache keeps its previous state.
    pub fn create(&mut self, capacity: usize, config: &RasterConfig) -> Result<(), AtlasError> {
        let pool = SlotPool::with_capacity(capacity)?;
        self.rasterizer.configure(config);
        self.pool = pool;
        self.stats = BitmapCacheStats::default();
        debug!(
            capacity,
            cell_width = config.cell_width,
            cell_height = config.cell_height,
            "bitmap cache created"
        );
        Ok(())
    }

    /// Drop every cached bitmap and return to capacity 0.
    pub fn release(&mut self) {
        self.pool = SlotPool::empty();
        self.stats = BitmapCacheStats::default();
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Number of cached bitmaps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pool.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    #[must_use]
    pub fn contains(&self, codepoint: Codepoint) -> bool {
        self.pool.find(codepoint).is_some()
    }

    #[must_use]
    pub fn stats(&self) -> BitmapCacheStats {
        self.stats
    }

    /// Decoded bitmap and metrics for `codepoint`, rasterizing on a miss.
    ///
    /// On rasterizer failure the victim slot is left exactly as it was.
    pub fn get_glyph(&mut self, codepoint: Codepoint) -> Result<&RasterizedGlyph, AtlasError> {
        self.pool.advance_generation();

        if let Some(index) = self.pool.find(codepoint) {
            self.pool.mark_used(index, codepoint);
            self.stats.hits += 1;
            return Ok(self.pool[index].payload());
        }

        self.stats.misses += 1;
        let victim = self
            .pool
            .select_victim()
            .ok_or(AtlasError::EvictionExhausted)?;

        let glyph = self.rasterizer.rasterize(codepoint).map_err(|source| {
            warn!(codepoint, error = %source, "glyph rasterization failed");
            AtlasError::Rasterization { codepoint, source }
        })?;
        self.stats.rasterizations += 1;

        if let Some(evicted) = self.pool.mark_used(victim, codepoint) {
            self.stats.evictions += 1;
            trace!(slot = victim, evicted, codepoint, "bitmap cache eviction");
        }
        if let Some(payload) = self.pool.payload_mut(victim) {
            *payload = glyph;
        }
        Ok(self.pool[victim].payload())
    }

    /// Load a new font; every cached bitmap is dropped on success.
    pub fn load_font(&mut self, source: FontSource<'_>) -> Result<(), AtlasError> {
        self.rasterizer
            .load_font(source)
            .map_err(AtlasError::Font)?;
        self.pool.evict_all();
        Ok(())
    }

    #[must_use]
    pub fn kerning(&self, left: Codepoint, right: Codepoint) -> Kerning {
        self.rasterizer.kerning(left, right)
    }

    #[must_use]
    pub fn is_monospaced(&self) -> bool {
        self.rasterizer.is_monospaced()
    }

    #[must_use]
    pub fn ascender_to_height_ratio(&self) -> f32 {
        self.rasterizer.ascender_to_height_ratio()
    }

    #[must_use]
    pub fn encoding(&self) -> FontEncoding {
        self.rasterizer.encoding()
    }

    /// Switch the rasterizer's character map; cached bitmaps are dropped.
    pub fn set_encoding(&mut self, encoding: FontEncoding) {
        self.rasterizer.set_encoding(encoding);
        self.pool.evict_all();
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    pub fn rasterizer_mut(&mut self) -> &mut R {
        &mut self.rasterizer
    }

    pub fn into_rasterizer(self) -> R {
        self.rasterizer
    }
}
