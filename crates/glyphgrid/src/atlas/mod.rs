//! Grid-packed R8 glyph atlas with LRU slot eviction.
//!
//! The atlas owns one `width x height` luminance buffer cut into a uniform
//! `grid_width x grid_height` grid. Slot `i` is the cell at
//! `(i % grid_width, i / grid_width)`. A codepoint lives in at most one slot;
//! on a miss the least recently used slot is overwritten in place with a
//! bitmap pulled from the [`GlyphBitmapCache`].
//!
//! The buffer is CPU-side. Uploading it to a GPU texture is the caller's job;
//! [`TextureAtlas::take_dirty_rects`] lists the regions written since the last
//! upload, at most one per cell.

mod coords;
mod precache;

pub use coords::GlyphQuad;
pub use precache::PrecacheOutcome;

use tracing::debug;

use crate::Codepoint;
use crate::bitmap_cache::{BitmapCacheStats, GlyphBitmapCache};
use crate::config::{AtlasConfig, RasterConfig, Smoothing};
use crate::error::AtlasError;
use crate::rasterizer::{FontEncoding, FontSource, GlyphMetrics, GlyphRasterizer, Kerning};
use crate::slot_pool::{SlotIndex, SlotPool};

/// Rect within the atlas (in pixels).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasRect {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
}

impl AtlasRect {
    #[must_use]
    pub const fn area_bytes(self) -> usize {
        (self.w as usize) * (self.h as usize)
    }
}

/// What an atlas slot records about the glyph drawn into its cell.
///
/// `width`/`height` are the pixels actually blitted (clipped to the cell);
/// anything else in the cell is stale and never sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AtlasGlyph {
    pub width: u16,
    pub height: u16,
    pub metrics: GlyphMetrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AtlasStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub blits: u64,
    pub bytes_uploaded: u64,
}

/// Codepoint-keyed texture atlas.
#[derive(Debug)]
pub struct TextureAtlas<R> {
    width: u16,
    height: u16,
    grid_width: u16,
    grid_height: u16,
    cell_width: u16,
    cell_height: u16,
    inv_width: f32,
    inv_height: f32,
    smoothing: Smoothing,
    pixels: Vec<u8>,
    pool: SlotPool<AtlasGlyph>,
    // Half-texel-centred UV origin of each cell, indexed like `pool`.
    base_uvs: Vec<[f32; 2]>,
    bitmap_cache: GlyphBitmapCache<R>,
    gradient_slot: Option<SlotIndex>,
    dirty: Vec<AtlasRect>,
    // Position of each slot's rect in `dirty`, indexed like `pool`.
    dirty_index: Vec<Option<usize>>,
    stats: AtlasStats,
}

impl<R: GlyphRasterizer> TextureAtlas<R> {
    /// An uninitialized atlas; call [`create`](Self::create) before use.
    pub fn new(rasterizer: R) -> Self {
        Self {
            width: 0,
            height: 0,
            grid_width: 0,
            grid_height: 0,
            cell_width: 0,
            cell_height: 0,
            inv_width: 0.0,
            inv_height: 0.0,
            smoothing: Smoothing::default(),
            pixels: Vec::new(),
            pool: SlotPool::empty(),
            base_uvs: Vec::new(),
            bitmap_cache: GlyphBitmapCache::new(rasterizer),
            gradient_slot: None,
            dirty: Vec::new(),
            dirty_index: Vec::new(),
            stats: AtlasStats::default(),
        }
    }

    pub fn with_config(rasterizer: R, config: &AtlasConfig) -> Result<Self, AtlasError> {
        let mut atlas = Self::new(rasterizer);
        atlas.create(config)?;
        Ok(atlas)
    }

    /// Allocate the pixel buffer, slots and bitmap cache for `config`.
    ///
    /// An already created atlas is released first. On error the atlas is left
    /// released.
    pub fn create(&mut self, config: &AtlasConfig) -> Result<(), AtlasError> {
        self.release();
        config.validate()?;

        let (cell_width, cell_height) = config.cell_size();
        let len = usize::from(config.texture_width) * usize::from(config.texture_height);
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(len)
            .map_err(|_| AtlasError::Allocation { bytes: len })?;
        pixels.resize(len, 0);

        let slot_count = config.slot_count();
        let pool = SlotPool::with_capacity(slot_count)?;

        let inv_width = 1.0 / f32::from(config.texture_width);
        let inv_height = 1.0 / f32::from(config.texture_height);
        let cell_u = f32::from(cell_width) * inv_width;
        let cell_v = f32::from(cell_height) * inv_height;
        let mut base_uvs = Vec::new();
        base_uvs
            .try_reserve_exact(slot_count)
            .map_err(|_| AtlasError::Allocation {
                bytes: slot_count.saturating_mul(std::mem::size_of::<[f32; 2]>()),
            })?;
        let grid_width = usize::from(config.grid_width);
        base_uvs.extend((0..slot_count).map(|index| {
            let x = (index % grid_width) as f32;
            let y = (index / grid_width) as f32;
            [
                x * cell_u + 0.5 * inv_width,
                y * cell_v + 0.5 * inv_height,
            ]
        }));

        self.bitmap_cache.create(
            config.bitmap_cache_capacity,
            &RasterConfig {
                cell_width,
                cell_height,
                smoothing: config.smoothing,
            },
        )?;

        self.width = config.texture_width;
        self.height = config.texture_height;
        self.grid_width = config.grid_width;
        self.grid_height = config.grid_height;
        self.cell_width = cell_width;
        self.cell_height = cell_height;
        self.inv_width = inv_width;
        self.inv_height = inv_height;
        self.smoothing = config.smoothing;
        self.pixels = pixels;
        self.pool = pool;
        self.base_uvs = base_uvs;
        self.dirty_index = vec![None; slot_count];

        debug!(
            width = self.width,
            height = self.height,
            grid_width = self.grid_width,
            grid_height = self.grid_height,
            cell_width,
            cell_height,
            bitmap_cache_capacity = config.bitmap_cache_capacity,
            "texture atlas created"
        );
        Ok(())
    }

    /// Free the pixel buffer and slots and zero all geometry. The atlas can be
    /// created again afterwards; the rasterizer and its font are kept.
    pub fn release(&mut self) {
        if self.is_created() {
            debug!(resident = self.pool.len(), "texture atlas released");
        }
        self.width = 0;
        self.height = 0;
        self.grid_width = 0;
        self.grid_height = 0;
        self.cell_width = 0;
        self.cell_height = 0;
        self.inv_width = 0.0;
        self.inv_height = 0.0;
        self.smoothing = Smoothing::default();
        self.pixels = Vec::new();
        self.pool = SlotPool::empty();
        self.base_uvs = Vec::new();
        self.bitmap_cache.release();
        self.gradient_slot = None;
        self.dirty.clear();
        self.dirty_index = Vec::new();
        self.stats = AtlasStats::default();
    }

    #[must_use]
    pub fn is_created(&self) -> bool {
        self.pool.capacity() > 0
    }

    /// Slot holding `codepoint`, if resident. Does not touch recency.
    #[must_use]
    pub fn char_slot(&self, codepoint: Codepoint) -> Option<SlotIndex> {
        self.pool.find(codepoint)
    }

    /// Codepoint currently drawn in `slot`.
    #[must_use]
    pub fn slot_codepoint(&self, slot: SlotIndex) -> Option<Codepoint> {
        self.pool.slot(slot)?.occupant().codepoint()
    }

    /// Glyph record of `slot`, occupied or not.
    #[must_use]
    pub fn slot_glyph(&self, slot: SlotIndex) -> Option<&AtlasGlyph> {
        self.pool.slot(slot).map(|slot| slot.payload())
    }

    /// Diagnostics: the slot the next eviction would reclaim among resident glyphs.
    #[must_use]
    pub fn least_recently_used_slot(&self) -> Option<SlotIndex> {
        self.pool.select_least_recently_used()
    }

    /// Diagnostics: the most recently touched resident glyph.
    #[must_use]
    pub fn most_recently_used_slot(&self) -> Option<SlotIndex> {
        self.pool.select_most_recently_used()
    }

    /// Rendered width of a resident glyph, with one pixel of spacing added for
    /// proportional fonts. `None` if the glyph is not resident.
    #[must_use]
    pub fn character_width(&self, codepoint: Codepoint) -> Option<i32> {
        let glyph = self.resident_glyph(codepoint)?;
        let spacing = i32::from(!self.bitmap_cache.is_monospaced());
        Some(i32::from(glyph.width) + spacing)
    }

    /// Rasterizer-reported advance of a resident glyph.
    #[must_use]
    pub fn horizontal_advance(&self, codepoint: Codepoint) -> Option<i32> {
        self.resident_glyph(codepoint)
            .map(|glyph| glyph.metrics.advance_x)
    }

    /// Kerning between two codepoints, straight from the rasterizer.
    #[must_use]
    pub fn kerning(&self, left: Codepoint, right: Codepoint) -> Kerning {
        self.bitmap_cache.kerning(left, right)
    }

    fn resident_glyph(&self, codepoint: Codepoint) -> Option<&AtlasGlyph> {
        let slot = self.pool.find(codepoint)?;
        self.slot_glyph(slot)
    }

    /// Pin slot 0 and fill it with a vertical 0..=255 luminance ramp for
    /// non-text quads. Any glyph living in slot 0 is evicted.
    pub fn create_gradient_slot(&mut self) -> Result<SlotIndex, AtlasError> {
        if !self.is_created() {
            return Err(AtlasError::NotCreated);
        }
        let slot = 0;
        self.pool.reset(slot);
        self.pool.pin(slot);

        let (x, y) = self.cell_origin(slot);
        let stride = usize::from(self.width);
        let cell_w = usize::from(self.cell_width);
        let cell_h = usize::from(self.cell_height);
        for row in 0..cell_h {
            let value = if cell_h <= 1 {
                u8::MAX
            } else {
                (row * usize::from(u8::MAX) / (cell_h - 1)) as u8
            };
            let start = (y + row) * stride + x;
            self.pixels[start..start + cell_w].fill(value);
        }

        // One pixel short of the cell so the quad's filtering pad stays inside.
        if let Some(payload) = self.pool.payload_mut(slot) {
            *payload = AtlasGlyph {
                width: self.cell_width.saturating_sub(1),
                height: self.cell_height.saturating_sub(1),
                metrics: GlyphMetrics::default(),
            };
        }
        let rect = self.cell_rect(slot);
        self.queue_dirty(slot, rect);
        self.gradient_slot = Some(slot);
        debug!(slot, "gradient slot created");
        Ok(slot)
    }

    #[must_use]
    pub fn gradient_slot(&self) -> Option<SlotIndex> {
        self.gradient_slot
    }

    /// Load a new font. Resident glyphs are dropped; the gradient slot stays.
    pub fn load_font(&mut self, source: FontSource<'_>) -> Result<(), AtlasError> {
        self.bitmap_cache.load_font(source)?;
        let dropped = self.pool.evict_all();
        debug!(dropped, "font loaded");
        Ok(())
    }

    #[must_use]
    pub fn encoding(&self) -> FontEncoding {
        self.bitmap_cache.encoding()
    }

    /// Change the character map. Resident glyphs are dropped.
    pub fn set_encoding(&mut self, encoding: FontEncoding) {
        self.bitmap_cache.set_encoding(encoding);
        self.pool.evict_all();
    }

    #[must_use]
    pub fn is_monospaced(&self) -> bool {
        self.bitmap_cache.is_monospaced()
    }

    #[must_use]
    pub fn ascender_to_height_ratio(&self) -> f32 {
        self.bitmap_cache.ascender_to_height_ratio()
    }

    /// Raw luminance buffer, row-major, `width * height` bytes.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Take the rects written since the last call, one per touched cell.
    pub fn take_dirty_rects(&mut self) -> Vec<AtlasRect> {
        self.dirty_index.fill(None);
        std::mem::take(&mut self.dirty)
    }

    #[must_use]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u16 {
        self.height
    }

    #[must_use]
    pub fn grid_width(&self) -> u16 {
        self.grid_width
    }

    #[must_use]
    pub fn grid_height(&self) -> u16 {
        self.grid_height
    }

    #[must_use]
    pub fn cell_width(&self) -> u16 {
        self.cell_width
    }

    #[must_use]
    pub fn cell_height(&self) -> u16 {
        self.cell_height
    }

    #[must_use]
    pub fn smoothing(&self) -> Smoothing {
        self.smoothing
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.pool.capacity()
    }

    /// Number of slots currently holding a glyph.
    #[must_use]
    pub fn resident_count(&self) -> usize {
        self.pool.len()
    }

    /// Current recency generation (advanced once per precache call).
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.pool.generation()
    }

    #[must_use]
    pub fn stats(&self) -> AtlasStats {
        self.stats
    }

    #[must_use]
    pub fn bitmap_cache_stats(&self) -> BitmapCacheStats {
        self.bitmap_cache.stats()
    }

    pub fn rasterizer(&self) -> &R {
        self.bitmap_cache.rasterizer()
    }

    pub fn rasterizer_mut(&mut self) -> &mut R {
        self.bitmap_cache.rasterizer_mut()
    }

    /// Pixel origin of a cell.
    fn cell_origin(&self, slot: SlotIndex) -> (usize, usize) {
        let grid_width = usize::from(self.grid_width).max(1);
        (
            (slot % grid_width) * usize::from(self.cell_width),
            (slot / grid_width) * usize::from(self.cell_height),
        )
    }

    /// Record a write inside `slot`'s cell. A cell already queued grows to
    /// cover both writes, so the queue never exceeds the slot count.
    fn queue_dirty(&mut self, slot: SlotIndex, rect: AtlasRect) {
        let Some(entry) = self.dirty_index.get_mut(slot) else {
            return;
        };
        let queued_at = *entry;
        match queued_at {
            Some(pos) => {
                let queued = &mut self.dirty[pos];
                queued.w = queued.w.max(rect.w);
                queued.h = queued.h.max(rect.h);
            }
            None if rect.area_bytes() > 0 => {
                *entry = Some(self.dirty.len());
                self.dirty.push(rect);
            }
            None => {}
        }
    }

    fn cell_rect(&self, slot: SlotIndex) -> AtlasRect {
        let (x, y) = self.cell_origin(slot);
        AtlasRect {
            x: x as u16,
            y: y as u16,
            w: self.cell_width,
            h: self.cell_height,
        }
    }
}
