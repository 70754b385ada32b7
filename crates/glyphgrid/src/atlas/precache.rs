//! Batch precache: make every codepoint of a string resident before drawing.

use tracing::{debug, trace};

use super::{AtlasGlyph, AtlasRect, TextureAtlas};
use crate::Codepoint;
use crate::error::AtlasError;
use crate::rasterizer::GlyphRasterizer;
use crate::slot_pool::SlotIndex;

/// Result of a successful precache call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecacheOutcome {
    /// Every codepoint was already resident; the pixel buffer is unchanged.
    Unchanged,
    /// At least one glyph was blitted; the texture needs re-uploading.
    Updated,
}

impl PrecacheOutcome {
    #[must_use]
    pub const fn is_updated(self) -> bool {
        matches!(self, Self::Updated)
    }
}

impl<R: GlyphRasterizer> TextureAtlas<R> {
    /// Precache the characters of `text`.
    pub fn precache_str(&mut self, text: &str) -> Result<PrecacheOutcome, AtlasError> {
        self.precache(text.chars().map(u32::from))
    }

    /// Ensure every codepoint has a resident slot.
    ///
    /// All codepoints of one call share a single recency generation. Hits only
    /// refresh recency; misses evict the least recently used slot and blit the
    /// glyph into its cell. The first error stops the call. Glyphs committed
    /// before it stay resident and their dirty rects stay queued.
    pub fn precache<I>(&mut self, codepoints: I) -> Result<PrecacheOutcome, AtlasError>
    where
        I: IntoIterator<Item = Codepoint>,
    {
        let generation = self.pool.advance_generation();
        let mut blits = 0u32;

        for codepoint in codepoints {
            if let Some(slot) = self.pool.find(codepoint) {
                self.pool.mark_used(slot, codepoint);
                self.stats.hits += 1;
                continue;
            }
            self.stats.misses += 1;
            if let Err(err) = self.insert(codepoint) {
                debug!(generation, blits, codepoint, error = %err, "precache aborted");
                return Err(err);
            }
            blits += 1;
        }

        trace!(generation, blits, "precache complete");
        Ok(if blits > 0 {
            PrecacheOutcome::Updated
        } else {
            PrecacheOutcome::Unchanged
        })
    }

    /// Claim a victim slot for `codepoint` and draw it. The slot is only
    /// modified once the glyph is in hand.
    fn insert(&mut self, codepoint: Codepoint) -> Result<SlotIndex, AtlasError> {
        let victim = self
            .pool
            .select_victim()
            .ok_or(AtlasError::EvictionExhausted)?;
        let (x, y) = self.cell_origin(victim);
        let stride = usize::from(self.width);
        let (cell_w, cell_h) = (self.cell_width, self.cell_height);

        let glyph = self.bitmap_cache.get_glyph(codepoint)?;
        let metrics = glyph.metrics;
        let (width, height) = glyph
            .bitmap
            .blit_into(&mut self.pixels, stride, x, y, cell_w, cell_h);

        if let Some(evicted) = self.pool.mark_used(victim, codepoint) {
            self.stats.evictions += 1;
            trace!(slot = victim, evicted, codepoint, "atlas eviction");
        }
        if let Some(payload) = self.pool.payload_mut(victim) {
            *payload = AtlasGlyph {
                width,
                height,
                metrics,
            };
        }

        let rect = AtlasRect {
            x: x as u16,
            y: y as u16,
            w: width,
            h: height,
        };
        self.queue_dirty(victim, rect);
        self.stats.blits += 1;
        self.stats.bytes_uploaded += rect.area_bytes() as u64;
        Ok(victim)
    }
}
