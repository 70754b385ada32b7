//! Texture coordinates for drawing a resident slot.

use super::TextureAtlas;
use crate::rasterizer::GlyphRasterizer;
use crate::slot_pool::SlotIndex;

/// Everything a renderer needs to emit one glyph quad.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GlyphQuad {
    /// `[u_min, v_min, u_max, v_max]`.
    pub uv: [f32; 4],
    /// Quad size in pixels: glyph size plus the one-texel filtering pad.
    pub size: (i32, i32),
    /// Bearing of the glyph, passed through from the rasterizer.
    pub offset: (i32, i32),
}

impl<R: GlyphRasterizer> TextureAtlas<R> {
    /// UV rectangle, size and offset for `slot`; `None` if the slot does not
    /// exist.
    ///
    /// The rectangle starts one texel before the slot's base UV and spans the
    /// glyph's own pixels from the unshifted base, so it is exactly one texel
    /// larger than the glyph in each axis. Bilinear filtering at the edge then
    /// reads the cell's transparent border instead of a neighbouring glyph.
    #[must_use]
    pub fn texture_coord(&self, slot: SlotIndex) -> Option<GlyphQuad> {
        let [u, v] = *self.base_uvs.get(slot)?;
        let glyph = self.slot_glyph(slot)?;
        let width = f32::from(glyph.width);
        let height = f32::from(glyph.height);

        Some(GlyphQuad {
            uv: [
                u - self.inv_width,
                v - self.inv_height,
                u + width * self.inv_width,
                v + height * self.inv_height,
            ],
            size: (i32::from(glyph.width) + 1, i32::from(glyph.height) + 1),
            offset: (glyph.metrics.bearing_x, glyph.metrics.bearing_y),
        })
    }

    /// Base UV (half-texel centred cell origin) of `slot`.
    #[must_use]
    pub fn slot_base_uv(&self, slot: SlotIndex) -> Option<[f32; 2]> {
        self.base_uvs.get(slot).copied()
    }
}
