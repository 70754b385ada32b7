//! Owned R8 glyph bitmaps and the smoothing filters rasterizers apply to them.

use crate::error::RasterizerError;

/// Row-major 8-bit luminance bitmap.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GlyphBitmap {
    width: u16,
    height: u16,
    pixels: Vec<u8>,
}

impl GlyphBitmap {
    /// A zero-filled bitmap.
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; usize::from(width) * usize::from(height)],
        }
    }

    /// Wrap existing pixels; the length must be exactly `width * height`.
    pub fn from_pixels(width: u16, height: u16, pixels: Vec<u8>) -> Result<Self, RasterizerError> {
        if pixels.len() != usize::from(width) * usize::from(height) {
            return Err(RasterizerError::InvalidBitmap);
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
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
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    #[must_use]
    pub fn get(&self, x: u16, y: u16) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(self.offset(x, y)).copied()
    }

    pub fn set(&mut self, x: u16, y: u16, value: u8) {
        if x < self.width && y < self.height {
            let offset = self.offset(x, y);
            self.pixels[offset] = value;
        }
    }

    fn offset(&self, x: u16, y: u16) -> usize {
        usize::from(y) * usize::from(self.width) + usize::from(x)
    }

    /// Copy into `dst` (row stride `dst_stride`) at `(dst_x, dst_y)`, clipped
    /// to `max_w x max_h`. Returns the copied `(width, height)`.
    ///
    /// Destination bytes outside the copied rect are left untouched.
    pub fn blit_into(
        &self,
        dst: &mut [u8],
        dst_stride: usize,
        dst_x: usize,
        dst_y: usize,
        max_w: u16,
        max_h: u16,
    ) -> (u16, u16) {
        let copy_w = self.width.min(max_w);
        let copy_h = self.height.min(max_h);
        let row_len = usize::from(copy_w);
        let src_stride = usize::from(self.width);

        for row in 0..usize::from(copy_h) {
            let dst_start = (dst_y + row) * dst_stride + dst_x;
            let src_start = row * src_stride;
            let (Some(dst_row), Some(src_row)) = (
                dst.get_mut(dst_start..dst_start + row_len),
                self.pixels.get(src_start..src_start + row_len),
            ) else {
                break;
            };
            dst_row.copy_from_slice(src_row);
        }
        (copy_w, copy_h)
    }

    /// Apply `passes` rounds of a 3x3 box blur. Edge pixels average only their
    /// in-bounds neighbours.
    pub fn blur(&mut self, passes: u32) {
        if self.is_empty() {
            return;
        }
        let w = usize::from(self.width);
        let h = usize::from(self.height);
        let mut scratch = vec![0u8; self.pixels.len()];

        for _ in 0..passes {
            for y in 0..h {
                for x in 0..w {
                    let mut sum = 0u32;
                    let mut count = 0u32;
                    for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                        for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                            sum += u32::from(self.pixels[ny * w + nx]);
                            count += 1;
                        }
                    }
                    scratch[y * w + x] = ((sum + count / 2) / count) as u8;
                }
            }
            std::mem::swap(&mut self.pixels, &mut scratch);
        }
    }

    /// Shrink by an integer `factor` with a box filter (supersampling resolve).
    ///
    /// Partial blocks at the right/bottom edge are averaged over the pixels
    /// they actually cover.
    #[must_use]
    pub fn downsample(&self, factor: u16) -> Self {
        if factor <= 1 || self.is_empty() {
            return self.clone();
        }
        let out_w = self.width.div_ceil(factor);
        let out_h = self.height.div_ceil(factor);
        let mut out = Self::new(out_w, out_h);

        for oy in 0..out_h {
            for ox in 0..out_w {
                let x0 = ox * factor;
                let y0 = oy * factor;
                let x1 = x0.saturating_add(factor).min(self.width);
                let y1 = y0.saturating_add(factor).min(self.height);
                let mut sum = 0u64;
                let mut count = 0u64;
                for y in y0..y1 {
                    for x in x0..x1 {
                        sum += u64::from(self.pixels[self.offset(x, y)]);
                        count += 1;
                    }
                }
                out.set(ox, oy, ((sum + count / 2) / count) as u8);
            }
        }
        out
    }
}
