//! Procedural box glyphs.

use std::hash::{Hash, Hasher};

use glyphgrid::{
    Codepoint, FontEncoding, FontSource, GlyphBitmap, GlyphMetrics, GlyphRasterizer, Kerning,
    RasterConfig, RasterizedGlyph, RasterizerError, SmoothMethod,
};
use rustc_hash::{FxHashMap, FxHasher};
use tracing::{debug, trace};

/// Seed used until a font is loaded.
const BUILTIN_SEED: u64 = 0x9E37_79B9_7F4A_7C15;

/// Rasterizer that draws an outlined box per codepoint.
///
/// Control characters (below U+0020) have no glyph. Space is an empty bitmap
/// with a normal advance. Every other codepoint gets a box with a 1 px border
/// and a hashed interior pattern.
#[derive(Debug, Clone)]
pub struct BlockRasterizer {
    seed: Option<u64>,
    config: RasterConfig,
    monospaced: bool,
    encoding: FontEncoding,
    kerning: FxHashMap<(Codepoint, Codepoint), Kerning>,
    rasterized: u64,
}

impl Default for BlockRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockRasterizer {
    /// A proportional rasterizer with the built-in font and a few kerning pairs.
    #[must_use]
    pub fn new() -> Self {
        let mut kerning = FxHashMap::default();
        for (left, right) in [('A', 'V'), ('V', 'A'), ('T', 'o'), ('L', 'T')] {
            kerning.insert((left as Codepoint, right as Codepoint), Kerning { dx: -1, dy: 0 });
        }
        Self {
            seed: Some(BUILTIN_SEED),
            config: RasterConfig::default(),
            monospaced: false,
            encoding: FontEncoding::Unicode,
            kerning,
            rasterized: 0,
        }
    }

    /// A rasterizer that reports [`RasterizerError::NoFont`] until
    /// [`GlyphRasterizer::load_font`] succeeds.
    #[must_use]
    pub fn without_font() -> Self {
        Self {
            seed: None,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn monospaced(mut self, monospaced: bool) -> Self {
        self.monospaced = monospaced;
        self
    }

    #[must_use]
    pub fn with_kerning(mut self, left: Codepoint, right: Codepoint, dx: i32) -> Self {
        self.kerning.insert((left, right), Kerning { dx, dy: 0 });
        self
    }

    /// The configuration last passed to `configure`.
    #[must_use]
    pub fn config(&self) -> RasterConfig {
        self.config
    }

    /// How many glyphs have been rasterized so far.
    #[must_use]
    pub fn rasterized(&self) -> u64 {
        self.rasterized
    }

    /// Glyph box in output pixels for `codepoint`.
    fn glyph_size(&self, codepoint: Codepoint) -> (u16, u16) {
        let cell_w = self.config.cell_width.max(2);
        let cell_h = self.config.cell_height.max(2);
        let height = cell_h - 1;
        if self.monospaced {
            return (cell_w - 1, height);
        }
        // Narrow glyphs for punctuation-ish codepoints, wide for the rest.
        let span = u32::from(cell_w - 1);
        let width = 1 + (codepoint % span) as u16;
        (width.min(cell_w - 1), height)
    }

    fn pattern_bit(seed: u64, codepoint: Codepoint, x: u16, y: u16) -> bool {
        let mut hasher = FxHasher::default();
        (seed, codepoint, x, y).hash(&mut hasher);
        hasher.finish() & 1 == 1
    }

    /// Largest scale up to `wanted` at which a `width x height` glyph still
    /// fits in `u16` dimensions.
    fn fit_scale(width: u16, height: u16, wanted: u16) -> u16 {
        let longest = width.max(height).max(1);
        wanted.min(u16::MAX / longest).max(1)
    }

    /// Draw at `scale` times the output size. The border is 1 px at that scale;
    /// the pattern never touches the outermost output pixels. `scale` must come
    /// from [`fit_scale`](Self::fit_scale).
    fn draw(seed: u64, codepoint: Codepoint, width: u16, height: u16, scale: u16) -> GlyphBitmap {
        let w = width.saturating_mul(scale);
        let h = height.saturating_mul(scale);
        let mut bitmap = GlyphBitmap::new(w, h);
        for y in 0..h {
            for x in 0..w {
                let (ox, oy) = (x / scale, y / scale);
                let border = x == 0 || y == 0 || x + 1 == w || y + 1 == h;
                let interior = ox > 0 && oy > 0 && ox + 1 < width && oy + 1 < height;
                let inner = interior && Self::pattern_bit(seed, codepoint, ox, oy);
                if border || inner {
                    bitmap.set(x, y, 0xFF);
                }
            }
        }
        bitmap
    }

    fn mapped(&self, codepoint: Codepoint) -> Codepoint {
        match self.encoding {
            FontEncoding::Unicode => codepoint,
            FontEncoding::Symbol => 0xF000 | (codepoint & 0xFF),
            FontEncoding::Latin1 | FontEncoding::AppleRoman => codepoint & 0xFF,
        }
    }
}

impl GlyphRasterizer for BlockRasterizer {
    fn load_font(&mut self, source: FontSource<'_>) -> Result<(), RasterizerError> {
        let bytes = match source {
            FontSource::Path(path) => std::fs::read(path)
                .map_err(|err| RasterizerError::FontLoad(format!("{}: {err}", path.display())))?,
            FontSource::Memory(bytes) => bytes.to_vec(),
        };
        if bytes.is_empty() {
            return Err(RasterizerError::FontLoad("empty font data".to_owned()));
        }
        let mut hasher = FxHasher::default();
        bytes.hash(&mut hasher);
        let seed = hasher.finish();
        self.seed = Some(seed);
        debug!(bytes = bytes.len(), seed, "block font loaded");
        Ok(())
    }

    fn configure(&mut self, config: &RasterConfig) {
        self.config = *config;
    }

    fn rasterize(&mut self, codepoint: Codepoint) -> Result<RasterizedGlyph, RasterizerError> {
        let seed = self.seed.ok_or(RasterizerError::NoFont)?;
        if codepoint < 0x20 || char::from_u32(codepoint).is_none() {
            return Err(RasterizerError::MissingGlyph(codepoint));
        }
        let (width, height) = self.glyph_size(codepoint);
        let advance_x = i32::from(width) + i32::from(!self.monospaced);
        let metrics = GlyphMetrics {
            advance_x,
            bearing_x: 0,
            bearing_y: i32::from(height),
        };

        if codepoint == ' ' as Codepoint {
            self.rasterized += 1;
            return Ok(RasterizedGlyph {
                bitmap: GlyphBitmap::default(),
                metrics,
            });
        }

        let glyph_cp = self.mapped(codepoint);
        let smoothing = self.config.smoothing;
        let factor = Self::fit_scale(width, height, smoothing.amount.factor());
        let bitmap = match smoothing.method {
            SmoothMethod::None => Self::draw(seed, glyph_cp, width, height, 1),
            SmoothMethod::Supersample => {
                Self::draw(seed, glyph_cp, width, height, factor).downsample(factor)
            }
            SmoothMethod::Blur => {
                let mut bitmap = Self::draw(seed, glyph_cp, width, height, 1);
                bitmap.blur(u32::from(smoothing.amount.factor()).saturating_sub(1));
                bitmap
            }
        };

        self.rasterized += 1;
        trace!(codepoint, width, height, "block glyph rasterized");
        Ok(RasterizedGlyph { bitmap, metrics })
    }

    fn kerning(&self, left: Codepoint, right: Codepoint) -> Kerning {
        self.kerning.get(&(left, right)).copied().unwrap_or_default()
    }

    fn is_monospaced(&self) -> bool {
        self.monospaced
    }

    fn encoding(&self) -> FontEncoding {
        self.encoding
    }

    fn set_encoding(&mut self, encoding: FontEncoding) {
        self.encoding = encoding;
    }
}
