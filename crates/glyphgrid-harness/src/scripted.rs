//! Call-recording rasterizer with injectable failures.

use glyphgrid::{
    Codepoint, FontSource, GlyphBitmap, GlyphMetrics, GlyphRasterizer, Kerning, RasterConfig,
    RasterizedGlyph, RasterizerError,
};
use rustc_hash::FxHashSet;
use tracing::warn;

/// Rasterizer returning solid `width x height` glyphs whose advance is
/// `width + 1`, failing with [`RasterizerError::MissingGlyph`] for any
/// codepoint registered with [`fail_on`](Self::fail_on).
#[derive(Debug, Clone)]
pub struct ScriptedRasterizer {
    width: u16,
    height: u16,
    monospaced: bool,
    failing: FxHashSet<Codepoint>,
    calls: Vec<Codepoint>,
    fonts_loaded: usize,
    config: Option<RasterConfig>,
}

impl ScriptedRasterizer {
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            monospaced: true,
            failing: FxHashSet::default(),
            calls: Vec::new(),
            fonts_loaded: 0,
            config: None,
        }
    }

    #[must_use]
    pub fn monospaced(mut self, monospaced: bool) -> Self {
        self.monospaced = monospaced;
        self
    }

    #[must_use]
    pub fn fail_on(mut self, codepoint: Codepoint) -> Self {
        self.failing.insert(codepoint);
        self
    }

    /// Codepoints passed to `rasterize`, in order, including failed ones.
    #[must_use]
    pub fn calls(&self) -> &[Codepoint] {
        &self.calls
    }

    #[must_use]
    pub fn fonts_loaded(&self) -> usize {
        self.fonts_loaded
    }

    /// The configuration passed to `configure`, if any.
    #[must_use]
    pub fn config(&self) -> Option<RasterConfig> {
        self.config
    }
}

impl GlyphRasterizer for ScriptedRasterizer {
    fn load_font(&mut self, _source: FontSource<'_>) -> Result<(), RasterizerError> {
        self.fonts_loaded += 1;
        Ok(())
    }

    fn configure(&mut self, config: &RasterConfig) {
        self.config = Some(*config);
    }

    fn rasterize(&mut self, codepoint: Codepoint) -> Result<RasterizedGlyph, RasterizerError> {
        self.calls.push(codepoint);
        if self.failing.contains(&codepoint) {
            warn!(codepoint, "scripted rasterizer failure");
            return Err(RasterizerError::MissingGlyph(codepoint));
        }
        let len = usize::from(self.width) * usize::from(self.height);
        Ok(RasterizedGlyph {
            bitmap: GlyphBitmap::from_pixels(self.width, self.height, vec![0xFF; len])?,
            metrics: GlyphMetrics {
                advance_x: i32::from(self.width) + 1,
                bearing_x: 0,
                bearing_y: i32::from(self.height),
            },
        })
    }

    fn kerning(&self, _left: Codepoint, _right: Codepoint) -> Kerning {
        Kerning::default()
    }

    fn is_monospaced(&self) -> bool {
        self.monospaced
    }
}
