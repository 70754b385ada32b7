//! Atlas construction parameters.
//!
//! ```
//! use glyphgrid::{AtlasConfig, SmoothAmount, SmoothMethod};
//!
//! let config = AtlasConfig::default()
//!     .with_texture_size(256, 256)
//!     .with_grid(16, 16)
//!     .with_smoothing(SmoothMethod::Supersample, SmoothAmount::X2);
//! assert!(config.validate().is_ok());
//! assert_eq!(config.cell_size(), (16, 16));
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default number of decoded bitmaps kept in front of the rasterizer.
pub const DEFAULT_BITMAP_CACHE_CAPACITY: usize = 8;

/// How glyph edges are softened by the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothMethod {
    #[default]
    None,
    Blur,
    Supersample,
}

/// Strength of [`SmoothMethod`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmoothAmount {
    #[default]
    None,
    X2,
    X4,
}

impl SmoothAmount {
    /// Supersampling factor or blur pass count.
    #[must_use]
    pub const fn factor(self) -> u16 {
        match self {
            Self::None => 1,
            Self::X2 => 2,
            Self::X4 => 4,
        }
    }
}

/// Smoothing options, forwarded opaquely to the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Smoothing {
    pub method: SmoothMethod,
    pub amount: SmoothAmount,
}

/// What the rasterizer is told when the bitmap cache is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RasterConfig {
    /// Target glyph box; bitmaps larger than this are clipped by the atlas.
    pub cell_width: u16,
    pub cell_height: u16,
    pub smoothing: Smoothing,
}

/// Texture atlas configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    pub texture_width: u16,
    pub texture_height: u16,
    pub smoothing: Smoothing,
    /// Cells per row.
    pub grid_width: u16,
    /// Cells per column.
    pub grid_height: u16,
    /// Slots in the decoded-bitmap cache. Must be at least 1.
    pub bitmap_cache_capacity: usize,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            texture_width: 512,
            texture_height: 512,
            smoothing: Smoothing::default(),
            grid_width: 16,
            grid_height: 16,
            bitmap_cache_capacity: DEFAULT_BITMAP_CACHE_CAPACITY,
        }
    }
}

impl AtlasConfig {
    #[must_use]
    pub fn new(texture_width: u16, texture_height: u16, grid_width: u16, grid_height: u16) -> Self {
        Self {
            texture_width,
            texture_height,
            grid_width,
            grid_height,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_texture_size(mut self, width: u16, height: u16) -> Self {
        self.texture_width = width;
        self.texture_height = height;
        self
    }

    #[must_use]
    pub fn with_grid(mut self, grid_width: u16, grid_height: u16) -> Self {
        self.grid_width = grid_width;
        self.grid_height = grid_height;
        self
    }

    #[must_use]
    pub fn with_smoothing(mut self, method: SmoothMethod, amount: SmoothAmount) -> Self {
        self.smoothing = Smoothing { method, amount };
        self
    }

    #[must_use]
    pub fn with_bitmap_cache_capacity(mut self, capacity: usize) -> Self {
        self.bitmap_cache_capacity = capacity;
        self
    }

    /// Number of atlas slots (one per grid cell).
    #[must_use]
    pub fn slot_count(&self) -> usize {
        usize::from(self.grid_width) * usize::from(self.grid_height)
    }

    /// Integer cell size in pixels; remainder pixels are unused padding.
    #[must_use]
    pub fn cell_size(&self) -> (u16, u16) {
        (
            self.texture_width.checked_div(self.grid_width).unwrap_or(0),
            self.texture_height.checked_div(self.grid_height).unwrap_or(0),
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.texture_width == 0 || self.texture_height == 0 {
            return Err(ConfigError::ZeroTextureSize);
        }
        if self.slot_count() == 0 {
            return Err(ConfigError::ZeroAreaGrid);
        }
        let (cell_w, cell_h) = self.cell_size();
        if cell_w == 0 || cell_h == 0 {
            return Err(ConfigError::CellTooSmall);
        }
        if self.bitmap_cache_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        Ok(())
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
