#![forbid(unsafe_code)]

//! Deterministic rasterizers for exercising `glyphgrid` without a font engine.
//!
//! - [`BlockRasterizer`] draws procedural glyphs: an outlined box whose inner
//!   pattern depends on the codepoint and the loaded font bytes. It honours
//!   the configured cell size and smoothing.
//! - [`ScriptedRasterizer`] returns fixed-size glyphs, records every call and
//!   fails on demand for chosen codepoints.

mod block;
mod scripted;

pub use block::BlockRasterizer;
pub use scripted::ScriptedRasterizer;
