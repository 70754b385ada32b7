//! End-to-end atlas scenarios driven by the reference rasterizers.

use glyphgrid::{
    AtlasConfig, AtlasError, AtlasRect, FontSource, GlyphRasterizer, PrecacheOutcome,
    RasterizerError, SmoothAmount, SmoothMethod, Smoothing, TextureAtlas,
};
use glyphgrid_harness::{BlockRasterizer, ScriptedRasterizer};
use pretty_assertions::assert_eq;

fn cp(c: char) -> u32 {
    c as u32
}

fn block_atlas() -> TextureAtlas<BlockRasterizer> {
    TextureAtlas::with_config(BlockRasterizer::new(), &AtlasConfig::new(64, 64, 8, 8))
        .expect("atlas")
}

// =============================================================================
// Geometry and residency
// =============================================================================

#[test]
fn sixty_four_cells_of_eight_pixels() {
    let atlas = block_atlas();
    assert_eq!(atlas.slot_count(), 64);
    assert_eq!((atlas.cell_width(), atlas.cell_height()), (8, 8));
    assert_eq!(atlas.pixels().len(), 64 * 64);
    assert_eq!(atlas.resident_count(), 0);
}

#[test]
fn first_precache_updates_and_repeat_is_unchanged() {
    let mut atlas = block_atlas();
    assert_eq!(atlas.precache_str("AB"), Ok(PrecacheOutcome::Updated));
    assert_eq!(atlas.resident_count(), 2);
    assert!(atlas.char_slot(cp('A')).is_some());
    assert!(atlas.char_slot(cp('B')).is_some());
    assert_eq!(atlas.precache_str("AB"), Ok(PrecacheOutcome::Unchanged));
    assert_eq!(atlas.stats().blits, 2);
}

#[test]
fn sixty_fifth_codepoint_evicts_the_first() {
    let mut atlas = block_atlas();
    let first = 0x4E00;
    let codepoints: Vec<u32> = (first..first + 65).collect();

    assert_eq!(atlas.precache(codepoints.iter().copied()), Ok(PrecacheOutcome::Updated));
    assert_eq!(atlas.resident_count(), 64);
    assert_eq!(atlas.char_slot(first), None);
    assert_eq!(atlas.char_slot(first + 64), Some(0));
    assert!(codepoints[1..].iter().all(|&c| atlas.char_slot(c).is_some()));
    assert_eq!(atlas.stats().evictions, 1);
}

#[test]
fn older_calls_are_evicted_before_newer_ones() {
    let config = AtlasConfig::new(24, 8, 3, 1);
    let mut atlas =
        TextureAtlas::with_config(ScriptedRasterizer::new(2, 2), &config).expect("atlas");
    atlas.precache_str("A").expect("precache");
    atlas.precache_str("B").expect("precache");
    atlas.precache_str("C").expect("precache");
    // Touch A so B becomes the oldest.
    atlas.precache_str("A").expect("precache");
    atlas.precache_str("D").expect("precache");

    assert_eq!(atlas.char_slot(cp('B')), None);
    assert!(atlas.char_slot(cp('A')).is_some());
    assert_eq!(atlas.least_recently_used_slot(), atlas.char_slot(cp('C')));
    assert_eq!(atlas.most_recently_used_slot(), atlas.char_slot(cp('D')));
}

// =============================================================================
// Metrics
// =============================================================================

#[test]
fn proportional_metrics_round_trip() {
    let mut atlas = block_atlas();
    atlas.precache_str("AV").expect("precache");

    let mut reference = atlas.rasterizer().clone();
    for c in ['A', 'V'] {
        let glyph = reference.rasterize(cp(c)).expect("raster");
        assert_eq!(atlas.horizontal_advance(cp(c)), Some(glyph.metrics.advance_x));
        assert_eq!(
            atlas.character_width(cp(c)),
            Some(i32::from(glyph.bitmap.width()) + 1)
        );
    }
    assert_eq!(atlas.kerning(cp('A'), cp('V')).dx, -1);
    assert_eq!(atlas.kerning(cp('V'), cp('V')).dx, 0);
}

#[test]
fn monospaced_width_has_no_spacing() {
    let config = AtlasConfig::new(64, 64, 8, 8);
    let mut atlas =
        TextureAtlas::with_config(BlockRasterizer::new().monospaced(true), &config)
            .expect("atlas");
    atlas.precache_str("iW").expect("precache");
    assert_eq!(atlas.character_width(cp('i')), Some(7));
    assert_eq!(atlas.character_width(cp('W')), Some(7));
    assert!(atlas.is_monospaced());
}

#[test]
fn metrics_of_non_resident_glyphs_are_absent() {
    let atlas = block_atlas();
    assert_eq!(atlas.character_width(cp('q')), None);
    assert_eq!(atlas.horizontal_advance(cp('q')), None);
}

#[test]
fn quad_is_biased_by_one_texel() {
    let mut atlas = block_atlas();
    atlas.precache_str("A").expect("precache");
    let slot = atlas.char_slot(cp('A')).expect("resident");
    let glyph = *atlas.slot_glyph(slot).expect("glyph");
    let [u, v] = atlas.slot_base_uv(slot).expect("base uv");
    let quad = atlas.texture_coord(slot).expect("quad");
    let texel = 1.0 / 64.0;

    let expected = [
        u - texel,
        v - texel,
        u + f32::from(glyph.width) * texel,
        v + f32::from(glyph.height) * texel,
    ];
    for (got, want) in quad.uv.iter().zip(expected) {
        assert!((got - want).abs() < 1e-6, "{got} != {want}");
    }
    assert_eq!(
        quad.size,
        (i32::from(glyph.width) + 1, i32::from(glyph.height) + 1)
    );
}

// =============================================================================
// Failure handling
// =============================================================================

#[test]
fn failed_glyph_keeps_earlier_blits() {
    let config = AtlasConfig::new(64, 64, 8, 8);
    let rasterizer = ScriptedRasterizer::new(3, 3).fail_on(cp('x'));
    let mut atlas = TextureAtlas::with_config(rasterizer, &config).expect("atlas");

    let err = atlas.precache_str("abxc").unwrap_err();
    assert_eq!(
        err,
        AtlasError::Rasterization {
            codepoint: cp('x'),
            source: RasterizerError::MissingGlyph(cp('x')),
        }
    );
    assert!(atlas.char_slot(cp('a')).is_some());
    assert!(atlas.char_slot(cp('b')).is_some());
    assert_eq!(atlas.char_slot(cp('x')), None);
    assert_eq!(atlas.char_slot(cp('c')), None);
    assert_eq!(atlas.take_dirty_rects().len(), 2);
    assert_eq!(
        atlas.rasterizer().calls(),
        &[cp('a'), cp('b'), cp('x')][..]
    );
}

#[test]
fn released_atlas_rejects_work() {
    let mut atlas = block_atlas();
    atlas.precache_str("hello").expect("precache");
    atlas.release();

    assert!(!atlas.is_created());
    assert_eq!(atlas.slot_count(), 0);
    assert_eq!(atlas.char_slot(cp('h')), None);
    assert_eq!(atlas.precache_str("h"), Err(AtlasError::EvictionExhausted));
    assert_eq!(atlas.create_gradient_slot(), Err(AtlasError::NotCreated));

    atlas
        .create(&AtlasConfig::new(32, 32, 4, 4))
        .expect("recreate");
    assert_eq!(atlas.precache_str("h"), Ok(PrecacheOutcome::Updated));
}

#[test]
fn invalid_config_leaves_atlas_released() {
    let mut atlas = block_atlas();
    let err = atlas.create(&AtlasConfig::new(4, 4, 8, 8)).unwrap_err();
    assert!(matches!(err, AtlasError::Config(_)));
    assert!(!atlas.is_created());
}

// =============================================================================
// Bitmap cache tier
// =============================================================================

#[test]
fn re_precached_glyph_comes_from_the_bitmap_cache() {
    let config = AtlasConfig::new(16, 8, 2, 1).with_bitmap_cache_capacity(8);
    let mut atlas =
        TextureAtlas::with_config(ScriptedRasterizer::new(2, 2), &config).expect("atlas");
    atlas.precache_str("a").expect("precache");
    atlas.precache_str("b").expect("precache");
    atlas.precache_str("c").expect("precache");
    assert_eq!(atlas.char_slot(cp('a')), None);

    atlas.precache_str("a").expect("precache");
    assert!(atlas.char_slot(cp('a')).is_some());
    assert_eq!(atlas.rasterizer().calls(), &[cp('a'), cp('b'), cp('c')][..]);
    assert_eq!(atlas.bitmap_cache_stats().hits, 1);
}

#[test]
fn borrowed_rasterizer_outlives_the_atlas() {
    let mut rasterizer = ScriptedRasterizer::new(2, 2);
    {
        let mut atlas =
            TextureAtlas::with_config(&mut rasterizer, &AtlasConfig::new(32, 32, 4, 4))
                .expect("atlas");
        atlas.precache_str("hi").expect("precache");
    }
    assert_eq!(rasterizer.calls(), &[cp('h'), cp('i')][..]);
}

#[test]
fn smoothing_is_forwarded_to_the_rasterizer() {
    let config = AtlasConfig::new(64, 64, 8, 8)
        .with_smoothing(SmoothMethod::Supersample, SmoothAmount::X2);
    let atlas =
        TextureAtlas::with_config(ScriptedRasterizer::new(2, 2), &config).expect("atlas");
    let expected = Smoothing {
        method: SmoothMethod::Supersample,
        amount: SmoothAmount::X2,
    };
    assert_eq!(atlas.smoothing(), expected);
    let forwarded = atlas.rasterizer().config().expect("configured");
    assert_eq!(forwarded.smoothing, expected);
    assert_eq!((forwarded.cell_width, forwarded.cell_height), (8, 8));
}

#[test]
fn config_from_json_drives_creation() {
    let config = AtlasConfig::from_json_str(
        r#"{"texture_width":128,"texture_height":64,"grid_width":16,"grid_height":8,
            "smoothing":{"method":"blur","amount":"x2"}}"#,
    )
    .expect("json");
    let atlas = TextureAtlas::with_config(BlockRasterizer::new(), &config).expect("atlas");
    assert_eq!(atlas.slot_count(), 128);
    assert_eq!((atlas.cell_width(), atlas.cell_height()), (8, 8));
    assert_eq!(atlas.smoothing().method, SmoothMethod::Blur);
}

// =============================================================================
// Fonts and the gradient slot
// =============================================================================

#[test]
fn loading_a_font_drops_glyphs_but_keeps_the_gradient() {
    let mut atlas = block_atlas();
    assert_eq!(atlas.create_gradient_slot(), Ok(0));
    atlas.precache_str("abc").expect("precache");
    assert_eq!(atlas.resident_count(), 3);

    let dir = tempfile::tempdir().expect("tempdir");
    let font = dir.path().join("block.font");
    std::fs::write(&font, b"block font v2").expect("write font");
    atlas.load_font(FontSource::Path(&font)).expect("load");

    assert_eq!(atlas.resident_count(), 0);
    assert_eq!(atlas.gradient_slot(), Some(0));
    let before = atlas.rasterizer().rasterized();
    atlas.precache_str("a").expect("precache");
    assert_eq!(atlas.rasterizer().rasterized(), before + 1);
    assert_ne!(atlas.char_slot(cp('a')), Some(0));
}

#[test]
fn missing_font_file_is_a_font_error() {
    let mut atlas = block_atlas();
    let dir = tempfile::tempdir().expect("tempdir");
    let err = atlas
        .load_font(FontSource::Path(&dir.path().join("missing.font")))
        .unwrap_err();
    assert!(matches!(err, AtlasError::Font(RasterizerError::FontLoad(_))));
}

#[test]
fn gradient_is_a_vertical_ramp() {
    let mut atlas = block_atlas();
    atlas.create_gradient_slot().expect("gradient");
    let stride = usize::from(atlas.width());
    let px = atlas.pixels();
    assert_eq!(px[0], 0);
    assert_eq!(px[7 * stride], 255);
    assert_eq!(px[7 * stride + 7], 255);
    assert!(px[3 * stride] > px[2 * stride]);
    assert_eq!(
        atlas.take_dirty_rects(),
        vec![AtlasRect {
            x: 0,
            y: 0,
            w: 8,
            h: 8
        }]
    );
}

// =============================================================================
// Export
// =============================================================================

#[test]
fn atlas_is_written_as_bmp() {
    let mut atlas = block_atlas();
    atlas.precache_str("glyph").expect("precache");
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("atlas.bmp");
    atlas.write_to_file(&path).expect("write");

    let bytes = std::fs::read(&path).expect("read");
    assert_eq!(&bytes[0..2], b"BM");
    assert_eq!(bytes.len(), 54 + 64 * 64 * 3);
    assert_eq!(bytes, atlas.encode_bmp().expect("encode"));
}
