//! End-to-end scenarios spanning more than one module: building small
//! synthetic fonts in memory, writing them out through each container, and
//! checking what comes back.

use sfnttools::tables::glyf::component::{ComponentGlyph, GlyphComponent, XyGlyphComponent};
use sfnttools::tables::glyf::simple::{GlyphCoordinate, SimpleGlyph};
use sfnttools::tables::glyf::{GlyfTable, GlyphSlot};
use sfnttools::tables::head::HeadTable;
use sfnttools::tables::hhea::HheaTable;
use sfnttools::tables::hmtx::{HmtxTable, LongHoriMetric};
use sfnttools::tables::loca::LocaTable;
use sfnttools::tables::maxp::MaxpTable;
use sfnttools::tables::Table;
use sfnttools::{tag, FileTag, Font, FontCollection, SfntConfigs, SfntVersion, TtcPayload};

/// A minimal but structurally complete TrueType font: one glyph, one
/// horizontal metric, an empty outline.
fn empty_glyph_font() -> Font {
    let mut font = Font::new(SfntVersion::TrueType);
    font.insert(tag::HEAD, Table::Head(HeadTable::default())).unwrap();
    font.insert(
        tag::MAXP,
        Table::Maxp(MaxpTable { num_glyphs: 1, true_type_maxima: Some(Default::default()) }),
    )
    .unwrap();
    font.insert(tag::HHEA, Table::Hhea(HheaTable { num_hori_metrics: 1, ..Default::default() })).unwrap();
    font.insert(
        tag::HMTX,
        Table::Hmtx(HmtxTable {
            long_metrics: vec![LongHoriMetric { advance_width: 500, left_side_bearing: 0 }],
            trailing_left_side_bearings: vec![],
        }),
    )
    .unwrap();
    font.insert(tag::LOCA, Table::Loca(LocaTable { offsets: vec![0, 0] })).unwrap();
    font.insert(tag::GLYF, Table::Glyf(GlyfTable { glyphs: vec![GlyphSlot::Empty] })).unwrap();
    font
}

// 1. Parsing a plain SFNT TrueType font recovers every table unchanged and
//    a correct `head.checksumAdjustment`.
#[test]
fn sfnt_truetype_round_trip_preserves_every_table() {
    let configs = SfntConfigs::default();
    let font = empty_glyph_font();

    let bytes = font.dump_sfnt(&configs).unwrap();
    assert_eq!(u32::from_be_bytes(bytes[0..4].try_into().unwrap()), SfntVersion::TrueType.value());

    let parsed = Font::parse(&bytes, Some(configs), None).unwrap();
    assert_eq!(parsed.sfnt_version, SfntVersion::TrueType);
    for t in font.tags() {
        assert_eq!(parsed.get(t), font.get(t), "table {t} changed across round-trip");
    }
}

// 2. A font dumped to WOFF2 and reparsed is structurally identical to the
//    original: every table, compared by value, matches.
#[cfg(feature = "brotli")]
#[test]
fn woff2_round_trip_is_structurally_equal() {
    let configs = SfntConfigs::default();
    let font = empty_glyph_font();

    let woff2_bytes = font.dump_woff2(&configs).unwrap();
    assert_eq!(u32::from_be_bytes(woff2_bytes[0..4].try_into().unwrap()), FileTag::WOFF2_TAG);

    let reparsed = Font::parse(&woff2_bytes, Some(configs), None).unwrap();
    assert_eq!(reparsed.sfnt_version, font.sfnt_version);
    for t in font.tags() {
        assert_eq!(reparsed.get(t), font.get(t), "table {t} changed across the WOFF2 transform");
    }
}

// 3. A `.ttc` holding two fonts that happen to dump identical tables under
//    the same tag: both members come back with those tables intact. This
//    crate doesn't try to reconstruct sharing on write, but confirms the
//    read side is unaffected by whether source bytes were actually shared.
#[test]
fn ttc_round_trip_keeps_each_member_font_intact() {
    let configs = SfntConfigs::default();
    let fonts = vec![empty_glyph_font(), empty_glyph_font()];
    let collection = FontCollection { fonts, ttc_payload: None, woff_payload: None };

    let ttc_bytes = collection.dump_ttc(&configs).unwrap();
    assert_eq!(u32::from_be_bytes(ttc_bytes[0..4].try_into().unwrap()), FileTag::TTC_TAG);

    let parsed = FontCollection::parse(&ttc_bytes, Some(configs)).unwrap();
    assert_eq!(parsed.num_fonts(), 2);
    for font in &parsed.fonts {
        assert_eq!(font.get(tag::MAXP), collection.fonts[0].get(tag::MAXP));
        assert_eq!(font.get(tag::HMTX), collection.fonts[0].get(tag::HMTX));
    }
}

// 4. A WOFF2-wrapped collection round-trips two identical fonts: every
//    member's `glyf`/`loca` survive the transform, and a byte-identical
//    table shared by both members is only materialized once in the
//    directory (checked indirectly via successful, correct reparse of
//    both members rather than inspecting the compressed stream directly).
#[cfg(feature = "brotli")]
#[test]
fn woff2_collection_round_trip_preserves_glyf_loca_per_member() {
    let configs = SfntConfigs::default();
    let fonts = vec![empty_glyph_font(), empty_glyph_font()];
    let collection = FontCollection {
        fonts,
        ttc_payload: Some(TtcPayload { major_version: 1, minor_version: 0, dsig: None }),
        woff_payload: None,
    };

    let woff2_bytes = collection.dump_woff2(&configs).unwrap();
    assert_eq!(u32::from_be_bytes(woff2_bytes[0..4].try_into().unwrap()), FileTag::WOFF2_TAG);

    let parsed = FontCollection::parse(&woff2_bytes, Some(configs)).unwrap();
    assert_eq!(parsed.num_fonts(), 2);
    for font in &parsed.fonts {
        assert_eq!(font.get(tag::GLYF), collection.fonts[0].get(tag::GLYF));
        assert_eq!(font.get(tag::LOCA), collection.fonts[0].get(tag::LOCA));
    }
}

// 5. `loca`'s format selection picks LONG for an odd offset list and SHORT
//    for an all-even, small one, and a caller reading either back gets the
//    same offsets regardless of which format was chosen.
#[test]
fn loca_format_selection_is_transparent_to_a_reader() {
    let configs = SfntConfigs::default();

    // Odd offset (10) forces LONG.
    let loca = LocaTable { offsets: vec![0, 4, 10, 16] };
    let mut head = HeadTable::default();
    let long_bytes = loca.dump(&configs, &mut head).unwrap();
    assert_eq!(long_bytes.len(), 4 * 4);

    let maxp = MaxpTable { num_glyphs: 3, true_type_maxima: None };
    let reparsed = LocaTable::parse(&long_bytes, &maxp, &head).unwrap();
    assert_eq!(reparsed.offsets, vec![0, 4, 10, 16]);

    // All-even, small offsets fit SHORT.
    let loca = LocaTable { offsets: vec![0, 4, 8, 16] };
    let mut head = HeadTable::default();
    let short_bytes = loca.dump(&configs, &mut head).unwrap();
    assert_eq!(short_bytes.len(), 4 * 2);

    let reparsed = LocaTable::parse(&short_bytes, &maxp, &head).unwrap();
    assert_eq!(reparsed.offsets, vec![0, 4, 8, 16]);
}

// 6. A composite glyph with a 2x2 transform on one component and
//    `overlap_compound` set survives a `glyf` dump/parse cycle, including
//    through the WOFF2 glyf/loca transform.
#[test]
fn composite_glyph_with_transform_and_overlap_round_trips() {
    let composite = ComponentGlyph {
        x_min: 0,
        y_min: 0,
        x_max: 20,
        y_max: 20,
        components: vec![GlyphComponent::Xy(XyGlyphComponent {
            glyph_index: 1,
            x: 5,
            y: 5,
            round_xy_to_grid: true,
            scaled_component_offset: false,
            unscaled_component_offset: false,
            transform: Some((1.0, 0.0, 0.0, 0.5)),
            use_my_metrics: false,
        })],
        instructions: vec![],
        overlap_compound: true,
    };

    let glyf = GlyfTable {
        glyphs: vec![
            GlyphSlot::Simple(SimpleGlyph {
                x_min: 0,
                y_min: 0,
                x_max: 10,
                y_max: 10,
                end_pts_of_contours: vec![1],
                coordinates: vec![
                    GlyphCoordinate { on_curve_point: true, delta_x: 0, delta_y: 0 },
                    GlyphCoordinate { on_curve_point: true, delta_x: 10, delta_y: 10 },
                ],
                instructions: vec![],
                overlap_simple: false,
            }),
            GlyphSlot::Composite(composite),
        ],
    };

    let configs = SfntConfigs::default();
    let (bytes, loca) = glyf.dump(&configs).unwrap();
    let reparsed = GlyfTable::parse(&bytes, &loca).unwrap();
    assert_eq!(reparsed, glyf);

    // Through the WOFF2 glyf/loca transform and back.
    let transformed = sfnttools::transform::glyf_loca::encode(&glyf).unwrap();
    let (decoded_glyf, decoded_loca) = sfnttools::transform::glyf_loca::decode(&transformed).unwrap();
    assert_eq!(decoded_glyf, glyf);
    assert_eq!(decoded_loca.num_glyphs(), loca.num_glyphs());

    match &decoded_glyf.glyphs[1] {
        GlyphSlot::Composite(c) => {
            assert!(c.overlap_compound);
            match &c.components[0] {
                GlyphComponent::Xy(xy) => assert_eq!(xy.transform, Some((1.0, 0.0, 0.0, 0.5))),
                _ => panic!("expected an XY component"),
            }
        }
        _ => panic!("expected a composite glyph"),
    }
}
