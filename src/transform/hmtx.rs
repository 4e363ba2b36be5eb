//! WOFF2's optional `hmtx`/`vmtx` transform: a 1-byte flag record that lets
//! an encoder drop a side-bearing array entirely when every value in it
//! equals the paired glyph's `glyf.xMin` (the normal relationship for
//! unhinted left-to-right glyphs), since a decoder can always recompute it
//! from `glyf` instead of storing it twice.
//!
//! Reconstructing an omitted array from `glyf` bounds has no precedent to
//! follow here beyond the flag semantics themselves, so the lookup below
//! (`glyph_x_mins`, shared with the `glyf`/`loca` transform) is this
//! module's own.

use crate::config::SfntConfigs;
use crate::error::{FontError, Result};
use crate::flags::bitflags_record;
use crate::stream::Stream;
use crate::tables::glyf::GlyfTable;
use crate::tables::hmtx::{HmtxTable, LongHoriMetric};
use crate::transform::glyf_loca::glyph_x_mins;

bitflags_record! {
    pub struct HmtxOptionFlags: u8 {
        proportional_lsb_omitted => 0,
        monospaced_lsb_omitted => 1,
    }
}

/// Reconstructs `hmtx`/`vmtx` from its transformed bytes. `num_hori_metrics`
/// and `num_glyphs` come from the paired `hhea`/`vhea` and `maxp`, same as
/// plain `hmtx` parsing; `glyf` supplies the `xMin` values needed when
/// either bearing array was omitted.
pub fn decode(data: &[u8], num_hori_metrics: u16, num_glyphs: u16, glyf: &GlyfTable) -> Result<HmtxTable> {
    let mut stream = Stream::from_bytes(data);
    let flags = HmtxOptionFlags::parse(stream.read_uint8()?);

    let x_mins = glyph_x_mins(glyf);
    if x_mins.len() != num_glyphs as usize {
        return Err(FontError::CountMismatch(
            "transformed hmtx glyph count does not match glyf.numGlyphs",
        ));
    }

    let mut long_metrics = Vec::with_capacity(num_hori_metrics as usize);
    for (glyph_index, x_min) in x_mins.iter().enumerate().take(num_hori_metrics as usize) {
        let advance_width = stream.read_uint16()?;
        let left_side_bearing =
            if flags.proportional_lsb_omitted { *x_min } else { stream.read_fword()? };
        let _ = glyph_index;
        long_metrics.push(LongHoriMetric { advance_width, left_side_bearing });
    }

    let mut trailing_left_side_bearings = Vec::with_capacity(x_mins.len() - long_metrics.len());
    for &x_min in &x_mins[num_hori_metrics as usize..] {
        let lsb = if flags.monospaced_lsb_omitted { x_min } else { stream.read_fword()? };
        trailing_left_side_bearings.push(lsb);
    }

    Ok(HmtxTable { long_metrics, trailing_left_side_bearings })
}

/// Encodes `hmtx`/`vmtx` for the WOFF2 transform. Always writes both
/// bearing arrays in full (`HmtxOptionFlags::default()`, every bit clear):
/// correct regardless of whether the arrays happen to be reconstructible
/// from `glyf`, and simplest for an encoder to get right. Omission is an
/// optional size optimization a future encoder could add; nothing about
/// decoding requires it.
pub fn encode(table: &HmtxTable, _configs: &SfntConfigs) -> Vec<u8> {
    let mut stream = Stream::new();
    stream.write_uint8(HmtxOptionFlags::default().value());
    for m in &table.long_metrics {
        stream.write_uint16(m.advance_width);
        stream.write_fword(m.left_side_bearing);
    }
    for &lsb in &table.trailing_left_side_bearings {
        stream.write_fword(lsb);
    }
    stream.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::glyf::simple::SimpleGlyph;
    use crate::tables::glyf::GlyphSlot;

    fn sample_glyf() -> GlyfTable {
        GlyfTable {
            glyphs: vec![
                GlyphSlot::Simple(SimpleGlyph {
                    x_min: 3,
                    y_min: 0,
                    x_max: 50,
                    y_max: 60,
                    end_pts_of_contours: vec![],
                    coordinates: vec![],
                    instructions: vec![],
                    overlap_simple: false,
                }),
                GlyphSlot::Simple(SimpleGlyph {
                    x_min: -2,
                    y_min: 0,
                    x_max: 20,
                    y_max: 30,
                    end_pts_of_contours: vec![],
                    coordinates: vec![],
                    instructions: vec![],
                    overlap_simple: false,
                }),
            ],
        }
    }

    #[test]
    fn roundtrip_without_omission() {
        let table = HmtxTable {
            long_metrics: vec![
                LongHoriMetric { advance_width: 500, left_side_bearing: 3 },
                LongHoriMetric { advance_width: 400, left_side_bearing: -2 },
            ],
            trailing_left_side_bearings: vec![],
        };
        let glyf = sample_glyf();
        let bytes = encode(&table, &SfntConfigs::default());
        let decoded = decode(&bytes, 2, 2, &glyf).unwrap();
        assert_eq!(decoded, table);
    }

    #[test]
    fn omitted_proportional_bearings_reconstruct_from_glyf() {
        let glyf = sample_glyf();
        let mut stream = Stream::new();
        stream.write_uint8(HmtxOptionFlags { proportional_lsb_omitted: true, ..Default::default() }.value());
        stream.write_uint16(500);
        stream.write_uint16(400);
        let bytes = stream.into_bytes();

        let decoded = decode(&bytes, 2, 2, &glyf).unwrap();
        assert_eq!(decoded.long_metrics[0].left_side_bearing, 3);
        assert_eq!(decoded.long_metrics[1].left_side_bearing, -2);
    }
}
