//! `hhea`/`vhea`: the horizontal/vertical header. Both tags share this
//! exact 36-byte layout; which axis a given instance describes is decided
//! by which tag it was parsed under, not by anything in the bytes.

use crate::error::Result;
use crate::stream::Stream;
use crate::tables::glyf::{GlyfTable, GlyphSlot};
use crate::tables::hmtx::HmtxTable;

pub const UPDATE_DEPENDENCIES: &[&str] = &["hmtx", "glyf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HheaTable {
    pub major_version: u16,
    pub minor_version: u16,
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub advance_width_max: u16,
    pub min_left_side_bearing: i16,
    pub min_right_side_bearing: i16,
    pub x_max_extent: i16,
    pub caret_slope_rise: i16,
    pub caret_slope_run: i16,
    pub caret_offset: i16,
    pub metric_data_format: i16,
    pub num_hori_metrics: u16,
}

impl Default for HheaTable {
    fn default() -> Self {
        HheaTable {
            major_version: 1,
            minor_version: 0,
            ascender: 0,
            descender: 0,
            line_gap: 0,
            advance_width_max: 0,
            min_left_side_bearing: 0,
            min_right_side_bearing: 0,
            x_max_extent: 0,
            caret_slope_rise: 1,
            caret_slope_run: 0,
            caret_offset: 0,
            metric_data_format: 0,
            num_hori_metrics: 0,
        }
    }
}

impl HheaTable {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut stream = Stream::from_bytes(data);
        let major_version = stream.read_uint16()?;
        let minor_version = stream.read_uint16()?;
        let ascender = stream.read_fword()?;
        let descender = stream.read_fword()?;
        let line_gap = stream.read_fword()?;
        let advance_width_max = stream.read_ufword()?;
        let min_left_side_bearing = stream.read_fword()?;
        let min_right_side_bearing = stream.read_fword()?;
        let x_max_extent = stream.read_fword()?;
        let caret_slope_rise = stream.read_int16()?;
        let caret_slope_run = stream.read_int16()?;
        let caret_offset = stream.read_int16()?;
        // four reserved int16 zeros
        stream.read_int16()?;
        stream.read_int16()?;
        stream.read_int16()?;
        stream.read_int16()?;
        let metric_data_format = stream.read_int16()?;
        let num_hori_metrics = stream.read_uint16()?;

        Ok(HheaTable {
            major_version,
            minor_version,
            ascender,
            descender,
            line_gap,
            advance_width_max,
            min_left_side_bearing,
            min_right_side_bearing,
            x_max_extent,
            caret_slope_rise,
            caret_slope_run,
            caret_offset,
            metric_data_format,
            num_hori_metrics,
        })
    }

    /// Recomputes `advance_width_max` from the paired `hmtx`/`vmtx` table.
    pub fn update(&mut self, metrics: &HmtxTable) {
        self.advance_width_max = metrics
            .long_metrics
            .iter()
            .map(|m| m.advance_width)
            .max()
            .unwrap_or(0);
    }

    /// Recomputes every metric this table derives from the outline data:
    /// `advance_width_max` plus the three bearing/extent fields, which need
    /// `glyf`'s bounding boxes alongside the paired `hmtx`/`vmtx` table.
    /// Glyphs with no outline (`GlyphSlot::Empty`) are excluded, matching
    /// how these fields are defined over "glyphs with contours".
    pub fn update_with_glyf(&mut self, metrics: &HmtxTable, glyf: &GlyfTable) {
        self.update(metrics);

        let mut min_lsb: Option<i32> = None;
        let mut min_rsb: Option<i32> = None;
        let mut max_extent: Option<i32> = None;

        for (index, slot) in glyf.glyphs.iter().enumerate() {
            let (x_min, x_max) = match slot {
                GlyphSlot::Empty => continue,
                GlyphSlot::Simple(g) => (g.x_min as i32, g.x_max as i32),
                GlyphSlot::Composite(g) => (g.x_min as i32, g.x_max as i32),
            };
            let (lsb, advance_width) = metrics.metric_for_glyph(index);
            let (lsb, advance_width) = (lsb as i32, advance_width as i32);
            let width = x_max - x_min;
            let rsb = advance_width - lsb - width;
            let extent = lsb + width;

            min_lsb = Some(min_lsb.map_or(lsb, |m| m.min(lsb)));
            min_rsb = Some(min_rsb.map_or(rsb, |m| m.min(rsb)));
            max_extent = Some(max_extent.map_or(extent, |m| m.max(extent)));
        }

        if let Some(v) = min_lsb {
            self.min_left_side_bearing = v as i16;
        }
        if let Some(v) = min_rsb {
            self.min_right_side_bearing = v as i16;
        }
        if let Some(v) = max_extent {
            self.x_max_extent = v as i16;
        }
    }

    pub fn dump(&self) -> Vec<u8> {
        let mut stream = Stream::new();
        stream.write_uint16(self.major_version);
        stream.write_uint16(self.minor_version);
        stream.write_fword(self.ascender);
        stream.write_fword(self.descender);
        stream.write_fword(self.line_gap);
        stream.write_ufword(self.advance_width_max);
        stream.write_fword(self.min_left_side_bearing);
        stream.write_fword(self.min_right_side_bearing);
        stream.write_fword(self.x_max_extent);
        stream.write_int16(self.caret_slope_rise);
        stream.write_int16(self.caret_slope_run);
        stream.write_int16(self.caret_offset);
        stream.write_int16(0);
        stream.write_int16(0);
        stream.write_int16(0);
        stream.write_int16(0);
        stream.write_int16(self.metric_data_format);
        stream.write_uint16(self.num_hori_metrics);
        stream.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::hmtx::LongHoriMetric;

    #[test]
    fn roundtrip() {
        let h = HheaTable { num_hori_metrics: 4, ..Default::default() };
        let bytes = h.dump();
        assert_eq!(bytes.len(), 36);
        assert_eq!(HheaTable::parse(&bytes).unwrap(), h);
    }

    #[test]
    fn update_pulls_max_from_hmtx() {
        let mut h = HheaTable::default();
        let metrics = HmtxTable {
            long_metrics: vec![
                LongHoriMetric { advance_width: 500, left_side_bearing: 10 },
                LongHoriMetric { advance_width: 700, left_side_bearing: -5 },
            ],
            trailing_left_side_bearings: vec![],
        };
        h.update(&metrics);
        assert_eq!(h.advance_width_max, 700);
    }

    #[test]
    fn update_with_glyf_derives_bearings_and_extent() {
        use crate::tables::glyf::simple::SimpleGlyph;

        let mut h = HheaTable::default();
        let metrics = HmtxTable {
            long_metrics: vec![
                LongHoriMetric { advance_width: 0, left_side_bearing: 0 },
                LongHoriMetric { advance_width: 500, left_side_bearing: 10 },
                LongHoriMetric { advance_width: 300, left_side_bearing: -2 },
            ],
            trailing_left_side_bearings: vec![],
        };
        let glyf = GlyfTable {
            glyphs: vec![
                GlyphSlot::Empty,
                GlyphSlot::Simple(SimpleGlyph {
                    x_min: 0,
                    y_min: 0,
                    x_max: 100,
                    y_max: 100,
                    end_pts_of_contours: vec![],
                    coordinates: vec![],
                    instructions: vec![],
                    overlap_simple: false,
                }),
                GlyphSlot::Simple(SimpleGlyph {
                    x_min: 5,
                    y_min: 0,
                    x_max: 55,
                    y_max: 50,
                    end_pts_of_contours: vec![],
                    coordinates: vec![],
                    instructions: vec![],
                    overlap_simple: false,
                }),
            ],
        };
        h.update_with_glyf(&metrics, &glyf);
        // glyph 1: lsb=10, width=100, rsb=500-10-100=390, extent=110
        // glyph 2: lsb=-2, width=50, rsb=300-(-2)-50=252, extent=48
        assert_eq!(h.min_left_side_bearing, -2);
        assert_eq!(h.min_right_side_bearing, 252);
        assert_eq!(h.x_max_extent, 110);
    }
}
