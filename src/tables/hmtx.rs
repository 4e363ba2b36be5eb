//! `hmtx`/`vmtx`: the horizontal/vertical metrics table. Glyphs below
//! `numHoriMetrics` (from the paired `hhea`/`vhea`) carry a full
//! `(advanceWidth, sideBearing)` pair; the remainder share the last
//! advance width and carry only their own side bearing.

use crate::error::{FontError, Result};
use crate::stream::Stream;

pub const PARSE_DEPENDENCIES: &[&str] = &["hhea", "maxp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LongHoriMetric {
    pub advance_width: u16,
    pub left_side_bearing: i16,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HmtxTable {
    pub long_metrics: Vec<LongHoriMetric>,
    pub trailing_left_side_bearings: Vec<i16>,
}

impl HmtxTable {
    pub fn num_glyphs(&self) -> usize {
        self.long_metrics.len() + self.trailing_left_side_bearings.len()
    }

    /// `(left_side_bearing, advance_width)` for a given glyph index. Glyphs
    /// past `long_metrics` share the last advance width and carry only their
    /// own side bearing, per the table's trailing-entries convention.
    pub fn metric_for_glyph(&self, glyph_index: usize) -> (i16, u16) {
        if let Some(m) = self.long_metrics.get(glyph_index) {
            (m.left_side_bearing, m.advance_width)
        } else {
            let advance_width = self.long_metrics.last().map(|m| m.advance_width).unwrap_or(0);
            let lsb = self.trailing_left_side_bearings[glyph_index - self.long_metrics.len()];
            (lsb, advance_width)
        }
    }

    pub fn parse(data: &[u8], num_hori_metrics: u16, num_glyphs: u16) -> Result<Self> {
        if num_hori_metrics == 0 || num_hori_metrics > num_glyphs {
            return Err(FontError::CountMismatch(
                "hhea.numHoriMetrics must be in [1, maxp.numGlyphs]",
            ));
        }
        let mut stream = Stream::from_bytes(data);
        let mut long_metrics = Vec::with_capacity(num_hori_metrics as usize);
        for _ in 0..num_hori_metrics {
            long_metrics.push(LongHoriMetric {
                advance_width: stream.read_uint16()?,
                left_side_bearing: stream.read_fword()?,
            });
        }
        let trailing_count = (num_glyphs - num_hori_metrics) as usize;
        let mut trailing_left_side_bearings = Vec::with_capacity(trailing_count);
        for _ in 0..trailing_count {
            trailing_left_side_bearings.push(stream.read_fword()?);
        }
        Ok(HmtxTable { long_metrics, trailing_left_side_bearings })
    }

    pub fn dump(&self) -> Vec<u8> {
        let mut stream = Stream::new();
        for m in &self.long_metrics {
            stream.write_uint16(m.advance_width);
            stream.write_fword(m.left_side_bearing);
        }
        for &lsb in &self.trailing_left_side_bearings {
            stream.write_fword(lsb);
        }
        stream.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_with_trailing_bearings() {
        let t = HmtxTable {
            long_metrics: vec![
                LongHoriMetric { advance_width: 500, left_side_bearing: 10 },
                LongHoriMetric { advance_width: 600, left_side_bearing: -2 },
            ],
            trailing_left_side_bearings: vec![3, -4, 0],
        };
        let bytes = t.dump();
        let parsed = HmtxTable::parse(&bytes, 2, 5).unwrap();
        assert_eq!(parsed, t);
    }

    #[test]
    fn zero_hori_metrics_is_fatal() {
        assert!(HmtxTable::parse(&[], 0, 5).is_err());
    }

    #[test]
    fn hori_metrics_exceeding_glyph_count_is_fatal() {
        assert!(HmtxTable::parse(&[], 6, 5).is_err());
    }
}
