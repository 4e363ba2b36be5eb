//! `glyf`: the glyph outline table. Each glyph slot is empty, a simple
//! contour-based outline, or a composite referencing other glyphs.

pub mod component;
pub mod simple;

pub use component::ComponentGlyph;
pub use simple::SimpleGlyph;

use crate::config::SfntConfigs;
use crate::error::Result;
use crate::stream::Stream;
use crate::tables::loca::LocaTable;
use crate::tables::maxp::MaxpTable;

pub const PARSE_DEPENDENCIES: &[&str] = &["loca"];

#[derive(Debug, Clone, PartialEq)]
pub enum GlyphSlot {
    Empty,
    Simple(SimpleGlyph),
    Composite(ComponentGlyph),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GlyfTable {
    pub glyphs: Vec<GlyphSlot>,
}

impl GlyfTable {
    pub fn num_glyphs(&self) -> usize {
        self.glyphs.len()
    }

    pub fn parse(data: &[u8], loca: &LocaTable) -> Result<Self> {
        let mut glyphs = Vec::with_capacity(loca.num_glyphs());
        for w in loca.offsets.windows(2) {
            let (start, end) = (w[0] as usize, w[1] as usize);
            if start == end {
                glyphs.push(GlyphSlot::Empty);
                continue;
            }
            let slice = data
                .get(start..end)
                .ok_or(crate::error::FontError::EndOfStream { wanted: end - start, available: data.len() })?;
            let mut stream = Stream::from_bytes(slice);
            let num_contours = stream.read_int16()?;
            let x_min = stream.read_int16()?;
            let y_min = stream.read_int16()?;
            let x_max = stream.read_int16()?;
            let y_max = stream.read_int16()?;
            if num_contours == -1 {
                glyphs.push(GlyphSlot::Composite(ComponentGlyph::parse_body(
                    &mut stream,
                    x_min,
                    y_min,
                    x_max,
                    y_max,
                )?));
            } else {
                glyphs.push(GlyphSlot::Simple(SimpleGlyph::parse_body(
                    &mut stream,
                    num_contours,
                    x_min,
                    y_min,
                    x_max,
                    y_max,
                )?));
            }
        }
        Ok(GlyfTable { glyphs })
    }

    /// Serializes every glyph back to back, padding each record per the
    /// configured padding mode, and returns the bytes alongside the
    /// synthesized `loca` offsets (`loca`'s own format selection then
    /// mutates `head.index_to_loc_format`, per the `loca`/`head` dependency
    /// cycle).
    pub fn dump(&self, configs: &SfntConfigs) -> Result<(Vec<u8>, LocaTable)> {
        let mut stream = Stream::new();
        let mut offsets = Vec::with_capacity(self.glyphs.len() + 1);

        for slot in &self.glyphs {
            offsets.push(stream.tell() as u32);
            let start = stream.tell();
            match slot {
                GlyphSlot::Empty => {}
                GlyphSlot::Simple(g) => {
                    stream.write(&g.dump()?);
                }
                GlyphSlot::Composite(g) => {
                    stream.write(&g.dump()?);
                }
            }
            let unpadded_len = stream.tell() - start;
            let pad = configs.glyf_data_offsets_padding_mode.pad_len(unpadded_len);
            if pad > 0 {
                stream.write(&vec![0u8; pad]);
            }
        }
        offsets.push(stream.tell() as u32);

        Ok((stream.into_bytes(), LocaTable { offsets }))
    }

    /// Sanity-checks that this table agrees with `maxp.numGlyphs`.
    pub fn check_glyph_count(&self, maxp: &MaxpTable) -> Result<()> {
        if self.glyphs.len() != maxp.num_glyphs as usize {
            return Err(crate::error::FontError::CountMismatch(
                "glyf glyph count does not match maxp.numGlyphs",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::glyf::component::{GlyphComponent, XyGlyphComponent};
    use crate::tables::glyf::simple::GlyphCoordinate;

    #[test]
    fn roundtrip_mixed_glyphs() {
        let glyf = GlyfTable {
            glyphs: vec![
                GlyphSlot::Empty,
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
                GlyphSlot::Composite(ComponentGlyph {
                    x_min: 0,
                    y_min: 0,
                    x_max: 10,
                    y_max: 10,
                    components: vec![GlyphComponent::Xy(XyGlyphComponent {
                        glyph_index: 1,
                        x: 0,
                        y: 0,
                        round_xy_to_grid: false,
                        scaled_component_offset: false,
                        unscaled_component_offset: false,
                        transform: None,
                        use_my_metrics: false,
                    })],
                    instructions: vec![],
                    overlap_compound: false,
                }),
            ],
        };

        let configs = SfntConfigs::default();
        let (bytes, loca) = glyf.dump(&configs).unwrap();
        assert_eq!(loca.offsets.len(), 4);
        let parsed = GlyfTable::parse(&bytes, &loca).unwrap();
        assert_eq!(parsed, glyf);
    }
}
