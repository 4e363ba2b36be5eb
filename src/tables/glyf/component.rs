//! Composite glyph outlines: lists of transformed references to other glyphs.

use crate::error::{FontError, Result};
use crate::flags::bitflags_record;
use crate::stream::Stream;

bitflags_record! {
    pub struct ComponentGlyphFlags: u16 {
        arg_1_and_2_are_words => 0,
        args_are_xy_values => 1,
        round_xy_to_grid => 2,
        we_have_a_scale => 3,
        more_components => 5,
        we_have_an_x_and_y_scale => 6,
        we_have_a_two_by_two => 7,
        we_have_instructions => 8,
        use_my_metrics => 9,
        overlap_compound => 10,
        scaled_component_offset => 11,
        unscaled_component_offset => 12,
    }
}

pub type Transform2x2 = (f64, f64, f64, f64);

#[derive(Debug, Clone, PartialEq)]
pub struct XyGlyphComponent {
    pub glyph_index: u16,
    pub x: i32,
    pub y: i32,
    pub round_xy_to_grid: bool,
    pub scaled_component_offset: bool,
    pub unscaled_component_offset: bool,
    pub transform: Option<Transform2x2>,
    pub use_my_metrics: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointsGlyphComponent {
    pub glyph_index: u16,
    pub parent_point: u16,
    pub child_point: u16,
    pub transform: Option<Transform2x2>,
    pub use_my_metrics: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GlyphComponent {
    Xy(XyGlyphComponent),
    Points(PointsGlyphComponent),
}

impl GlyphComponent {
    pub fn glyph_index(&self) -> u16 {
        match self {
            Self::Xy(c) => c.glyph_index,
            Self::Points(c) => c.glyph_index,
        }
    }

    pub fn use_my_metrics(&self) -> bool {
        match self {
            Self::Xy(c) => c.use_my_metrics,
            Self::Points(c) => c.use_my_metrics,
        }
    }
}

fn read_transform(stream: &mut Stream, flags: ComponentGlyphFlags) -> Result<Option<Transform2x2>> {
    if flags.we_have_a_scale {
        let s = stream.read_f2dot14()?;
        Ok(Some((s, 0.0, 0.0, s)))
    } else if flags.we_have_an_x_and_y_scale {
        let x = stream.read_f2dot14()?;
        let y = stream.read_f2dot14()?;
        Ok(Some((x, 0.0, 0.0, y)))
    } else if flags.we_have_a_two_by_two {
        let x_scale = stream.read_f2dot14()?;
        let scale_01 = stream.read_f2dot14()?;
        let scale_10 = stream.read_f2dot14()?;
        let y_scale = stream.read_f2dot14()?;
        Ok(Some((x_scale, scale_01, scale_10, y_scale)))
    } else {
        Ok(None)
    }
}

fn write_transform(stream: &mut Stream, flags: ComponentGlyphFlags, transform: Transform2x2) {
    let (x_scale, scale_01, scale_10, y_scale) = transform;
    if flags.we_have_a_scale {
        stream.write_f2dot14(x_scale);
    } else if flags.we_have_an_x_and_y_scale {
        stream.write_f2dot14(x_scale);
        stream.write_f2dot14(y_scale);
    } else if flags.we_have_a_two_by_two {
        stream.write_f2dot14(x_scale);
        stream.write_f2dot14(scale_01);
        stream.write_f2dot14(scale_10);
        stream.write_f2dot14(y_scale);
    }
}

fn transform_shape(transform: Transform2x2) -> (bool, bool, bool) {
    let (x_scale, scale_01, scale_10, y_scale) = transform;
    if scale_01 == 0.0 && scale_10 == 0.0 {
        if x_scale == y_scale { (true, false, false) } else { (false, true, false) }
    } else {
        (false, false, true)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComponentGlyph {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub components: Vec<GlyphComponent>,
    pub instructions: Vec<u8>,
    pub overlap_compound: bool,
}

impl ComponentGlyph {
    pub fn num_components(&self) -> usize {
        self.components.len()
    }

    pub(crate) fn parse_body(
        stream: &mut Stream,
        x_min: i16,
        y_min: i16,
        x_max: i16,
        y_max: i16,
    ) -> Result<Self> {
        let (components, overlap_compound, we_have_instructions) = Self::parse_components(stream)?;

        let instructions = if we_have_instructions {
            let len = stream.read_uint16()?;
            stream.read(len as usize)?.to_vec()
        } else {
            Vec::new()
        };

        Ok(ComponentGlyph { x_min, y_min, x_max, y_max, components, instructions, overlap_compound })
    }

    /// Parses just the component list, stopping at (but not consuming) the
    /// instruction bytes that normally follow in plain `glyf` encoding.
    /// Returns the components, the glyph's `overlap_compound` bit, and
    /// whether the caller should expect instruction bytes next. Used
    /// directly by the plain-`glyf` path (via [`Self::parse_body`]); the
    /// WOFF2 transform, whose instruction bytes live in a separate stream,
    /// calls this instead.
    pub(crate) fn parse_components(stream: &mut Stream) -> Result<(Vec<GlyphComponent>, bool, bool)> {
        let mut components = Vec::new();
        let mut overlap_compound = None;
        let mut we_have_instructions = false;

        loop {
            let flags = ComponentGlyphFlags::parse(stream.read_uint16()?);
            let glyph_index = stream.read_uint16()?;

            if overlap_compound.is_none() {
                overlap_compound = Some(flags.overlap_compound);
            }

            let (arg1, arg2): (i32, i32) = if flags.arg_1_and_2_are_words {
                if flags.args_are_xy_values {
                    (stream.read_int16()? as i32, stream.read_int16()? as i32)
                } else {
                    (stream.read_uint16()? as i32, stream.read_uint16()? as i32)
                }
            } else if flags.args_are_xy_values {
                (stream.read_int8()? as i32, stream.read_int8()? as i32)
            } else {
                (stream.read_uint8()? as i32, stream.read_uint8()? as i32)
            };

            let transform = read_transform(stream, flags)?;

            if flags.args_are_xy_values {
                components.push(GlyphComponent::Xy(XyGlyphComponent {
                    glyph_index,
                    x: arg1,
                    y: arg2,
                    round_xy_to_grid: flags.round_xy_to_grid,
                    scaled_component_offset: flags.scaled_component_offset,
                    unscaled_component_offset: flags.unscaled_component_offset,
                    transform,
                    use_my_metrics: flags.use_my_metrics,
                }));
            } else {
                components.push(GlyphComponent::Points(PointsGlyphComponent {
                    glyph_index,
                    parent_point: arg1 as u16,
                    child_point: arg2 as u16,
                    transform,
                    use_my_metrics: flags.use_my_metrics,
                }));
            }

            if !flags.more_components {
                we_have_instructions = flags.we_have_instructions;
                break;
            }
        }

        Ok((components, overlap_compound.unwrap_or(false), we_have_instructions))
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut stream = Stream::from_bytes(data);
        stream.read_int16()?; // -1 sentinel
        let x_min = stream.read_int16()?;
        let y_min = stream.read_int16()?;
        let x_max = stream.read_int16()?;
        let y_max = stream.read_int16()?;
        Self::parse_body(&mut stream, x_min, y_min, x_max, y_max)
    }

    pub(crate) fn dump_body(&self, stream: &mut Stream) -> Result<()> {
        self.dump_components(stream)?;
        if !self.instructions.is_empty() {
            stream.write_uint16(self.instructions.len() as u16);
            stream.write(&self.instructions);
        }
        Ok(())
    }

    /// Writes just the component list (the inverse of [`Self::parse_components`]),
    /// leaving instruction bytes to the caller.
    pub(crate) fn dump_components(&self, stream: &mut Stream) -> Result<()> {
        if self.components.is_empty() {
            return Err(FontError::CountMismatch("glyf: composite glyph has no components"));
        }
        let n = self.num_components();
        for (i, component) in self.components.iter().enumerate() {
            let mut flags = ComponentGlyphFlags { more_components: true, ..Default::default() };
            if i == 0 {
                flags.overlap_compound = self.overlap_compound;
            }
            if i == n - 1 {
                flags.more_components = false;
                flags.we_have_instructions = !self.instructions.is_empty();
            }

            let (glyph_index, arg1, arg2, transform) = match component {
                GlyphComponent::Xy(c) => {
                    flags.args_are_xy_values = true;
                    flags.arg_1_and_2_are_words = !(-128..=127).contains(&c.x) || !(-128..=127).contains(&c.y);
                    flags.round_xy_to_grid = c.round_xy_to_grid;
                    flags.scaled_component_offset = c.scaled_component_offset;
                    flags.unscaled_component_offset = c.unscaled_component_offset;
                    flags.use_my_metrics = c.use_my_metrics;
                    (c.glyph_index, c.x, c.y, c.transform)
                }
                GlyphComponent::Points(c) => {
                    flags.arg_1_and_2_are_words = c.parent_point > 0xFF || c.child_point > 0xFF;
                    flags.use_my_metrics = c.use_my_metrics;
                    (c.glyph_index, c.parent_point as i32, c.child_point as i32, c.transform)
                }
            };

            if let Some(t) = transform {
                let (scale, xy, two_by_two) = transform_shape(t);
                flags.we_have_a_scale = scale;
                flags.we_have_an_x_and_y_scale = xy;
                flags.we_have_a_two_by_two = two_by_two;
            }

            stream.write_uint16(flags.value());
            stream.write_uint16(glyph_index);

            if flags.arg_1_and_2_are_words {
                if flags.args_are_xy_values {
                    stream.write_int16(arg1 as i16);
                    stream.write_int16(arg2 as i16);
                } else {
                    stream.write_uint16(arg1 as u16);
                    stream.write_uint16(arg2 as u16);
                }
            } else if flags.args_are_xy_values {
                stream.write_int8(arg1 as i8);
                stream.write_int8(arg2 as i8);
            } else {
                stream.write_uint8(arg1 as u8);
                stream.write_uint8(arg2 as u8);
            }

            if let Some(t) = transform {
                write_transform(stream, flags, t);
            }
        }

        Ok(())
    }

    pub fn dump(&self) -> Result<Vec<u8>> {
        let mut stream = Stream::new();
        stream.write_int16(-1);
        stream.write_int16(self.x_min);
        stream.write_int16(self.y_min);
        stream.write_int16(self.x_max);
        stream.write_int16(self.y_max);
        self.dump_body(&mut stream)?;
        Ok(stream.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_xy_component_with_two_by_two() {
        let g = ComponentGlyph {
            x_min: -10,
            y_min: -10,
            x_max: 200,
            y_max: 200,
            components: vec![GlyphComponent::Xy(XyGlyphComponent {
                glyph_index: 7,
                x: 50,
                y: -25,
                round_xy_to_grid: true,
                scaled_component_offset: false,
                unscaled_component_offset: false,
                transform: Some((1.0, 0.25, -0.25, 1.0)),
                use_my_metrics: true,
            })],
            instructions: vec![0xAA, 0xBB],
            overlap_compound: true,
        };
        let bytes = g.dump().unwrap();
        let parsed = ComponentGlyph::parse(&bytes).unwrap();
        assert_eq!(g.components, parsed.components);
        assert_eq!(g.overlap_compound, parsed.overlap_compound);
        assert_eq!(g.instructions, parsed.instructions);
    }

    #[test]
    fn roundtrip_points_component() {
        let g = ComponentGlyph {
            x_min: 0,
            y_min: 0,
            x_max: 0,
            y_max: 0,
            components: vec![
                GlyphComponent::Points(PointsGlyphComponent {
                    glyph_index: 2,
                    parent_point: 3,
                    child_point: 0,
                    transform: None,
                    use_my_metrics: false,
                }),
                GlyphComponent::Xy(XyGlyphComponent {
                    glyph_index: 9,
                    x: 1,
                    y: 1,
                    round_xy_to_grid: false,
                    scaled_component_offset: false,
                    unscaled_component_offset: false,
                    transform: None,
                    use_my_metrics: false,
                }),
            ],
            instructions: vec![],
            overlap_compound: false,
        };
        let bytes = g.dump().unwrap();
        let parsed = ComponentGlyph::parse(&bytes).unwrap();
        assert_eq!(g.components, parsed.components);
    }
}
