//! Simple (contour-based) glyph outlines.

use crate::error::{FontError, Result};
use crate::flags::bitflags_record;
use crate::stream::Stream;

bitflags_record! {
    /// Per-point flags inside a simple glyph's flag stream.
    pub struct SimpleGlyphFlags: u8 {
        on_curve_point => 0,
        x_short_vector => 1,
        y_short_vector => 2,
        repeat_flag => 3,
        x_is_same_or_positive_x_short_vector => 4,
        y_is_same_or_positive_y_short_vector => 5,
        overlap_simple => 6,
    }
}

/// One outline point, stored as the delta from the previous point (the
/// first point's delta is relative to the origin).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GlyphCoordinate {
    pub on_curve_point: bool,
    pub delta_x: i32,
    pub delta_y: i32,
}

impl GlyphCoordinate {
    /// Sums deltas in order and returns `(x_min, y_min, x_max, y_max)`.
    pub fn calculate_bounds(coordinates: &[GlyphCoordinate]) -> (i32, i32, i32, i32) {
        let mut x = 0;
        let mut y = 0;
        let mut x_min = 0;
        let mut y_min = 0;
        let mut x_max = 0;
        let mut y_max = 0;
        for (i, c) in coordinates.iter().enumerate() {
            x += c.delta_x;
            y += c.delta_y;
            if i == 0 {
                x_min = x;
                x_max = x;
                y_min = y;
                y_max = y;
            } else {
                x_min = x_min.min(x);
                x_max = x_max.max(x);
                y_min = y_min.min(y);
                y_max = y_max.max(y);
            }
        }
        (x_min, y_min, x_max, y_max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SimpleGlyph {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub end_pts_of_contours: Vec<u16>,
    pub coordinates: Vec<GlyphCoordinate>,
    pub instructions: Vec<u8>,
    pub overlap_simple: bool,
}

impl SimpleGlyph {
    pub fn num_contours(&self) -> usize {
        self.end_pts_of_contours.len()
    }

    pub(crate) fn parse_body(
        stream: &mut Stream,
        num_contours: i16,
        x_min: i16,
        y_min: i16,
        x_max: i16,
        y_max: i16,
    ) -> Result<Self> {
        let num_contours = num_contours as usize;
        let mut end_pts_of_contours = Vec::with_capacity(num_contours);
        for _ in 0..num_contours {
            end_pts_of_contours.push(stream.read_uint16()?);
        }
        let num_coordinates = *end_pts_of_contours.last().unwrap_or(&0) as usize + 1;

        let instruction_length = stream.read_uint16()?;
        let instructions = stream.read(instruction_length as usize)?.to_vec();

        let mut flags_list: Vec<SimpleGlyphFlags> = Vec::with_capacity(num_coordinates);
        while flags_list.len() < num_coordinates {
            let flags = SimpleGlyphFlags::parse(stream.read_uint8()?);
            let additional_repeat_times = if flags.repeat_flag { stream.read_uint8()? } else { 0 };
            for _ in 0..=additional_repeat_times {
                flags_list.push(flags);
            }
        }
        if flags_list.len() != num_coordinates {
            return Err(FontError::CountMismatch("glyf: bad number of coordinates"));
        }

        let mut x_coordinates = Vec::with_capacity(num_coordinates);
        for flags in &flags_list {
            let delta_x = if flags.x_short_vector {
                let v = stream.read_uint8()? as i32;
                if flags.x_is_same_or_positive_x_short_vector { v } else { -v }
            } else if flags.x_is_same_or_positive_x_short_vector {
                0
            } else {
                stream.read_int16()? as i32
            };
            x_coordinates.push(delta_x);
        }

        let mut y_coordinates = Vec::with_capacity(num_coordinates);
        for flags in &flags_list {
            let delta_y = if flags.y_short_vector {
                let v = stream.read_uint8()? as i32;
                if flags.y_is_same_or_positive_y_short_vector { v } else { -v }
            } else if flags.y_is_same_or_positive_y_short_vector {
                0
            } else {
                stream.read_int16()? as i32
            };
            y_coordinates.push(delta_y);
        }

        let coordinates: Vec<GlyphCoordinate> = flags_list
            .iter()
            .zip(x_coordinates)
            .zip(y_coordinates)
            .map(|((flags, delta_x), delta_y)| GlyphCoordinate {
                on_curve_point: flags.on_curve_point,
                delta_x,
                delta_y,
            })
            .collect();

        Ok(SimpleGlyph {
            x_min,
            y_min,
            x_max,
            y_max,
            end_pts_of_contours,
            coordinates,
            instructions,
            overlap_simple: flags_list[0].overlap_simple,
        })
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut stream = Stream::from_bytes(data);
        let num_contours = stream.read_int16()?;
        let x_min = stream.read_int16()?;
        let y_min = stream.read_int16()?;
        let x_max = stream.read_int16()?;
        let y_max = stream.read_int16()?;
        Self::parse_body(&mut stream, num_contours, x_min, y_min, x_max, y_max)
    }

    pub(crate) fn dump_body(&self, stream: &mut Stream) -> Result<()> {
        if self.coordinates.len() != *self.end_pts_of_contours.last().unwrap_or(&0) as usize + 1 {
            return Err(FontError::CountMismatch("glyf: bad number of coordinates"));
        }

        let mut flags_stream = Stream::new();
        let mut x_stream = Stream::new();
        let mut y_stream = Stream::new();
        let mut last_flags_value: Option<u8> = None;
        let mut additional_repeat_times: u8 = 0;

        for (i, c) in self.coordinates.iter().enumerate() {
            let mut flags = SimpleGlyphFlags { on_curve_point: c.on_curve_point, ..Default::default() };
            if i == 0 {
                flags.overlap_simple = self.overlap_simple;
            }

            if c.delta_x == 0 {
                flags.x_is_same_or_positive_x_short_vector = true;
            } else if (-0xFF..=0xFF).contains(&c.delta_x) {
                flags.x_short_vector = true;
                if c.delta_x > 0 {
                    flags.x_is_same_or_positive_x_short_vector = true;
                }
                x_stream.write_uint8(c.delta_x.unsigned_abs() as u8);
            } else {
                x_stream.write_int16(c.delta_x as i16);
            }

            if c.delta_y == 0 {
                flags.y_is_same_or_positive_y_short_vector = true;
            } else if (-0xFF..=0xFF).contains(&c.delta_y) {
                flags.y_short_vector = true;
                if c.delta_y > 0 {
                    flags.y_is_same_or_positive_y_short_vector = true;
                }
                y_stream.write_uint8(c.delta_y.unsigned_abs() as u8);
            } else {
                y_stream.write_int16(c.delta_y as i16);
            }

            let flags_value = flags.value();
            if Some(flags_value) == last_flags_value && additional_repeat_times < 0xFF {
                additional_repeat_times += 1;
                if additional_repeat_times == 1 {
                    flags_stream.write_uint8(flags_value);
                } else {
                    flags_stream.seek_relative(-2);
                    flags_stream.write_uint8(flags_value | SimpleGlyphFlags { repeat_flag: true, ..Default::default() }.value());
                    flags_stream.write_uint8(additional_repeat_times);
                }
            } else {
                additional_repeat_times = 0;
                flags_stream.write_uint8(flags_value);
            }
            last_flags_value = Some(flags_value);
        }

        for &idx in &self.end_pts_of_contours {
            stream.write_uint16(idx);
        }
        stream.write_uint16(self.instructions.len() as u16);
        stream.write(&self.instructions);

        stream.write(flags_stream.get_value());
        stream.write(x_stream.get_value());
        stream.write(y_stream.get_value());

        Ok(())
    }

    pub fn dump(&self) -> Result<Vec<u8>> {
        let mut stream = Stream::new();
        stream.write_int16(self.num_contours() as i16);
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

    fn sample() -> SimpleGlyph {
        SimpleGlyph {
            x_min: 0,
            y_min: 0,
            x_max: 100,
            y_max: 100,
            end_pts_of_contours: vec![2],
            coordinates: vec![
                GlyphCoordinate { on_curve_point: true, delta_x: 0, delta_y: 0 },
                GlyphCoordinate { on_curve_point: true, delta_x: 100, delta_y: 0 },
                GlyphCoordinate { on_curve_point: false, delta_x: 0, delta_y: 100 },
            ],
            instructions: vec![1, 2, 3],
            overlap_simple: false,
        }
    }

    #[test]
    fn roundtrip() {
        let g = sample();
        let bytes = g.dump().unwrap();
        let parsed = SimpleGlyph::parse(&bytes).unwrap();
        assert_eq!(g, parsed);
    }

    #[test]
    fn repeated_flags_collapse() {
        let g = SimpleGlyph {
            x_min: 0,
            y_min: 0,
            x_max: 0,
            y_max: 0,
            end_pts_of_contours: vec![3],
            coordinates: vec![
                GlyphCoordinate { on_curve_point: true, delta_x: 0, delta_y: 0 },
                GlyphCoordinate { on_curve_point: true, delta_x: 0, delta_y: 0 },
                GlyphCoordinate { on_curve_point: true, delta_x: 0, delta_y: 0 },
                GlyphCoordinate { on_curve_point: true, delta_x: 0, delta_y: 0 },
            ],
            instructions: vec![],
            overlap_simple: false,
        };
        let bytes = g.dump().unwrap();
        let parsed = SimpleGlyph::parse(&bytes).unwrap();
        assert_eq!(g, parsed);
    }
}
