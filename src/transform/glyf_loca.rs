//! WOFF2's transformed encoding of `glyf`/`loca`: seven parallel streams
//! (contour counts, per-contour point counts, per-point flags, per-glyph
//! variable-length metadata, composite records, bounding boxes, and
//! instructions) replacing the interleaved per-glyph records of plain
//! `glyf`, plus an optional `overlapSimple` bitmap.
//!
//! Point deltas inside the flag/glyph streams are packed with a 7-bit
//! "triplet" selector that picks one of six payload shapes depending on
//! magnitude; see [`decode_triplet`]/[`encode_triplet`].

use crate::config::SfntConfigs;
use crate::error::{FontError, Result};
use crate::stream::Stream;
use crate::tables::glyf::component::{ComponentGlyph, GlyphComponent};
use crate::tables::glyf::simple::{GlyphCoordinate, SimpleGlyph};
use crate::tables::glyf::{GlyfTable, GlyphSlot};
use crate::tables::loca::LocaTable;

const OPTION_HAS_OVERLAP_BITMAP: u16 = 0x0001;

fn with_sign(positive: bool, magnitude: i32) -> i32 {
    if positive { magnitude } else { -magnitude }
}

/// Reads one point delta, choosing the payload width from `flag` (the low 7
/// bits of a point's flag byte). See the module doc for the six ranges.
fn decode_triplet(stream: &mut Stream, flag: u8) -> Result<(i32, i32)> {
    let f = flag as i32;
    if flag < 10 {
        let b0 = stream.read_uint8()? as i32;
        let dy = with_sign(flag & 1 != 0, b0 + (f / 2) * 256);
        Ok((0, dy))
    } else if flag < 20 {
        let b0 = stream.read_uint8()? as i32;
        let d0 = f - 10;
        let dx = with_sign(flag & 1 != 0, b0 + (d0 / 2) * 256);
        Ok((dx, 0))
    } else if flag < 84 {
        let byte = stream.read_uint8()?;
        let d = f - 20;
        let dx_bucket = d >> 4;
        let dy_bucket = (d >> 2) & 0x3;
        let sign_x = d & 1 != 0;
        let sign_y = (d >> 1) & 1 != 0;
        let hi = (byte >> 4) as i32;
        let lo = (byte & 0xF) as i32;
        let dx = with_sign(sign_x, hi + dx_bucket * 16 + 1);
        let dy = with_sign(sign_y, lo + dy_bucket * 16 + 1);
        Ok((dx, dy))
    } else if flag < 120 {
        let b0 = stream.read_uint8()? as i32;
        let b1 = stream.read_uint8()? as i32;
        let d = f - 84;
        let dx_bucket = d / 12;
        let dy_bucket = (d % 12) / 4;
        let sign_x = d & 1 != 0;
        let sign_y = (d >> 1) & 1 != 0;
        let dx = with_sign(sign_x, b0 + dx_bucket * 256 + 1);
        let dy = with_sign(sign_y, b1 + dy_bucket * 256 + 1);
        Ok((dx, dy))
    } else if flag < 124 {
        let b0 = stream.read_uint8()? as i32;
        let b1 = stream.read_uint8()? as i32;
        let b2 = stream.read_uint8()? as i32;
        let d = f - 120;
        let sign_x = d & 1 != 0;
        let sign_y = (d >> 1) & 1 != 0;
        let combined = (b0 << 16) | (b1 << 8) | b2;
        let dx = with_sign(sign_x, combined >> 12);
        let dy = with_sign(sign_y, combined & 0xFFF);
        Ok((dx, dy))
    } else {
        let dx_mag = stream.read_uint16()? as i32;
        let dy_mag = stream.read_uint16()? as i32;
        let d = f - 124;
        let sign_x = d & 1 != 0;
        let sign_y = (d >> 1) & 1 != 0;
        Ok((with_sign(sign_x, dx_mag), with_sign(sign_y, dy_mag)))
    }
}

/// Picks the narrowest of the six triplet shapes for `(dx, dy)` and writes
/// the flag's low 7 bits plus payload. Returns the flag value.
fn encode_triplet(stream: &mut Stream, dx: i32, dy: i32) -> u8 {
    // Ranges 0..9 / 10..19: one axis is exactly zero, magnitude <= 1279.
    if dx == 0 && dy.unsigned_abs() <= 1279 {
        let m = dy.unsigned_abs() as i32;
        let bucket = m / 256;
        let f = (bucket * 2 + if dy >= 0 { 1 } else { 0 }) as u8;
        stream.write_uint8((m % 256) as u8);
        return f;
    }
    if dy == 0 && dx.unsigned_abs() <= 1279 {
        let m = dx.unsigned_abs() as i32;
        let bucket = m / 256;
        let f = 10 + (bucket * 2 + if dx >= 0 { 1 } else { 0 }) as u8;
        stream.write_uint8((m % 256) as u8);
        return f;
    }
    // Range 20..83: both deltas non-zero and in 1..=64.
    if (1..=64).contains(&dx.abs()) && (1..=64).contains(&dy.abs()) {
        let dx_m = dx.unsigned_abs() as i32 - 1;
        let dy_m = dy.unsigned_abs() as i32 - 1;
        let dx_bucket = dx_m / 16;
        let hi = dx_m % 16;
        let dy_bucket = dy_m / 16;
        let lo = dy_m % 16;
        let sign_x = if dx > 0 { 1 } else { 0 };
        let sign_y = if dy > 0 { 1 } else { 0 };
        let d = (dx_bucket << 4) | (dy_bucket << 2) | (sign_y << 1) | sign_x;
        stream.write_uint8(((hi as u8) << 4) | lo as u8);
        return 20 + d as u8;
    }
    // Range 84..119: both non-zero, magnitude <= 768.
    if dx != 0 && dy != 0 && dx.unsigned_abs() <= 768 && dy.unsigned_abs() <= 768 {
        let dx_m = dx.unsigned_abs() as i32 - 1;
        let dy_m = dy.unsigned_abs() as i32 - 1;
        let dx_bucket = dx_m / 256;
        let p1 = dx_m % 256;
        let dy_bucket = dy_m / 256;
        let p2 = dy_m % 256;
        let sign_x = if dx > 0 { 1 } else { 0 };
        let sign_y = if dy > 0 { 1 } else { 0 };
        let d = dx_bucket * 12 + dy_bucket * 4 + sign_y * 2 + sign_x;
        stream.write_uint8(p1 as u8);
        stream.write_uint8(p2 as u8);
        return 84 + d as u8;
    }
    // Range 120..123: both deltas fit 12 bits.
    if dx.unsigned_abs() <= 0xFFF && dy.unsigned_abs() <= 0xFFF {
        let sign_x = if dx >= 0 { 1 } else { 0 };
        let sign_y = if dy >= 0 { 1 } else { 0 };
        let d = sign_y * 2 + sign_x;
        let combined = ((dx.unsigned_abs() as u32) << 12) | dy.unsigned_abs() as u32;
        stream.write_uint8(((combined >> 16) & 0xFF) as u8);
        stream.write_uint8(((combined >> 8) & 0xFF) as u8);
        stream.write_uint8((combined & 0xFF) as u8);
        return 120 + d as u8;
    }
    // Range 124..127: general fallback, two full-width magnitudes.
    let sign_x = if dx >= 0 { 1 } else { 0 };
    let sign_y = if dy >= 0 { 1 } else { 0 };
    let d = sign_y * 2 + sign_x;
    stream.write_uint16(dx.unsigned_abs() as u16);
    stream.write_uint16(dy.unsigned_abs() as u16);
    124 + d as u8
}

fn read_substream(header: &mut Stream) -> Result<Vec<u8>> {
    let len = header.read_uint32()? as usize;
    Ok(header.read(len)?.to_vec())
}

fn write_substream(out: &mut Stream, data: &[u8]) {
    out.write_uint32(data.len() as u32);
    out.write(data);
}

/// Decodes a WOFF2-transformed `glyf` table. `loca`'s offsets are
/// synthesized from the byte lengths a plain-`glyf` dump of the result
/// would produce, using the crate's own (2-byte-aligned) padding policy --
/// the transform format carries no byte-exact original layout to recover.
pub fn decode(data: &[u8]) -> Result<(GlyfTable, LocaTable)> {
    let mut header = Stream::from_bytes(data);
    let _reserved = header.read_uint16()?;
    let option_flags = header.read_uint16()?;
    let has_overlap_bitmap = option_flags & OPTION_HAS_OVERLAP_BITMAP != 0;
    let num_glyphs = header.read_uint16()? as usize;
    let _index_format = header.read_uint16()?;

    let n_contour_bytes = read_substream(&mut header)?;
    let n_points_bytes = read_substream(&mut header)?;
    let flag_bytes = read_substream(&mut header)?;
    let glyph_bytes = read_substream(&mut header)?;
    let composite_bytes = read_substream(&mut header)?;
    let bbox_bytes = read_substream(&mut header)?;
    let instruction_bytes = read_substream(&mut header)?;

    let bbox_bitmap_len = num_glyphs.div_ceil(32) * 4;
    if bbox_bytes.len() < bbox_bitmap_len {
        return Err(FontError::MalformedTransform("glyf transform: bbox stream shorter than its own bitmap"));
    }
    let (bbox_bitmap, bbox_data) = bbox_bytes.split_at(bbox_bitmap_len);

    let overlap_bitmap = if has_overlap_bitmap {
        Some(header.read(num_glyphs.div_ceil(8))?.to_vec())
    } else {
        None
    };

    let mut n_contour = Stream::from_bytes(&n_contour_bytes);
    let mut n_points = Stream::from_bytes(&n_points_bytes);
    let mut flag_stream = Stream::from_bytes(&flag_bytes);
    let mut glyph_stream = Stream::from_bytes(&glyph_bytes);
    let mut composite_stream = Stream::from_bytes(&composite_bytes);
    let mut bbox_stream = Stream::from_bytes(bbox_data);
    let mut instruction_stream = Stream::from_bytes(&instruction_bytes);

    let mut glyphs = Vec::with_capacity(num_glyphs);

    for i in 0..num_glyphs {
        let has_bbox = bbox_bitmap[i / 8] & (0x80 >> (i % 8)) != 0;
        let num_contours = n_contour.read_int16()?;

        let overlap_simple = overlap_bitmap
            .as_ref()
            .map(|bitmap| bitmap[i / 8] & (0x80 >> (i % 8)) != 0)
            .unwrap_or(false);

        let slot = if num_contours == 0 {
            GlyphSlot::Empty
        } else if num_contours == -1 {
            if !has_bbox {
                return Err(FontError::MalformedTransform("glyf transform: composite glyph missing bbox bit"));
            }
            let x_min = bbox_stream.read_int16()?;
            let y_min = bbox_stream.read_int16()?;
            let x_max = bbox_stream.read_int16()?;
            let y_max = bbox_stream.read_int16()?;
            let (components, overlap_compound, we_have_instructions) =
                ComponentGlyph::parse_components(&mut composite_stream)?;
            let instructions = if we_have_instructions {
                let len = glyph_stream.read_255_uint16()? as usize;
                instruction_stream.read(len)?.to_vec()
            } else {
                Vec::new()
            };
            GlyphSlot::Composite(ComponentGlyph {
                x_min,
                y_min,
                x_max,
                y_max,
                components,
                instructions,
                overlap_compound,
            })
        } else {
            let n = num_contours as usize;
            let mut end_pts_of_contours = Vec::with_capacity(n);
            let mut running: u32 = 0;
            for _ in 0..n {
                let point_count = n_points.read_255_uint16()? as u32;
                running += point_count;
                end_pts_of_contours.push((running.wrapping_sub(1)) as u16);
            }
            let num_points = running as usize;

            let mut on_curve = Vec::with_capacity(num_points);
            let mut selectors = Vec::with_capacity(num_points);
            for _ in 0..num_points {
                let byte = flag_stream.read_uint8()?;
                on_curve.push(byte & 0x80 == 0);
                selectors.push(byte & 0x7F);
            }

            let mut coordinates = Vec::with_capacity(num_points);
            for (point_on_curve, selector) in on_curve.into_iter().zip(selectors) {
                let (delta_x, delta_y) = decode_triplet(&mut glyph_stream, selector)?;
                coordinates.push(GlyphCoordinate { on_curve_point: point_on_curve, delta_x, delta_y });
            }

            let (x_min, y_min, x_max, y_max) = if has_bbox {
                (
                    bbox_stream.read_int16()?,
                    bbox_stream.read_int16()?,
                    bbox_stream.read_int16()?,
                    bbox_stream.read_int16()?,
                )
            } else {
                let (x_min, y_min, x_max, y_max) = GlyphCoordinate::calculate_bounds(&coordinates);
                (x_min as i16, y_min as i16, x_max as i16, y_max as i16)
            };

            let instr_len = glyph_stream.read_255_uint16()? as usize;
            let instructions = instruction_stream.read(instr_len)?.to_vec();

            GlyphSlot::Simple(SimpleGlyph {
                x_min,
                y_min,
                x_max,
                y_max,
                end_pts_of_contours,
                coordinates,
                instructions,
                overlap_simple,
            })
        };

        glyphs.push(slot);
    }

    let glyf = GlyfTable { glyphs };
    let (_, loca) = glyf.dump(&SfntConfigs::default())?;
    Ok((glyf, loca))
}

/// Encodes a `GlyfTable` back into the WOFF2 transformed byte form. The
/// encoder never emits an explicit bounding box for simple glyphs (the
/// bbox bitmap bit stays clear, and a decoder recomputes it from the
/// outline), and only composites -- which have no outline of their own to
/// recompute a bbox from -- ever set the bit.
pub fn encode(glyf: &GlyfTable) -> Result<Vec<u8>> {
    let num_glyphs = glyf.num_glyphs();

    let mut n_contour = Stream::new();
    let mut n_points = Stream::new();
    let mut flag_stream = Stream::new();
    let mut glyph_stream = Stream::new();
    let mut composite_stream = Stream::new();
    let mut bbox_data = Stream::new();
    let mut instruction_stream = Stream::new();

    let mut bbox_bitmap = vec![0u8; num_glyphs.div_ceil(32) * 4];
    let mut overlap_bitmap = vec![0u8; num_glyphs.div_ceil(8)];
    let mut any_overlap = false;

    for (i, slot) in glyf.glyphs.iter().enumerate() {
        match slot {
            GlyphSlot::Empty => {
                n_contour.write_int16(0);
            }
            GlyphSlot::Simple(g) => {
                n_contour.write_int16(g.num_contours() as i16);

                let mut prev_end: i32 = -1;
                for &end in &g.end_pts_of_contours {
                    let count = end as i32 - prev_end;
                    n_points.write_255_uint16(count as u16);
                    prev_end = end as i32;
                }

                if g.overlap_simple {
                    any_overlap = true;
                    overlap_bitmap[i / 8] |= 0x80 >> (i % 8);
                }

                for c in &g.coordinates {
                    let flag = encode_triplet(&mut glyph_stream, c.delta_x, c.delta_y);
                    let byte = if c.on_curve_point { flag } else { flag | 0x80 };
                    flag_stream.write_uint8(byte);
                }

                glyph_stream.write_255_uint16(g.instructions.len() as u16);
                instruction_stream.write(&g.instructions);
            }
            GlyphSlot::Composite(g) => {
                n_contour.write_int16(-1);
                bbox_bitmap[i / 8] |= 0x80 >> (i % 8);
                bbox_data.write_int16(g.x_min);
                bbox_data.write_int16(g.y_min);
                bbox_data.write_int16(g.x_max);
                bbox_data.write_int16(g.y_max);
                g.dump_components(&mut composite_stream)?;
                glyph_stream.write_255_uint16(g.instructions.len() as u16);
                instruction_stream.write(&g.instructions);
            }
        }
    }

    let mut out = Stream::new();
    out.write_uint16(0); // reserved
    out.write_uint16(if any_overlap { OPTION_HAS_OVERLAP_BITMAP } else { 0 });
    out.write_uint16(num_glyphs as u16);
    out.write_uint16(0); // index_format: irrelevant, `loca`'s own dump picks its own format

    write_substream(&mut out, n_contour.get_value());
    write_substream(&mut out, n_points.get_value());
    write_substream(&mut out, flag_stream.get_value());
    write_substream(&mut out, glyph_stream.get_value());
    write_substream(&mut out, composite_stream.get_value());

    let mut bbox_combined = bbox_bitmap;
    bbox_combined.extend_from_slice(bbox_data.get_value());
    write_substream(&mut out, &bbox_combined);

    write_substream(&mut out, instruction_stream.get_value());

    if any_overlap {
        out.write(&overlap_bitmap);
    }

    Ok(out.into_bytes())
}

/// Per-glyph `xMin`, as the WOFF2 `hmtx` transform needs it to rematerialize
/// omitted left side bearings.
pub fn glyph_x_mins(glyf: &GlyfTable) -> Vec<i16> {
    glyf.glyphs
        .iter()
        .map(|slot| match slot {
            GlyphSlot::Empty => 0,
            GlyphSlot::Simple(g) => g.x_min,
            GlyphSlot::Composite(g) => g.x_min,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::glyf::component::XyGlyphComponent;

    fn roundtrip(glyf: GlyfTable) {
        let bytes = encode(&glyf).unwrap();
        let (decoded, _) = decode(&bytes).unwrap();
        assert_eq!(decoded, glyf);
    }

    #[test]
    fn roundtrips_empty_glyph() {
        roundtrip(GlyfTable { glyphs: vec![GlyphSlot::Empty] });
    }

    #[test]
    fn roundtrips_simple_glyph_with_small_and_large_deltas() {
        let g = SimpleGlyph {
            x_min: 0,
            y_min: 0,
            x_max: 2000,
            y_max: 2000,
            end_pts_of_contours: vec![2],
            coordinates: vec![
                GlyphCoordinate { on_curve_point: true, delta_x: 0, delta_y: 0 },
                GlyphCoordinate { on_curve_point: true, delta_x: 2000, delta_y: -5 },
                GlyphCoordinate { on_curve_point: false, delta_x: -2000, delta_y: 10 },
            ],
            instructions: vec![1, 2, 3],
            overlap_simple: true,
        };
        roundtrip(GlyfTable { glyphs: vec![GlyphSlot::Simple(g)] });
    }

    #[test]
    fn roundtrips_composite_glyph() {
        let g = ComponentGlyph {
            x_min: -10,
            y_min: -10,
            x_max: 300,
            y_max: 300,
            components: vec![GlyphComponent::Xy(XyGlyphComponent {
                glyph_index: 1,
                x: 12,
                y: -40,
                round_xy_to_grid: true,
                scaled_component_offset: false,
                unscaled_component_offset: false,
                transform: Some((1.0, 0.25, -0.25, 1.0)),
                use_my_metrics: true,
            })],
            instructions: vec![0xAA],
            overlap_compound: true,
        };
        roundtrip(GlyfTable {
            glyphs: vec![GlyphSlot::Empty, GlyphSlot::Composite(g)],
        });
    }

    #[test]
    fn triplet_covers_every_magnitude_range() {
        let cases = [(0, 0), (0, 1279), (-1279, 0), (40, -40), (700, -700), (4000, -4000), (30000, -30000)];
        for (dx, dy) in cases {
            let mut s = Stream::new();
            let flag = encode_triplet(&mut s, dx, dy);
            let bytes = s.into_bytes();
            let mut r = Stream::from_bytes(&bytes);
            let (got_dx, got_dy) = decode_triplet(&mut r, flag).unwrap();
            assert_eq!((got_dx, got_dy), (dx, dy));
        }
    }
}
