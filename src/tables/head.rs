//! `head`: the font header. Carries the validated magic number, global
//! metrics, epoch-relative timestamps, and the two fields whose value is
//! *derived* from other tables at dump time: `index_to_loc_format` (written
//! by `loca`) and the glyph bounding box (recomputed here from `glyf`).

use crate::error::{FontError, Result};
use crate::flags::bitflags_record;
use crate::stream::{Stream, SFNT_EPOCH_OFFSET_SECONDS};
use crate::tables::glyf::{GlyfTable, GlyphSlot};

pub const MAGIC_NUMBER: u32 = 0x5F0F_3CF5;

bitflags_record! {
    pub struct HeadTableFlags: u16 {
        baseline_at_y_0 => 0,
        left_sidebearing_at_x_0 => 1,
        instructions_depend_on_point_size => 2,
        force_ppem_to_integer => 3,
        instructions_alter_advance_width => 4,
        // bits 5-10 are reserved and always read/write as zero.
        lossless => 11,
        converted => 12,
        optimized_for_cleartype => 13,
        last_resort_font => 14,
    }
}

bitflags_record! {
    pub struct MacStyle: u16 {
        bold => 0,
        italic => 1,
        underline => 2,
        outline => 3,
        shadow => 4,
        condensed => 5,
        extended => 6,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontDirectionHint {
    FullyMixed,
    StronglyLeftToRight,
    LeftToRightWithNeutrals,
    StronglyRightToLeft,
    RightToLeftWithNeutrals,
}

impl FontDirectionHint {
    fn parse(v: i16) -> Result<Self> {
        Ok(match v {
            0 => Self::FullyMixed,
            1 => Self::StronglyLeftToRight,
            2 => Self::LeftToRightWithNeutrals,
            -1 => Self::StronglyRightToLeft,
            -2 => Self::RightToLeftWithNeutrals,
            other => {
                return Err(FontError::UnsupportedVersion {
                    table: "head.fontDirectionHint",
                    version: other.to_string(),
                });
            }
        })
    }

    fn value(self) -> i16 {
        match self {
            Self::FullyMixed => 0,
            Self::StronglyLeftToRight => 1,
            Self::LeftToRightWithNeutrals => 2,
            Self::StronglyRightToLeft => -1,
            Self::RightToLeftWithNeutrals => -2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexToLocFormat {
    Short,
    Long,
}

impl IndexToLocFormat {
    fn parse(v: i16) -> Result<Self> {
        match v {
            0 => Ok(Self::Short),
            1 => Ok(Self::Long),
            other => Err(FontError::UnsupportedVersion {
                table: "head.indexToLocFormat",
                version: other.to_string(),
            }),
        }
    }

    fn value(self) -> i16 {
        match self {
            Self::Short => 0,
            Self::Long => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphDataFormat {
    Current,
}

impl GlyphDataFormat {
    fn parse(v: i16) -> Result<Self> {
        match v {
            0 => Ok(Self::Current),
            other => Err(FontError::UnsupportedVersion {
                table: "head.glyphDataFormat",
                version: other.to_string(),
            }),
        }
    }

    fn value(self) -> i16 {
        match self {
            Self::Current => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadTable {
    pub major_version: u16,
    pub minor_version: u16,
    pub font_revision: i32,
    pub checksum_adjustment: u32,
    pub magic_number: u32,
    pub flags: HeadTableFlags,
    pub units_per_em: u16,
    pub created: i64,
    pub modified: i64,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
    pub mac_style: MacStyle,
    pub lowest_rec_ppem: u16,
    pub font_direction_hint: FontDirectionHint,
    pub index_to_loc_format: IndexToLocFormat,
    pub glyph_data_format: GlyphDataFormat,
}

impl Default for HeadTable {
    fn default() -> Self {
        HeadTable {
            major_version: 1,
            minor_version: 0,
            font_revision: 0,
            checksum_adjustment: 0,
            magic_number: MAGIC_NUMBER,
            flags: HeadTableFlags::default(),
            units_per_em: 1000,
            created: 0,
            modified: 0,
            x_min: 0,
            y_min: 0,
            x_max: 0,
            y_max: 0,
            mac_style: MacStyle::default(),
            lowest_rec_ppem: 6,
            font_direction_hint: FontDirectionHint::FullyMixed,
            index_to_loc_format: IndexToLocFormat::Short,
            glyph_data_format: GlyphDataFormat::Current,
        }
    }
}

impl HeadTable {
    /// Converts an SFNT `LongDateTime` (seconds since 1904-01-01 UTC) to a
    /// Unix timestamp.
    pub fn created_unix_timestamp(&self) -> i64 {
        self.created - SFNT_EPOCH_OFFSET_SECONDS
    }

    pub fn modified_unix_timestamp(&self) -> i64 {
        self.modified - SFNT_EPOCH_OFFSET_SECONDS
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut stream = Stream::from_bytes(data);

        let major_version = stream.read_uint16()?;
        let minor_version = stream.read_uint16()?;
        let font_revision = stream.read_int32()?;
        let checksum_adjustment = stream.read_uint32()?;
        let magic_number = stream.read_uint32()?;
        if magic_number != MAGIC_NUMBER {
            return Err(FontError::BadMagicNumber(magic_number));
        }
        let flags = HeadTableFlags::parse(stream.read_uint16()?);
        let units_per_em = stream.read_uint16()?;
        if !(16..=16384).contains(&units_per_em) {
            return Err(FontError::CountMismatch("head.unitsPerEm must be in [16, 16384]"));
        }
        let created = stream.read_long_date_time()?;
        let modified = stream.read_long_date_time()?;
        let x_min = stream.read_int16()?;
        let y_min = stream.read_int16()?;
        let x_max = stream.read_int16()?;
        let y_max = stream.read_int16()?;
        let mac_style = MacStyle::parse(stream.read_uint16()?);
        let lowest_rec_ppem = stream.read_uint16()?;
        let font_direction_hint = FontDirectionHint::parse(stream.read_int16()?)?;
        let index_to_loc_format = IndexToLocFormat::parse(stream.read_int16()?)?;
        let glyph_data_format = GlyphDataFormat::parse(stream.read_int16()?)?;

        Ok(HeadTable {
            major_version,
            minor_version,
            font_revision,
            checksum_adjustment,
            magic_number,
            flags,
            units_per_em,
            created,
            modified,
            x_min,
            y_min,
            x_max,
            y_max,
            mac_style,
            lowest_rec_ppem,
            font_direction_hint,
            index_to_loc_format,
            glyph_data_format,
        })
    }

    /// Recomputes the glyph bounding box from the font's outline data.
    ///
    /// The source implementation this crate is modeled on passes the
    /// resolved dependency table map into this method under one name but
    /// reads it back under another, so a missing `glyf` table silently
    /// became `None` and the bounding box update was skipped rather than
    /// failing, even for fonts that carry `glyf` and so should never be
    /// missing it. Here `requires_glyf` is decided by the caller from the
    /// font's own table set (does it have a `glyf` table or not), and a
    /// `glyf`-bearing font that somehow reaches this method without its
    /// `glyf` is a hard error rather than a silently skipped update. A
    /// CFF/CFF2-flavoured font, which never carries `glyf`, passes
    /// `requires_glyf: false` and is left with its existing bounds
    /// untouched, since this crate models CFF outlines as opaque bytes.
    pub fn update(&mut self, glyf: Option<&GlyfTable>, requires_glyf: bool) -> Result<()> {
        let Some(glyf) = glyf else {
            if requires_glyf {
                return Err(FontError::MissingDependency("head", "glyf"));
            }
            return Ok(());
        };

        let mut x_min = 0i32;
        let mut y_min = 0i32;
        let mut x_max = 0i32;
        let mut y_max = 0i32;
        let mut any = false;

        for slot in &glyf.glyphs {
            let bounds = match slot {
                GlyphSlot::Empty => continue,
                GlyphSlot::Simple(g) => (g.x_min as i32, g.y_min as i32, g.x_max as i32, g.y_max as i32),
                GlyphSlot::Composite(g) => (g.x_min as i32, g.y_min as i32, g.x_max as i32, g.y_max as i32),
            };
            if !any {
                x_min = bounds.0;
                y_min = bounds.1;
                x_max = bounds.2;
                y_max = bounds.3;
                any = true;
            } else {
                x_min = x_min.min(bounds.0);
                y_min = y_min.min(bounds.1);
                x_max = x_max.max(bounds.2);
                y_max = y_max.max(bounds.3);
            }
        }

        if any {
            self.x_min = x_min as i16;
            self.y_min = y_min as i16;
            self.x_max = x_max as i16;
            self.y_max = y_max as i16;
        }
        Ok(())
    }

    /// Dumps with `checksumAdjustment` set to the given value (`0` while
    /// computing the reconstructed table directory, then the real value on
    /// the final pass).
    pub fn dump(&self, checksum_adjustment: u32) -> Vec<u8> {
        let mut stream = Stream::new();
        stream.write_uint16(self.major_version);
        stream.write_uint16(self.minor_version);
        stream.write_int32(self.font_revision);
        stream.write_uint32(checksum_adjustment);
        stream.write_uint32(self.magic_number);
        stream.write_uint16(self.flags.value());
        stream.write_uint16(self.units_per_em);
        stream.write_long_date_time(self.created);
        stream.write_long_date_time(self.modified);
        stream.write_int16(self.x_min);
        stream.write_int16(self.y_min);
        stream.write_int16(self.x_max);
        stream.write_int16(self.y_max);
        stream.write_uint16(self.mac_style.value());
        stream.write_uint16(self.lowest_rec_ppem);
        stream.write_int16(self.font_direction_hint.value());
        stream.write_int16(self.index_to_loc_format.value());
        stream.write_int16(self.glyph_data_format.value());
        stream.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HeadTable {
        HeadTable { created: 100, modified: 200, ..Default::default() }
    }

    #[test]
    fn roundtrip() {
        let h = sample();
        let bytes = h.dump(0);
        let parsed = HeadTable::parse(&bytes).unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn bad_magic_number_is_fatal() {
        let mut h = sample();
        h.magic_number = 0xDEAD_BEEF;
        let bytes = h.dump(0);
        assert!(HeadTable::parse(&bytes).is_err());
    }

    #[test]
    fn update_without_glyf_leaves_bounds_untouched_for_cff_fonts() {
        let mut h = HeadTable { x_min: 7, ..Default::default() };
        h.update(None, false).unwrap();
        assert_eq!(h.x_min, 7);
    }

    #[test]
    fn update_without_glyf_is_fatal_for_truetype_fonts() {
        let mut h = HeadTable::default();
        assert!(h.update(None, true).is_err());
    }
}
