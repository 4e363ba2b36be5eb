//! `maxp`: the maximum-profile table. Version 0.5 carries only the glyph
//! count (CFF-flavoured fonts); version 1.0 adds the 14 TrueType maxima
//! used to size interpreter scratch buffers.

use crate::error::{FontError, Result};
use crate::stream::Stream;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrueTypeMaxima {
    pub max_points: u16,
    pub max_contours: u16,
    pub max_composite_points: u16,
    pub max_composite_contours: u16,
    pub max_zones: u16,
    pub max_twilight_points: u16,
    pub max_storage: u16,
    pub max_function_defs: u16,
    pub max_instruction_defs: u16,
    pub max_stack_elements: u16,
    pub max_size_of_instructions: u16,
    pub max_component_elements: u16,
    pub max_component_depth: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaxpTable {
    pub num_glyphs: u16,
    /// `None` for version 0.5 (CFF outlines); `Some` for version 1.0
    /// (TrueType outlines).
    pub true_type_maxima: Option<TrueTypeMaxima>,
}

impl Default for MaxpTable {
    fn default() -> Self {
        MaxpTable { num_glyphs: 0, true_type_maxima: None }
    }
}

impl MaxpTable {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut stream = Stream::from_bytes(data);
        let (major, minor) = stream.read_version_16dot16()?;
        let num_glyphs = stream.read_uint16()?;

        let true_type_maxima = match (major, minor) {
            (0, 5) => None,
            (1, 0) => Some(TrueTypeMaxima {
                max_points: stream.read_uint16()?,
                max_contours: stream.read_uint16()?,
                max_composite_points: stream.read_uint16()?,
                max_composite_contours: stream.read_uint16()?,
                max_zones: stream.read_uint16()?,
                max_twilight_points: stream.read_uint16()?,
                max_storage: stream.read_uint16()?,
                max_function_defs: stream.read_uint16()?,
                max_instruction_defs: stream.read_uint16()?,
                max_stack_elements: stream.read_uint16()?,
                max_size_of_instructions: stream.read_uint16()?,
                max_component_elements: stream.read_uint16()?,
                max_component_depth: stream.read_uint16()?,
            }),
            (maj, min) => {
                return Err(FontError::UnsupportedVersion {
                    table: "maxp",
                    version: format!("{maj}.{min}"),
                });
            }
        };

        Ok(MaxpTable { num_glyphs, true_type_maxima })
    }

    pub fn dump(&self) -> Vec<u8> {
        let mut stream = Stream::new();
        match &self.true_type_maxima {
            None => {
                stream.write_version_16dot16(0, 5);
                stream.write_uint16(self.num_glyphs);
            }
            Some(m) => {
                stream.write_version_16dot16(1, 0);
                stream.write_uint16(self.num_glyphs);
                stream.write_uint16(m.max_points);
                stream.write_uint16(m.max_contours);
                stream.write_uint16(m.max_composite_points);
                stream.write_uint16(m.max_composite_contours);
                stream.write_uint16(m.max_zones);
                stream.write_uint16(m.max_twilight_points);
                stream.write_uint16(m.max_storage);
                stream.write_uint16(m.max_function_defs);
                stream.write_uint16(m.max_instruction_defs);
                stream.write_uint16(m.max_stack_elements);
                stream.write_uint16(m.max_size_of_instructions);
                stream.write_uint16(m.max_component_elements);
                stream.write_uint16(m.max_component_depth);
            }
        }
        stream.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cff_flavour_roundtrip() {
        let t = MaxpTable { num_glyphs: 42, true_type_maxima: None };
        let bytes = t.dump();
        assert_eq!(MaxpTable::parse(&bytes).unwrap(), t);
    }

    #[test]
    fn truetype_flavour_roundtrip() {
        let t = MaxpTable {
            num_glyphs: 9,
            true_type_maxima: Some(TrueTypeMaxima { max_points: 12, max_contours: 3, ..Default::default() }),
        };
        let bytes = t.dump();
        assert_eq!(MaxpTable::parse(&bytes).unwrap(), t);
    }

    #[test]
    fn unsupported_version_is_fatal() {
        let mut s = Stream::new();
        s.write_version_16dot16(2, 0);
        s.write_uint16(0);
        assert!(MaxpTable::parse(s.get_value()).is_err());
    }
}
