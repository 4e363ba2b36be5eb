//! The plain SFNT container: a table directory of 16-byte records
//! (`tag`, `checksum`, `offset`, `length`) following a 4-byte version tag,
//! and the TrueType Collection wrapper that lets several such directories
//! share table bytes by offset.

use crate::checksum::calculate_checksum;
use crate::error::{FontError, Result};
use crate::stream::Stream;
use crate::tag::{FileTag, SfntVersion, Tag};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRecord {
    pub tag: Tag,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SfntDirectory {
    pub version: SfntVersion,
    pub records: Vec<TableRecord>,
}

impl SfntDirectory {
    pub fn parse(data: &[u8], start: usize) -> Result<Self> {
        let mut stream = Stream::from_bytes(data);
        stream.seek(start);
        let version = SfntVersion::parse(stream.read_uint32()?)?;
        let num_tables = stream.read_uint16()?;
        let _search_range = stream.read_uint16()?;
        let _entry_selector = stream.read_uint16()?;
        let _range_shift = stream.read_uint16()?;

        let mut records = Vec::with_capacity(num_tables as usize);
        for _ in 0..num_tables {
            records.push(TableRecord {
                tag: stream.read_tag()?,
                checksum: stream.read_uint32()?,
                offset: stream.read_offset32()?,
                length: stream.read_uint32()?,
            });
        }
        Ok(SfntDirectory { version, records })
    }

    pub fn table_data<'a>(&self, data: &'a [u8], tag: Tag) -> Option<&'a [u8]> {
        let record = self.records.iter().find(|r| r.tag == tag)?;
        let start = record.offset as usize;
        let end = start + record.length as usize;
        data.get(start..end)
    }

    /// `searchRange`/`entrySelector`/`rangeShift` for `num_tables`, per the
    /// standard binary-search-friendly directory header.
    fn binary_search_header(num_tables: u16) -> (u16, u16, u16) {
        let mut max_pow2: u16 = 1;
        let mut entry_selector: u16 = 0;
        while max_pow2 * 2 <= num_tables {
            max_pow2 *= 2;
            entry_selector += 1;
        }
        let search_range = max_pow2 * 16;
        let range_shift = num_tables * 16 - search_range;
        (search_range, entry_selector, range_shift)
    }

    /// Writes the directory header and records; `table_bytes` must be given
    /// in the same order as `self.records` and already include any alignment
    /// padding. Returns the full serialized directory plus tables, and the
    /// directory's own checksum contribution.
    pub fn dump(version: SfntVersion, records_and_data: &[(Tag, Vec<u8>)]) -> (Vec<u8>, u32) {
        let num_tables = records_and_data.len() as u16;
        let (search_range, entry_selector, range_shift) = Self::binary_search_header(num_tables);

        let mut stream = Stream::new();
        stream.write_uint32(version.value());
        stream.write_uint16(num_tables);
        stream.write_uint16(search_range);
        stream.write_uint16(entry_selector);
        stream.write_uint16(range_shift);

        let header_len = 12 + 16 * records_and_data.len();
        let mut offset = header_len;
        for (tag, bytes) in records_and_data {
            let checksum = calculate_checksum(bytes);
            stream.write_tag(*tag);
            stream.write_uint32(checksum);
            stream.write_offset32(offset as u32);
            stream.write_uint32(bytes.len() as u32);
            offset += bytes.len();
            offset += (4 - bytes.len() % 4) % 4;
        }

        let directory_checksum = calculate_checksum(stream.get_value());

        for (_, bytes) in records_and_data {
            stream.write(bytes);
            let pad = (4 - bytes.len() % 4) % 4;
            if pad > 0 {
                stream.write(&vec![0u8; pad]);
            }
        }

        (stream.into_bytes(), directory_checksum)
    }

    /// Writes just the directory header and records (no table bytes), at
    /// whatever offsets `records` already carry. Used to reconstruct the
    /// table directory's checksum contribution toward
    /// `head.checksumAdjustment` without re-serializing every table.
    pub fn dump_header_only(version: SfntVersion, records: &[TableRecord]) -> Vec<u8> {
        let num_tables = records.len() as u16;
        let (search_range, entry_selector, range_shift) = Self::binary_search_header(num_tables);

        let mut stream = Stream::new();
        stream.write_uint32(version.value());
        stream.write_uint16(num_tables);
        stream.write_uint16(search_range);
        stream.write_uint16(entry_selector);
        stream.write_uint16(range_shift);

        for record in records {
            stream.write_tag(record.tag);
            stream.write_uint32(record.checksum);
            stream.write_offset32(record.offset);
            stream.write_uint32(record.length);
        }

        stream.into_bytes()
    }
}

/// A TrueType Collection header: multiple SFNT directories addressing a
/// shared byte pool. Version 2.0 adds an optional whole-collection `DSIG`
/// pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtcHeader {
    pub major_version: u16,
    pub minor_version: u16,
    pub font_offsets: Vec<u32>,
    pub dsig_tag: Option<u32>,
    pub dsig_length: Option<u32>,
    pub dsig_offset: Option<u32>,
}

impl TtcHeader {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut stream = Stream::from_bytes(data);
        let tag = stream.read_uint32()?;
        if tag != FileTag::TTC_TAG {
            return Err(FontError::UnsupportedContainer(tag));
        }
        let major_version = stream.read_uint16()?;
        let minor_version = stream.read_uint16()?;
        let num_fonts = stream.read_uint32()?;
        let mut font_offsets = Vec::with_capacity(num_fonts as usize);
        for _ in 0..num_fonts {
            font_offsets.push(stream.read_offset32()?);
        }

        let (dsig_tag, dsig_length, dsig_offset) = if major_version >= 2 && stream.remaining() >= 12 {
            (
                Some(stream.read_uint32()?),
                Some(stream.read_uint32()?),
                Some(stream.read_offset32()?),
            )
        } else {
            (None, None, None)
        };

        Ok(TtcHeader { major_version, minor_version, font_offsets, dsig_tag, dsig_length, dsig_offset })
    }

    pub fn num_fonts(&self) -> u32 {
        self.font_offsets.len() as u32
    }

    /// Writes the `ttcf` header: tag, version, font count, per-font
    /// directory offsets, and, for version 2.0 only, the whole-collection
    /// `DSIG` pointer (a zero tag when the collection carries no `DSIG`).
    /// Any other `(major, minor)` pairing is not a version this format
    /// defines, so it is rejected rather than guessed at.
    pub fn dump(&self) -> Result<Vec<u8>> {
        let mut stream = Stream::new();
        stream.write_uint32(FileTag::TTC_TAG);
        stream.write_uint16(self.major_version);
        stream.write_uint16(self.minor_version);
        stream.write_uint32(self.num_fonts());
        for &offset in &self.font_offsets {
            stream.write_offset32(offset);
        }

        match (self.major_version, self.minor_version) {
            (1, 0) => {}
            (2, 0) => {
                stream.write_uint32(self.dsig_tag.unwrap_or(0));
                stream.write_uint32(self.dsig_length.unwrap_or(0));
                stream.write_offset32(self.dsig_offset.unwrap_or(0));
            }
            (major, minor) => {
                return Err(FontError::UnsupportedVersion {
                    table: "ttcHeader",
                    version: format!("{major}.{minor}"),
                });
            }
        }

        Ok(stream.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory_bytes() -> (Vec<u8>, Vec<(Tag, Vec<u8>)>) {
        let records = vec![
            (Tag::parse(*b"head").unwrap(), vec![1, 2, 3, 4]),
            (Tag::parse(*b"maxp").unwrap(), vec![5, 6, 7, 8]),
        ];
        let (bytes, _) = SfntDirectory::dump(SfntVersion::TrueType, &records);
        (bytes, records)
    }

    #[test]
    fn parse_roundtrips_offsets_and_lengths() {
        let (bytes, records) = directory_bytes();
        let dir = SfntDirectory::parse(&bytes, 0).unwrap();
        assert_eq!(dir.records.len(), records.len());
        for (record, (tag, data)) in dir.records.iter().zip(&records) {
            assert_eq!(record.tag, *tag);
            assert_eq!(dir.table_data(&bytes, *tag).unwrap(), data.as_slice());
        }
    }

    #[test]
    fn ttc_header_rejects_non_ttc_tag() {
        let mut s = Stream::new();
        s.write_uint32(0);
        assert!(TtcHeader::parse(s.get_value()).is_err());
    }

    #[test]
    fn ttc_header_roundtrips_version_one() {
        let header = TtcHeader {
            major_version: 1,
            minor_version: 0,
            font_offsets: vec![12, 100],
            dsig_tag: None,
            dsig_length: None,
            dsig_offset: None,
        };
        let bytes = header.dump().unwrap();
        assert_eq!(TtcHeader::parse(&bytes).unwrap(), header);
    }

    #[test]
    fn ttc_header_roundtrips_version_two_with_dsig() {
        let header = TtcHeader {
            major_version: 2,
            minor_version: 0,
            font_offsets: vec![12],
            dsig_tag: Some(0x4453_4947),
            dsig_length: Some(40),
            dsig_offset: Some(200),
        };
        let bytes = header.dump().unwrap();
        assert_eq!(TtcHeader::parse(&bytes).unwrap(), header);
    }

    #[test]
    fn ttc_header_rejects_unknown_version() {
        let header = TtcHeader {
            major_version: 3,
            minor_version: 0,
            font_offsets: vec![12],
            dsig_tag: None,
            dsig_length: None,
            dsig_offset: None,
        };
        assert!(header.dump().is_err());
    }
}
