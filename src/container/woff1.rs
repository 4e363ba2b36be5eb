//! WOFF 1.0: an SFNT wrapped table-by-table in independent zlib streams.
//! Each table entry carries both its compressed and original length so a
//! reader can tell at a glance whether a given table was worth compressing.

use crate::error::{FontError, Result};
use crate::stream::Stream;
use crate::tag::{FileTag, SfntVersion, Tag};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WoffTableDirectoryEntry {
    pub tag: Tag,
    pub offset: u32,
    pub comp_length: u32,
    pub orig_length: u32,
    pub orig_checksum: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WoffHeader {
    pub flavor: SfntVersion,
    pub length: u32,
    pub total_sfnt_size: u32,
    pub major_version: u16,
    pub minor_version: u16,
    pub meta_offset: u32,
    pub meta_length: u32,
    pub meta_orig_length: u32,
    pub priv_offset: u32,
    pub priv_length: u32,
    pub entries: Vec<WoffTableDirectoryEntry>,
}

impl WoffHeader {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut stream = Stream::from_bytes(data);
        let signature = stream.read_uint32()?;
        if signature != FileTag::WOFF_TAG {
            return Err(FontError::UnsupportedContainer(signature));
        }
        let flavor = SfntVersion::parse(stream.read_uint32()?)?;
        let length = stream.read_uint32()?;
        let num_tables = stream.read_uint16()?;
        let _reserved = stream.read_uint16()?;
        let total_sfnt_size = stream.read_uint32()?;
        let major_version = stream.read_uint16()?;
        let minor_version = stream.read_uint16()?;
        let meta_offset = stream.read_offset32()?;
        let meta_length = stream.read_uint32()?;
        let meta_orig_length = stream.read_uint32()?;
        let priv_offset = stream.read_offset32()?;
        let priv_length = stream.read_uint32()?;

        let mut entries = Vec::with_capacity(num_tables as usize);
        for _ in 0..num_tables {
            entries.push(WoffTableDirectoryEntry {
                tag: stream.read_tag()?,
                offset: stream.read_offset32()?,
                comp_length: stream.read_uint32()?,
                orig_length: stream.read_uint32()?,
                orig_checksum: stream.read_uint32()?,
            });
        }

        Ok(WoffHeader {
            flavor,
            length,
            total_sfnt_size,
            major_version,
            minor_version,
            meta_offset,
            meta_length,
            meta_orig_length,
            priv_offset,
            priv_length,
            entries,
        })
    }

    /// The raw (still zlib-compressed, unless `comp_length == orig_length`)
    /// bytes for one table entry.
    pub fn raw_table_bytes<'a>(&self, data: &'a [u8], entry: &WoffTableDirectoryEntry) -> Result<&'a [u8]> {
        let start = entry.offset as usize;
        let end = start + entry.comp_length as usize;
        data.get(start..end)
            .ok_or(FontError::EndOfStream { wanted: entry.comp_length as usize, available: data.len() })
    }

    /// One table's contribution to a WOFF blob: its tag, the (possibly
    /// zlib-compressed) bytes actually stored, and the checksum/length of
    /// the *original* (uncompressed) SFNT table bytes.
    pub fn dump(
        flavor: SfntVersion,
        major_version: u16,
        minor_version: u16,
        total_sfnt_size: u32,
        tables: &[(Tag, Vec<u8>, u32, u32)],
        metadata: Option<&[u8]>,
        meta_orig_length: u32,
        private_data: Option<&[u8]>,
    ) -> Vec<u8> {
        let num_tables = tables.len() as u16;
        let header_len = 44 + 20 * tables.len();

        let mut offset = header_len;
        let mut directory = Vec::with_capacity(tables.len());
        for (tag, bytes, orig_checksum, orig_length) in tables {
            directory.push((*tag, offset as u32, bytes.len() as u32, *orig_length, *orig_checksum));
            offset += bytes.len();
            offset += (4 - offset % 4) % 4;
        }

        let meta_offset = if metadata.is_some() { offset as u32 } else { 0 };
        if let Some(m) = metadata {
            offset += m.len();
            offset += (4 - offset % 4) % 4;
        }
        let priv_offset = if private_data.is_some() { offset as u32 } else { 0 };
        if let Some(p) = private_data {
            offset += p.len();
        }
        let length = offset as u32;

        let mut stream = Stream::new();
        stream.write_uint32(FileTag::WOFF_TAG);
        stream.write_uint32(flavor.value());
        stream.write_uint32(length);
        stream.write_uint16(num_tables);
        stream.write_uint16(0);
        stream.write_uint32(total_sfnt_size);
        stream.write_uint16(major_version);
        stream.write_uint16(minor_version);
        stream.write_offset32(meta_offset);
        stream.write_uint32(metadata.map(|m| m.len() as u32).unwrap_or(0));
        stream.write_uint32(meta_orig_length);
        stream.write_offset32(priv_offset);
        stream.write_uint32(private_data.map(|p| p.len() as u32).unwrap_or(0));

        for (tag, offset, comp_length, orig_length, orig_checksum) in &directory {
            stream.write_tag(*tag);
            stream.write_offset32(*offset);
            stream.write_uint32(*comp_length);
            stream.write_uint32(*orig_length);
            stream.write_uint32(*orig_checksum);
        }

        for (_, bytes, _, _) in tables {
            stream.write(bytes);
            let pad = (4 - bytes.len() % 4) % 4;
            if pad > 0 {
                stream.write(&vec![0u8; pad]);
            }
        }
        if let Some(m) = metadata {
            stream.write(m);
            let pad = (4 - m.len() % 4) % 4;
            if pad > 0 {
                stream.write(&vec![0u8; pad]);
            }
        }
        if let Some(p) = private_data {
            stream.write(p);
        }

        stream.into_bytes()
    }
}

#[cfg(feature = "z")]
pub fn inflate_table(raw: &[u8], orig_length: u32) -> Result<Vec<u8>> {
    use std::io::Read;
    let mut decoder = flate2::read::ZlibDecoder::new(raw);
    let mut out = Vec::with_capacity(orig_length as usize);
    decoder
        .read_to_end(&mut out)
        .map_err(|_| FontError::Decompress("woff table zlib stream"))?;
    Ok(out)
}

#[cfg(feature = "z")]
pub fn deflate_table(data: &[u8]) -> Vec<u8> {
    use std::io::Write;
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::best());
    encoder.write_all(data).expect("writing to an in-memory buffer cannot fail");
    encoder.finish().expect("finishing an in-memory zlib stream cannot fail")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_woff_signature() {
        let mut s = Stream::new();
        s.write_uint32(0);
        assert!(WoffHeader::parse(s.get_value()).is_err());
    }

    #[test]
    fn dump_roundtrips_through_parse() {
        let tables = vec![
            (Tag::parse(*b"head").unwrap(), vec![1, 2, 3, 4], 0x1111_2222, 4),
            (Tag::parse(*b"maxp").unwrap(), vec![5, 6], 0x3333_4444, 2),
        ];
        let bytes = WoffHeader::dump(SfntVersion::TrueType, 1, 0, 123, &tables, None, 0, None);
        let header = WoffHeader::parse(&bytes).unwrap();
        assert_eq!(header.entries.len(), 2);
        assert_eq!(header.total_sfnt_size, 123);
        for (entry, (tag, data, checksum, orig_length)) in header.entries.iter().zip(&tables) {
            assert_eq!(entry.tag, *tag);
            assert_eq!(entry.orig_checksum, *checksum);
            assert_eq!(entry.orig_length, *orig_length);
            assert_eq!(header.raw_table_bytes(&bytes, entry).unwrap(), data.as_slice());
        }
    }

    #[cfg(feature = "z")]
    #[test]
    fn zlib_roundtrip_and_compaction() {
        let original = b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_vec();
        let compressed = deflate_table(&original);
        assert!(compressed.len() < original.len());
        let decompressed = inflate_table(&compressed, original.len() as u32).unwrap();
        assert_eq!(decompressed, original);
    }
}
