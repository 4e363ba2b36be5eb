//! WOFF2: a single brotli-compressed blob wrapping a variable-length table
//! directory. Well-known tags are packed into a 6-bit index instead of
//! being spelled out, and `glyf`/`loca` (and optionally `hmtx`) may carry a
//! transform version that changes how their stored bytes relate to the
//! table's final SFNT bytes.

use crate::error::{FontError, Result};
use crate::stream::Stream;
use crate::tag::{FileTag, SfntVersion, Tag};

/// The 63 tags WOFF2 can reference by index instead of spelling out; index
/// 63 in a directory entry's flag byte means "the tag follows literally".
pub const KNOWN_TAGS: [Tag; 63] = [
    Tag::from_str_const("cmap"),
    Tag::from_str_const("head"),
    Tag::from_str_const("hhea"),
    Tag::from_str_const("hmtx"),
    Tag::from_str_const("maxp"),
    Tag::from_str_const("name"),
    Tag::from_str_const("OS/2"),
    Tag::from_str_const("post"),
    Tag::from_str_const("cvt "),
    Tag::from_str_const("fpgm"),
    Tag::from_str_const("glyf"),
    Tag::from_str_const("loca"),
    Tag::from_str_const("prep"),
    Tag::from_str_const("CFF "),
    Tag::from_str_const("VORG"),
    Tag::from_str_const("EBDT"),
    Tag::from_str_const("EBLC"),
    Tag::from_str_const("gasp"),
    Tag::from_str_const("hdmx"),
    Tag::from_str_const("kern"),
    Tag::from_str_const("LTSH"),
    Tag::from_str_const("PCLT"),
    Tag::from_str_const("VDMX"),
    Tag::from_str_const("vhea"),
    Tag::from_str_const("vmtx"),
    Tag::from_str_const("BASE"),
    Tag::from_str_const("GDEF"),
    Tag::from_str_const("GPOS"),
    Tag::from_str_const("GSUB"),
    Tag::from_str_const("EBSC"),
    Tag::from_str_const("JSTF"),
    Tag::from_str_const("MATH"),
    Tag::from_str_const("CBDT"),
    Tag::from_str_const("CBLC"),
    Tag::from_str_const("COLR"),
    Tag::from_str_const("CPAL"),
    Tag::from_str_const("SVG "),
    Tag::from_str_const("sbix"),
    Tag::from_str_const("acnt"),
    Tag::from_str_const("avar"),
    Tag::from_str_const("bdat"),
    Tag::from_str_const("bloc"),
    Tag::from_str_const("bsln"),
    Tag::from_str_const("cvar"),
    Tag::from_str_const("fdsc"),
    Tag::from_str_const("feat"),
    Tag::from_str_const("fmtx"),
    Tag::from_str_const("fvar"),
    Tag::from_str_const("gvar"),
    Tag::from_str_const("hsty"),
    Tag::from_str_const("just"),
    Tag::from_str_const("lcar"),
    Tag::from_str_const("mort"),
    Tag::from_str_const("morx"),
    Tag::from_str_const("opbd"),
    Tag::from_str_const("prop"),
    Tag::from_str_const("trak"),
    Tag::from_str_const("Zapf"),
    Tag::from_str_const("Silf"),
    Tag::from_str_const("Glat"),
    Tag::from_str_const("Gloc"),
    Tag::from_str_const("Feat"),
    Tag::from_str_const("Sill"),
];

const LITERAL_TAG_INDEX: u8 = 63;

fn known_tag_index(tag: Tag) -> Option<u8> {
    KNOWN_TAGS.iter().position(|&t| t == tag).map(|i| i as u8)
}

/// The transform applied to a table's stored bytes. Unlike every other
/// table, `glyf`/`loca` are transformed *by default*: transform version 3
/// (the bit pattern `11`) means "no transform", the opposite convention
/// from every other table where version 0 means "no transform".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformVersion {
    Version0,
    Version1,
    Version2,
    Version3,
}

impl TransformVersion {
    fn parse(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Version0,
            1 => Self::Version1,
            2 => Self::Version2,
            _ => Self::Version3,
        }
    }

    fn value(self) -> u8 {
        match self {
            Self::Version0 => 0,
            Self::Version1 => 1,
            Self::Version2 => 2,
            Self::Version3 => 3,
        }
    }

    /// `glyf`/`loca` are transformed when this is `Version0`; every other
    /// table is transformed when this is anything *but* `Version0`.
    pub fn is_glyf_loca_transformed(self) -> bool {
        matches!(self, Self::Version0)
    }

    pub fn is_generic_transformed(self) -> bool {
        !matches!(self, Self::Version0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Woff2TableDirectoryEntry {
    pub tag: Tag,
    pub transform_version: TransformVersion,
    pub orig_length: u32,
    /// Only present for tables whose transform changes their length
    /// (`glyf`/`loca`/`hmtx` under a real transform); `None` means the
    /// transformed length equals `orig_length`.
    pub transform_length: Option<u32>,
}

impl Woff2TableDirectoryEntry {
    fn parse(stream: &mut Stream) -> Result<Self> {
        let flag_byte = stream.read_uint8()?;
        let tag_index = flag_byte & 0x3F;
        let transform_version = TransformVersion::parse(flag_byte >> 6);

        let tag = if tag_index == LITERAL_TAG_INDEX {
            stream.read_tag()?
        } else {
            *KNOWN_TAGS
                .get(tag_index as usize)
                .ok_or(FontError::MalformedTransform("woff2 known-tag index out of range"))?
        };

        let orig_length = stream.read_uint_base128()?;

        let is_glyf_or_loca = tag == crate::tag::GLYF || tag == crate::tag::LOCA;
        let has_transform = if is_glyf_or_loca {
            transform_version.is_glyf_loca_transformed()
        } else {
            transform_version.is_generic_transformed()
        };

        let transform_length = if has_transform { Some(stream.read_uint_base128()?) } else { None };

        Ok(Woff2TableDirectoryEntry { tag, transform_version, orig_length, transform_length })
    }

    pub fn dump(&self, stream: &mut Stream) {
        let tag_index = known_tag_index(self.tag).unwrap_or(LITERAL_TAG_INDEX);
        let flag_byte = (self.transform_version.value() << 6) | tag_index;
        stream.write_uint8(flag_byte);
        if tag_index == LITERAL_TAG_INDEX {
            stream.write_tag(self.tag);
        }
        stream.write_uint_base128(self.orig_length);
        if let Some(len) = self.transform_length {
            stream.write_uint_base128(len);
        }
    }

    /// The length of this table's bytes as stored in the compressed blob.
    pub fn stored_length(&self) -> u32 {
        self.transform_length.unwrap_or(self.orig_length)
    }
}

/// A WOFF2 header's `flavor` names either a single font's outline flavour
/// or, for a wrapped TrueType Collection, the `ttcf` tag itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Woff2Flavor {
    Sfnt(SfntVersion),
    Ttc,
}

impl Woff2Flavor {
    pub fn parse(value: u32) -> Result<Self> {
        if value == FileTag::TTC_TAG {
            Ok(Self::Ttc)
        } else {
            Ok(Self::Sfnt(SfntVersion::parse(value)?))
        }
    }

    pub fn value(self) -> u32 {
        match self {
            Self::Sfnt(v) => v.value(),
            Self::Ttc => FileTag::TTC_TAG,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Woff2Header {
    pub flavor: Woff2Flavor,
    pub length: u32,
    pub total_sfnt_size: u32,
    pub total_compressed_size: u32,
    pub major_version: u16,
    pub minor_version: u16,
    pub meta_offset: u32,
    pub meta_length: u32,
    pub meta_orig_length: u32,
    pub priv_offset: u32,
    pub priv_length: u32,
    pub entries: Vec<Woff2TableDirectoryEntry>,
}

impl Woff2Header {
    pub fn parse(data: &[u8]) -> Result<(Self, usize)> {
        let mut stream = Stream::from_bytes(data);
        let signature = stream.read_uint32()?;
        if signature != FileTag::WOFF2_TAG {
            return Err(FontError::UnsupportedContainer(signature));
        }
        let flavor = Woff2Flavor::parse(stream.read_uint32()?)?;
        let length = stream.read_uint32()?;
        let num_tables = stream.read_uint16()?;
        let _reserved = stream.read_uint16()?;
        let total_sfnt_size = stream.read_uint32()?;
        let total_compressed_size = stream.read_uint32()?;
        let major_version = stream.read_uint16()?;
        let minor_version = stream.read_uint16()?;
        let meta_offset = stream.read_offset32()?;
        let meta_length = stream.read_uint32()?;
        let meta_orig_length = stream.read_uint32()?;
        let priv_offset = stream.read_offset32()?;
        let priv_length = stream.read_uint32()?;

        let mut entries = Vec::with_capacity(num_tables as usize);
        for _ in 0..num_tables {
            entries.push(Woff2TableDirectoryEntry::parse(&mut stream)?);
        }

        let header = Woff2Header {
            flavor,
            length,
            total_sfnt_size,
            total_compressed_size,
            major_version,
            minor_version,
            meta_offset,
            meta_length,
            meta_orig_length,
            priv_offset,
            priv_length,
            entries,
        };
        Ok((header, stream.tell()))
    }

    /// Writes a complete WOFF2 blob: header, table directory (and, for a
    /// collection, the collection directory appended right after it per
    /// the format's layout), the single compressed-data block, then the
    /// optional metadata (padded to a 4-byte boundary) and private data
    /// (unpadded, since it's always the file's last block).
    #[allow(clippy::too_many_arguments)]
    pub fn dump(
        flavor: Woff2Flavor,
        major_version: u16,
        minor_version: u16,
        total_sfnt_size: u32,
        entries: &[Woff2TableDirectoryEntry],
        collection_directory: Option<&[u8]>,
        compressed_data: &[u8],
        metadata: Option<&[u8]>,
        meta_orig_length: u32,
        private_data: Option<&[u8]>,
    ) -> Vec<u8> {
        const HEADER_LEN: usize = 48;

        let mut directory_stream = Stream::new();
        for entry in entries {
            entry.dump(&mut directory_stream);
        }
        if let Some(cd) = collection_directory {
            directory_stream.write(cd);
        }
        let directory_bytes = directory_stream.into_bytes();

        let mut offset = HEADER_LEN + directory_bytes.len() + compressed_data.len();
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
        stream.write_uint32(FileTag::WOFF2_TAG);
        stream.write_uint32(flavor.value());
        stream.write_uint32(length);
        stream.write_uint16(entries.len() as u16);
        stream.write_uint16(0);
        stream.write_uint32(total_sfnt_size);
        stream.write_uint32(compressed_data.len() as u32);
        stream.write_uint16(major_version);
        stream.write_uint16(minor_version);
        stream.write_offset32(meta_offset);
        stream.write_uint32(metadata.map(|m| m.len() as u32).unwrap_or(0));
        stream.write_uint32(meta_orig_length);
        stream.write_offset32(priv_offset);
        stream.write_uint32(private_data.map(|p| p.len() as u32).unwrap_or(0));

        stream.write(&directory_bytes);
        stream.write(compressed_data);
        if let Some(m) = metadata {
            stream.write(m);
            let start = stream.tell();
            let pad = (4 - start % 4) % 4;
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

/// The optional collection directory following a WOFF2 header when the
/// wrapped font is a TrueType Collection: per font, the ordered indices of
/// the shared table-directory entries it uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Woff2CollectionFontEntry {
    pub flavor: SfntVersion,
    pub table_indices: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Woff2CollectionDirectory {
    pub major_version: u16,
    pub minor_version: u16,
    pub fonts: Vec<Woff2CollectionFontEntry>,
}

impl Woff2CollectionDirectory {
    pub fn parse(stream: &mut Stream, num_directory_entries: usize) -> Result<Self> {
        let major_version = stream.read_uint16()?;
        let minor_version = stream.read_uint16()?;
        let num_fonts = stream.read_255_uint16()?;

        let mut fonts = Vec::with_capacity(num_fonts as usize);
        for _ in 0..num_fonts {
            let num_tables = stream.read_255_uint16()?;
            let flavor = SfntVersion::parse(stream.read_uint32()?)?;
            let mut table_indices = Vec::with_capacity(num_tables as usize);
            for _ in 0..num_tables {
                let index = stream.read_255_uint16()?;
                if index as usize >= num_directory_entries {
                    return Err(FontError::MalformedTransform(
                        "woff2 collection font references an out-of-range table index",
                    ));
                }
                table_indices.push(index);
            }
            fonts.push(Woff2CollectionFontEntry { flavor, table_indices });
        }

        Ok(Woff2CollectionDirectory { major_version, minor_version, fonts })
    }

    pub fn dump(&self) -> Vec<u8> {
        let mut stream = Stream::new();
        stream.write_uint16(self.major_version);
        stream.write_uint16(self.minor_version);
        stream.write_255_uint16(self.fonts.len() as u16);
        for font in &self.fonts {
            stream.write_255_uint16(font.table_indices.len() as u16);
            stream.write_uint32(font.flavor.value());
            for &index in &font.table_indices {
                stream.write_255_uint16(index);
            }
        }
        stream.into_bytes()
    }
}

#[cfg(feature = "brotli")]
pub fn decompress(data: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    use brotli_decompressor::{brotli_decode, BrotliResult};
    let mut out: Vec<u8> = Vec::with_capacity(expected_size);
    let info = brotli_decode(data, &mut out);
    if !matches!(info.result, BrotliResult::ResultSuccess) {
        return Err(FontError::Decompress("woff2 brotli stream"));
    }
    Ok(out)
}

#[cfg(feature = "brotli")]
pub fn compress(data: &[u8]) -> Vec<u8> {
    use std::io::Write;
    let mut writer = brotli::CompressorWriter::new(Vec::new(), 4096, 11, 22);
    writer.write_all(data).expect("writing to an in-memory buffer cannot fail");
    writer.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "brotli")]
    #[test]
    fn brotli_roundtrip() {
        let original = b"the quick brown fox jumps over the lazy dog".repeat(4);
        let compressed = compress(&original);
        let decompressed = decompress(&compressed, original.len()).unwrap();
        assert_eq!(decompressed, original);
    }

    #[test]
    fn known_tag_roundtrips_through_index() {
        let entry = Woff2TableDirectoryEntry {
            tag: crate::tag::HEAD,
            transform_version: TransformVersion::Version0,
            orig_length: 54,
            transform_length: None,
        };
        let mut s = Stream::new();
        entry.dump(&mut s);
        let bytes = s.into_bytes();
        let mut r = Stream::from_bytes(&bytes);
        let parsed = Woff2TableDirectoryEntry::parse(&mut r).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn literal_tag_roundtrips() {
        let tag = Tag::parse(*b"zzzz").unwrap();
        let entry = Woff2TableDirectoryEntry {
            tag,
            transform_version: TransformVersion::Version3,
            orig_length: 10,
            transform_length: None,
        };
        let mut s = Stream::new();
        entry.dump(&mut s);
        let bytes = s.into_bytes();
        assert_eq!(bytes[0] & 0x3F, LITERAL_TAG_INDEX);
        let mut r = Stream::from_bytes(&bytes);
        assert_eq!(Woff2TableDirectoryEntry::parse(&mut r).unwrap(), entry);
    }

    #[test]
    fn glyf_transform_semantics_are_inverted() {
        // Version0 means "transformed" for glyf/loca...
        assert!(TransformVersion::Version0.is_glyf_loca_transformed());
        assert!(!TransformVersion::Version3.is_glyf_loca_transformed());
        // ...but Version0 means "not transformed" for everything else.
        assert!(!TransformVersion::Version0.is_generic_transformed());
        assert!(TransformVersion::Version1.is_generic_transformed());
    }

    #[test]
    fn rejects_non_woff2_signature() {
        let mut s = Stream::new();
        s.write_uint32(0);
        assert!(Woff2Header::parse(s.get_value()).is_err());
    }

    #[test]
    fn header_dump_roundtrips_through_parse() {
        let entries = vec![Woff2TableDirectoryEntry {
            tag: crate::tag::HEAD,
            transform_version: TransformVersion::Version3,
            orig_length: 54,
            transform_length: None,
        }];
        let compressed = vec![1u8, 2, 3, 4, 5];
        let bytes =
            Woff2Header::dump(Woff2Flavor::Sfnt(SfntVersion::TrueType), 1, 0, 1000, &entries, None, &compressed, None, 0, None);
        let (header, directory_start) = Woff2Header::parse(&bytes).unwrap();
        assert_eq!(header.entries, entries);
        assert_eq!(header.total_sfnt_size, 1000);
        assert_eq!(header.total_compressed_size, compressed.len() as u32);
        let data_start = directory_start;
        assert_eq!(&bytes[data_start..data_start + compressed.len()], compressed.as_slice());
    }

    #[test]
    fn collection_directory_roundtrips() {
        let directory = Woff2CollectionDirectory {
            major_version: 1,
            minor_version: 0,
            fonts: vec![
                Woff2CollectionFontEntry { flavor: SfntVersion::TrueType, table_indices: vec![0, 1, 2] },
                Woff2CollectionFontEntry { flavor: SfntVersion::OpenType, table_indices: vec![0, 3] },
            ],
        };
        let bytes = directory.dump();
        let mut stream = Stream::from_bytes(&bytes);
        let parsed = Woff2CollectionDirectory::parse(&mut stream, 4).unwrap();
        assert_eq!(parsed, directory);
    }
}
