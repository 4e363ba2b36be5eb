//! `FontCollection`: an ordered sequence of [`Font`]s sharing one
//! underlying container — a `ttcf` TrueType Collection or a WOFF2 blob
//! whose flavor is `ttcf`. Table bytes referenced by more than one member
//! font are parsed once and shared between them (see [`crate::reader`]);
//! checksum verification is skipped per member, same as for a [`Font`]
//! parsed as one element of a collection via [`Font::parse`].

use crate::config::SfntConfigs;
use crate::container::sfnt::TtcHeader;
use crate::container::woff2::{Woff2CollectionDirectory, Woff2Flavor, Woff2Header};
use crate::error::{FontError, Result};
use crate::font::Font;
use crate::payload::{TtcPayload, WoffPayload};
use crate::reader::{Woff2CollectionReader, XtfCollectionReader};
use crate::tables::dsig::DsigTable;
use crate::tag::{self, FileTag};

/// An ordered collection of fonts read from (or destined for) a single
/// `ttcf` or WOFF2-collection container, plus whatever whole-collection
/// payload that container carries outside any one member font.
#[derive(Debug, Clone, PartialEq)]
pub struct FontCollection {
    pub fonts: Vec<Font>,
    pub ttc_payload: Option<TtcPayload>,
    pub woff_payload: Option<WoffPayload>,
}

impl FontCollection {
    pub fn num_fonts(&self) -> usize {
        self.fonts.len()
    }

    pub fn get(&self, index: usize) -> Option<&Font> {
        self.fonts.get(index)
    }

    // ------------------------------------------------------------------
    // Parsing
    // ------------------------------------------------------------------

    /// Parses every member font out of a `ttcf` or WOFF2-wrapped
    /// collection. A plain SFNT or WOFF is accepted too and parsed as a
    /// one-font collection, so callers that don't yet know whether a blob
    /// is a collection can always go through this entry point.
    pub fn parse(bytes: &[u8], configs: Option<SfntConfigs>) -> Result<FontCollection> {
        let span = tracing::info_span!("font_collection_parse", bytes = bytes.len());
        let _enter = span.enter();
        let configs = configs.unwrap_or_default();

        let result = Self::parse_inner(bytes, &configs);
        if let Err(ref e) = result {
            tracing::warn!(error = %e, "font collection parse failed");
        }
        result
    }

    fn parse_inner(bytes: &[u8], configs: &SfntConfigs) -> Result<FontCollection> {
        if bytes.len() < 4 {
            return Err(FontError::EndOfStream { wanted: 4, available: bytes.len() });
        }
        let leading = u32::from_be_bytes(bytes[0..4].try_into().unwrap());
        let file_tag = FileTag::sniff(leading)?;

        match file_tag {
            FileTag::Ttc => Self::parse_ttc(bytes, configs),
            FileTag::Woff2 => {
                let (header, _) = Woff2Header::parse(bytes)?;
                match header.flavor {
                    Woff2Flavor::Ttc => Self::parse_woff2_collection(bytes, configs),
                    Woff2Flavor::Sfnt(_) => {
                        let font = Font::parse(bytes, Some(configs.clone()), None)?;
                        let woff_payload = font.woff_payload.clone();
                        Ok(FontCollection { fonts: vec![font], ttc_payload: None, woff_payload })
                    }
                }
            }
            FileTag::Sfnt(_) | FileTag::Woff => {
                let font = Font::parse(bytes, Some(configs.clone()), None)?;
                let woff_payload = font.woff_payload.clone();
                Ok(FontCollection { fonts: vec![font], ttc_payload: None, woff_payload })
            }
        }
    }

    fn parse_ttc(bytes: &[u8], configs: &SfntConfigs) -> Result<FontCollection> {
        let collection = XtfCollectionReader::new(bytes.to_vec())?;
        let mut fonts = Vec::with_capacity(collection.num_fonts());
        for index in 0..collection.num_fonts() {
            let reader = collection.font_reader(index).expect("index is within num_fonts");
            let font = Font::from_tags(reader.sfnt_version(), reader.table_tags(), |tag| reader.get_table(configs, tag))?;
            fonts.push(font);
        }

        let ttc = &collection.ttc;
        let dsig = match (ttc.dsig_tag, ttc.dsig_length, ttc.dsig_offset) {
            (Some(tag_value), Some(length), Some(offset)) if tag_value != 0 => {
                let start = offset as usize;
                let end = start + length as usize;
                let data = bytes
                    .get(start..end)
                    .ok_or(FontError::EndOfStream { wanted: length as usize, available: bytes.len() })?;
                Some(DsigTable::parse(data)?)
            }
            _ => None,
        };

        Ok(FontCollection {
            fonts,
            ttc_payload: Some(TtcPayload { major_version: ttc.major_version, minor_version: ttc.minor_version, dsig }),
            woff_payload: None,
        })
    }

    fn parse_woff2_collection(bytes: &[u8], configs: &SfntConfigs) -> Result<FontCollection> {
        let collection = Woff2CollectionReader::new(bytes)?;
        let mut fonts = Vec::with_capacity(collection.num_fonts());
        for index in 0..collection.num_fonts() {
            let reader = collection.font_reader(index).expect("index is within num_fonts");
            let mut font =
                Font::from_tags(reader.sfnt_version(), reader.table_tags(), |tag| reader.get_table(configs, tag))?;
            font.woff_payload = Some(collection.read_woff_payload());
            fonts.push(font);
        }

        let cd = &collection.collection_directory;
        Ok(FontCollection {
            fonts,
            ttc_payload: Some(TtcPayload { major_version: cd.major_version, minor_version: cd.minor_version, dsig: None }),
            woff_payload: Some(collection.read_woff_payload()),
        })
    }

    /// Convenience wrapper reading the whole file into memory before
    /// parsing.
    pub fn load<P: AsRef<std::path::Path>>(path: P, configs: Option<SfntConfigs>) -> Result<FontCollection> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes, configs)
    }

    // ------------------------------------------------------------------
    // Dumping
    // ------------------------------------------------------------------

    /// Writes a `ttcf` TrueType Collection. Each member font is dumped in
    /// full (this crate does not attempt to reconstruct a shared byte pool
    /// on write, even if the parsed input shared table bytes across its
    /// members); the whole-collection `DSIG`, if present, is appended after
    /// every font's tables.
    pub fn dump_ttc(&self, configs: &SfntConfigs) -> Result<Vec<u8>> {
        let ttc_payload = self.ttc_payload.clone().unwrap_or_default();

        let mut font_bytes = Vec::with_capacity(self.fonts.len());
        for font in &self.fonts {
            font_bytes.push(font.dump_sfnt(configs)?);
        }

        let is_v2 = matches!((ttc_payload.major_version, ttc_payload.minor_version), (2, 0));
        let header_len = 12 + 4 * font_bytes.len() + if is_v2 { 12 } else { 0 };

        let mut offset = header_len;
        let mut font_offsets = Vec::with_capacity(font_bytes.len());
        for fb in &font_bytes {
            font_offsets.push(offset as u32);
            offset += fb.len();
        }

        let dsig_bytes = ttc_payload.dsig.as_ref().map(|d| d.dump());
        let dsig_offset = dsig_bytes.as_ref().map(|_| offset as u32);

        let ttc_header = TtcHeader {
            major_version: ttc_payload.major_version,
            minor_version: ttc_payload.minor_version,
            font_offsets,
            dsig_tag: dsig_bytes.as_ref().map(|_| u32::from_be_bytes(tag::DSIG.as_bytes())),
            dsig_length: dsig_bytes.as_ref().map(|b| b.len() as u32),
            dsig_offset,
        };

        let mut out = ttc_header.dump()?;
        for fb in &font_bytes {
            out.extend_from_slice(fb);
        }
        if let Some(db) = dsig_bytes {
            out.extend_from_slice(&db);
        }
        Ok(out)
    }

    /// Writes a WOFF2-wrapped `ttcf` collection: every member font dumped
    /// independently through [`Font::dump_woff2`]'s per-table transform
    /// policy, concatenated into one brotli stream, with a collection
    /// directory pointing each font at the subset of directory entries it
    /// contributed. Like [`FontCollection::dump_ttc`], no table sharing is
    /// reconstructed on write.
    pub fn dump_woff2(&self, configs: &SfntConfigs) -> Result<Vec<u8>> {
        use crate::container::woff2::{self, TransformVersion, Woff2CollectionFontEntry, Woff2TableDirectoryEntry};

        let ttc_payload = self.ttc_payload.clone().unwrap_or_default();

        let mut entries: Vec<Woff2TableDirectoryEntry> = Vec::new();
        let mut entry_orig_bytes: Vec<Vec<u8>> = Vec::new();
        let mut blob = Vec::new();
        let mut font_entries = Vec::with_capacity(self.fonts.len());
        let mut total_sfnt_size = 0u32;

        for font in &self.fonts {
            let sfnt_bytes = font.dump_sfnt(configs)?;
            total_sfnt_size += sfnt_bytes.len() as u32;
            let directory = crate::container::sfnt::SfntDirectory::parse(&sfnt_bytes, 0)?;

            let glyf_live = font.get(tag::GLYF).and_then(crate::tables::Table::as_glyf);
            let mut table_indices = Vec::with_capacity(font.tags().count());

            for t in font.tags() {
                let bytes = directory
                    .table_data(&sfnt_bytes, t)
                    .ok_or(FontError::MissingDependency("woff2", "table"))?
                    .to_vec();

                // Only reuse an earlier entry when both its tag and its
                // original (untransformed) bytes match exactly; two member
                // fonts can use the same tag for unrelated content.
                if let Some(existing) = entries
                    .iter()
                    .zip(&entry_orig_bytes)
                    .position(|(e, orig)| e.tag == t && orig == &bytes)
                {
                    table_indices.push(existing as u16);
                    continue;
                }

                if t == tag::GLYF {
                    let glyf = glyf_live.ok_or(FontError::MissingDependency("woff2", "glyf"))?;
                    let transformed = crate::transform::glyf_loca::encode(glyf)?;
                    entries.push(Woff2TableDirectoryEntry {
                        tag: t,
                        transform_version: TransformVersion::Version0,
                        orig_length: bytes.len() as u32,
                        transform_length: Some(transformed.len() as u32),
                    });
                    blob.extend_from_slice(&transformed);
                } else if t == tag::LOCA {
                    entries.push(Woff2TableDirectoryEntry {
                        tag: t,
                        transform_version: TransformVersion::Version0,
                        orig_length: bytes.len() as u32,
                        transform_length: Some(0),
                    });
                } else {
                    entries.push(Woff2TableDirectoryEntry {
                        tag: t,
                        transform_version: TransformVersion::Version0,
                        orig_length: bytes.len() as u32,
                        transform_length: None,
                    });
                    blob.extend_from_slice(&bytes);
                }
                entry_orig_bytes.push(bytes);
                table_indices.push((entries.len() - 1) as u16);
            }

            font_entries.push(Woff2CollectionFontEntry { flavor: font.sfnt_version, table_indices });
        }

        let collection_directory = Woff2CollectionDirectory {
            major_version: ttc_payload.major_version,
            minor_version: ttc_payload.minor_version,
            fonts: font_entries,
        };

        #[cfg(feature = "brotli")]
        let compressed = woff2::compress(&blob);
        #[cfg(not(feature = "brotli"))]
        let compressed = blob.clone();

        let meta_orig_length = self.woff_payload.as_ref().and_then(|p| p.metadata.as_ref()).map(|m| m.len() as u32).unwrap_or(0);
        #[cfg(feature = "brotli")]
        let metadata = self.woff_payload.as_ref().and_then(|p| p.metadata.as_ref()).map(|m| woff2::compress(m));
        #[cfg(not(feature = "brotli"))]
        let metadata = self.woff_payload.as_ref().and_then(|p| p.metadata.clone());
        let private_data = self.woff_payload.as_ref().and_then(|p| p.private_data.clone());
        let (major_version, minor_version) =
            self.woff_payload.as_ref().map(|p| (p.major_version, p.minor_version)).unwrap_or((1, 0));

        Ok(Woff2Header::dump(
            Woff2Flavor::Ttc,
            major_version,
            minor_version,
            total_sfnt_size,
            &entries,
            Some(&collection_directory.dump()),
            &compressed,
            metadata.as_deref(),
            meta_orig_length,
            private_data.as_deref(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::sfnt::SfntDirectory;
    use crate::tables::head::HeadTable;
    use crate::tables::maxp::MaxpTable;
    use crate::tables::Table;
    use crate::tag::{SfntVersion, Tag};

    fn minimal_font() -> Font {
        let mut font = Font::new(SfntVersion::TrueType);
        font.insert(tag::HEAD, Table::Head(HeadTable::default())).unwrap();
        font.insert(tag::MAXP, Table::Maxp(MaxpTable { num_glyphs: 0, true_type_maxima: None })).unwrap();
        font
    }

    fn build_ttc(fonts: &[Font], configs: &SfntConfigs) -> Vec<u8> {
        let collection = FontCollection { fonts: fonts.to_vec(), ttc_payload: None, woff_payload: None };
        collection.dump_ttc(configs).unwrap()
    }

    #[test]
    fn ttc_roundtrips_two_fonts() {
        let configs = SfntConfigs::default();
        let fonts = vec![minimal_font(), minimal_font()];
        let bytes = build_ttc(&fonts, &configs);

        assert_eq!(u32::from_be_bytes(bytes[0..4].try_into().unwrap()), FileTag::TTC_TAG);

        let parsed = FontCollection::parse(&bytes, Some(configs)).unwrap();
        assert_eq!(parsed.num_fonts(), 2);
        for font in &parsed.fonts {
            assert!(font.get(tag::HEAD).is_some());
            assert!(font.get(tag::MAXP).is_some());
        }
    }

    #[test]
    fn single_sfnt_parses_as_one_font_collection() {
        let configs = SfntConfigs::default();
        let font = minimal_font();
        let sfnt_bytes = font.dump_sfnt(&configs).unwrap();
        let collection = FontCollection::parse(&sfnt_bytes, Some(configs)).unwrap();
        assert_eq!(collection.num_fonts(), 1);
        assert!(collection.ttc_payload.is_none());
    }

    #[test]
    fn ttc_v2_header_without_dsig_roundtrips() {
        let configs = SfntConfigs::default();
        let fonts = vec![minimal_font()];
        let collection =
            FontCollection { fonts, ttc_payload: Some(TtcPayload { major_version: 2, minor_version: 0, dsig: None }), woff_payload: None };
        let bytes = collection.dump_ttc(&configs).unwrap();
        let parsed = FontCollection::parse(&bytes, Some(configs)).unwrap();
        assert_eq!(parsed.ttc_payload.unwrap().major_version, 2);
    }

    #[test]
    fn fonts_do_not_need_a_shared_directory_to_dump() {
        // Covers the directory-reconstruction helper used by `dump_ttc`;
        // `SfntDirectory` itself is exercised in `container::sfnt`'s tests.
        let configs = SfntConfigs::default();
        let font = minimal_font();
        let bytes = font.dump_sfnt(&configs).unwrap();
        let directory = SfntDirectory::parse(&bytes, 0).unwrap();
        assert!(directory.table_data(&bytes, tag::HEAD).is_some());
        let _ = Tag::parse(*b"head").unwrap();
    }

    #[test]
    fn load_reads_a_collection_from_disk() {
        let configs = SfntConfigs::default();
        let fonts = vec![minimal_font(), minimal_font()];
        let collection = FontCollection { fonts, ttc_payload: None, woff_payload: None };
        let bytes = collection.dump_ttc(&configs).unwrap();

        let mut path = tempfile::NamedTempFile::new().unwrap();
        use std::io::Write;
        path.write_all(&bytes).unwrap();

        let loaded = FontCollection::load(path.path(), Some(configs)).unwrap();
        assert_eq!(loaded.num_fonts(), 2);
    }
}
