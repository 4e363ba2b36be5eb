//! `Font`: a single font's tables, keyed by tag, plus the outline flavour
//! and (if the font came from a WOFF/WOFF2 wrapper) its metadata/private
//! data payload. This is the top-level entry point for parsing and
//! re-serializing a font in any of the four supported containers.

use std::rc::Rc;

use crate::checksum::{calculate_checksum, calculate_checksum_adjustment};
use crate::config::SfntConfigs;
use crate::container::sfnt::SfntDirectory;
use crate::container::woff1::{self, WoffHeader};
use crate::container::woff2::{self, TransformVersion, Woff2Flavor, Woff2Header, Woff2TableDirectoryEntry};
use crate::error::{FontError, Result};
use crate::payload::WoffPayload;
use crate::reader::{WoffReader, Woff2CollectionReader, Woff2Reader, XtfCollectionReader, XtfReader};
use crate::tables::head::HeadTable;
use crate::tables::{Table, TableKind};
use crate::tag::{self, FileTag, SfntVersion, Tag};
use crate::transform::glyf_loca;

/// A font's tables, in directory order, with the outline flavour and any
/// WOFF envelope payload carried alongside (never as a pseudo-table).
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub sfnt_version: SfntVersion,
    pub woff_payload: Option<WoffPayload>,
    tables: Vec<(Tag, Table)>,
}

impl Font {
    pub fn new(sfnt_version: SfntVersion) -> Self {
        Font { sfnt_version, woff_payload: None, tables: Vec::new() }
    }

    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.tables.iter().map(|(tag, _)| *tag)
    }

    pub fn get(&self, tag: Tag) -> Option<&Table> {
        self.tables.iter().find(|(t, _)| *t == tag).map(|(_, table)| table)
    }

    /// Installs `table` under `tag`, after checking it agrees with
    /// [`Table::kind_for_tag`] whenever that tag is one of the registered
    /// structural kinds. Replaces any existing entry for the same tag.
    pub fn insert(&mut self, tag: Tag, table: Table) -> Result<()> {
        let expected = Table::kind_for_tag(tag);
        if expected != TableKind::Opaque && table.kind() != expected {
            return Err(FontError::CountMismatch("table variant does not match its tag's registered kind"));
        }
        if let Some(existing) = self.tables.iter_mut().find(|(t, _)| *t == tag) {
            existing.1 = table;
        } else {
            self.tables.push((tag, table));
        }
        Ok(())
    }

    pub fn remove(&mut self, tag: Tag) -> Option<Table> {
        let index = self.tables.iter().position(|(t, _)| *t == tag)?;
        Some(self.tables.remove(index).1)
    }

    pub fn as_head(&self) -> Option<&HeadTable> {
        self.get(tag::HEAD).and_then(Table::as_head)
    }

    // ------------------------------------------------------------------
    // Parsing
    // ------------------------------------------------------------------

    /// Parses a font from any supported container. `font_index` selects a
    /// member font when `bytes` is a `ttcf` or WOFF2-wrapped collection and
    /// is otherwise ignored; its absence for a collection container is
    /// `FontError::MissingFontIndex`.
    pub fn parse(bytes: &[u8], configs: Option<SfntConfigs>, font_index: Option<u32>) -> Result<Font> {
        let span = tracing::info_span!("font_parse", bytes = bytes.len());
        let _enter = span.enter();
        let configs = configs.unwrap_or_default();

        let result = Self::parse_inner(bytes, &configs, font_index);
        if let Err(ref e) = result {
            tracing::warn!(error = %e, "font parse failed");
        }
        result
    }

    fn parse_inner(bytes: &[u8], configs: &SfntConfigs, font_index: Option<u32>) -> Result<Font> {
        if bytes.len() < 4 {
            return Err(FontError::EndOfStream { wanted: 4, available: bytes.len() });
        }
        let leading = u32::from_be_bytes(bytes[0..4].try_into().unwrap());
        let file_tag = FileTag::sniff(leading)?;

        match file_tag {
            FileTag::Sfnt(_) => {
                let reader = XtfReader::new(Rc::new(bytes.to_vec()), 0, None)?;
                let mut font = Self::from_tags(reader.sfnt_version(), reader.table_tags(), |tag| reader.get_table(configs, tag))?;
                font.verify_checksum_adjustment(configs)?;
                Ok(font)
            }
            FileTag::Ttc => {
                let index = font_index.ok_or(FontError::MissingFontIndex)?;
                let collection = XtfCollectionReader::new(bytes.to_vec())?;
                let num_fonts = collection.num_fonts();
                let reader = collection
                    .font_reader(index as usize)
                    .ok_or(FontError::FontIndexOutOfRange { index, num_fonts })?;
                Self::from_tags(reader.sfnt_version(), reader.table_tags(), |tag| reader.get_table(configs, tag))
            }
            FileTag::Woff => {
                let reader = WoffReader::new(bytes.to_vec())?;
                let mut font = Self::from_tags(reader.sfnt_version(), reader.table_tags(), |tag| reader.get_table(configs, tag))?;
                font.woff_payload = Some(reader.read_woff_payload()?);
                font.verify_checksum_adjustment(configs)?;
                Ok(font)
            }
            FileTag::Woff2 => {
                let (header, _) = Woff2Header::parse(bytes)?;
                match header.flavor {
                    Woff2Flavor::Sfnt(_) => {
                        let reader = Woff2Reader::new(bytes)?;
                        let mut font =
                            Self::from_tags(reader.sfnt_version(), reader.table_tags(), |tag| reader.get_table(configs, tag))?;
                        font.woff_payload = Some(reader.read_woff_payload());
                        font.verify_checksum_adjustment(configs)?;
                        Ok(font)
                    }
                    Woff2Flavor::Ttc => {
                        let index = font_index.ok_or(FontError::MissingFontIndex)?;
                        let collection = Woff2CollectionReader::new(bytes)?;
                        let num_fonts = collection.num_fonts() as u32;
                        let reader = collection
                            .font_reader(index as usize)
                            .ok_or(FontError::FontIndexOutOfRange { index, num_fonts })?;
                        let mut font =
                            Self::from_tags(reader.sfnt_version(), reader.table_tags(), |tag| reader.get_table(configs, tag))?;
                        font.woff_payload = Some(collection.read_woff_payload());
                        Ok(font)
                    }
                }
            }
        }
    }

    pub(crate) fn from_tags(
        sfnt_version: SfntVersion,
        tags: Vec<Tag>,
        mut get_table: impl FnMut(Tag) -> Result<Table>,
    ) -> Result<Font> {
        let mut tables = Vec::with_capacity(tags.len());
        for tag in tags {
            tables.push((tag, get_table(tag)?));
        }
        Ok(Font { sfnt_version, woff_payload: None, tables })
    }

    /// Convenience wrapper reading the whole file into memory before
    /// parsing.
    pub fn load<P: AsRef<std::path::Path>>(
        path: P,
        configs: Option<SfntConfigs>,
        font_index: Option<u32>,
    ) -> Result<Font> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes, configs, font_index)
    }

    // ------------------------------------------------------------------
    // Checksum adjustment
    // ------------------------------------------------------------------

    /// Re-derives `head.checksumAdjustment` from this font's current
    /// tables and compares it to the value actually stored in `head`.
    /// Only meaningful for a font parsed outside a collection (collection
    /// members share table bytes across fonts, which this crate does not
    /// attempt to reconstruct a shared directory for).
    fn verify_checksum_adjustment(&self, configs: &SfntConfigs) -> Result<()> {
        if !configs.verify_checksum {
            return Ok(());
        }
        let Some(actual_head) = self.as_head() else { return Ok(()) };
        let (_, derived_head) = self.derive_checksum_adjustment(configs)?;
        if derived_head.checksum_adjustment != actual_head.checksum_adjustment {
            return Err(FontError::BadChecksum("head.checksumAdjustment"));
        }
        Ok(())
    }

    /// Runs the update/dump phases needed to (re)compute `head`'s derived
    /// fields and `checksumAdjustment`: `head.update` from `glyf`,
    /// `hhea`/`vhea.update` from the paired metrics table, `loca`
    /// regenerated from a fresh `glyf.dump`, then the standard two-phase
    /// dump ordering from the `head`/`loca` cycle. Returns every other
    /// table's final bytes (sorted by tag) plus the finalized `head`.
    fn derive_checksum_adjustment(&self, configs: &SfntConfigs) -> Result<(Vec<(Tag, Vec<u8>)>, HeadTable)> {
        let mut working = self.tables.clone();

        let glyf_snapshot = working.iter().find(|(t, _)| *t == tag::GLYF).and_then(|(_, tb)| tb.as_glyf().cloned());
        let has_glyf = glyf_snapshot.is_some();

        if let Some(idx) = working.iter().position(|(t, _)| *t == tag::HEAD) {
            if let Table::Head(h) = &mut working[idx].1 {
                h.update(glyf_snapshot.as_ref(), has_glyf)?;
            }
        }
        if let Some(hmtx) = working.iter().find(|(t, _)| *t == tag::HMTX).and_then(|(_, tb)| tb.as_hmtx().cloned()) {
            if let Some(idx) = working.iter().position(|(t, _)| *t == tag::HHEA) {
                if let Table::Hhea(h) = &mut working[idx].1 {
                    match &glyf_snapshot {
                        Some(glyf) => h.update_with_glyf(&hmtx, glyf),
                        None => h.update(&hmtx),
                    }
                }
            }
        }
        if let Some(vmtx) = working.iter().find(|(t, _)| *t == tag::VMTX).and_then(|(_, tb)| tb.as_hmtx().cloned()) {
            if let Some(idx) = working.iter().position(|(t, _)| *t == tag::VHEA) {
                if let Table::Vhea(h) = &mut working[idx].1 {
                    match &glyf_snapshot {
                        Some(glyf) => h.update_with_glyf(&vmtx, glyf),
                        None => h.update(&vmtx),
                    }
                }
            }
        }
        if let Some(glyf) = &glyf_snapshot {
            let (_, new_loca) = glyf.dump(configs)?;
            if let Some(idx) = working.iter().position(|(t, _)| *t == tag::LOCA) {
                working[idx].1 = Table::Loca(new_loca);
            }
        }

        let mut head = working
            .iter()
            .find(|(t, _)| *t == tag::HEAD)
            .and_then(|(_, tb)| tb.as_head().cloned())
            .ok_or(FontError::MissingDependency("font", "head"))?;

        let mut records = Vec::with_capacity(working.len());
        for (t, table) in &working {
            if *t == tag::HEAD {
                continue;
            }
            let bytes = if *t == tag::LOCA {
                let loca = table.as_loca().ok_or(FontError::MissingDependency("font", "loca"))?;
                loca.dump(configs, &mut head)?
            } else {
                dump_table_bytes(table, configs)?
            };
            records.push((*t, bytes));
        }

        let sum_of_others =
            records.iter().fold(0u32, |acc, (_, bytes)| acc.wrapping_add(calculate_checksum(bytes)));

        let head_zero_bytes = head.dump(0);
        let head_zero_checksum = calculate_checksum(&head_zero_bytes);

        let mut zeroed_head_records = records.clone();
        zeroed_head_records.push((tag::HEAD, head_zero_bytes));
        zeroed_head_records.sort_by_key(|(t, _)| *t);
        let (_, directory_checksum) = SfntDirectory::dump(self.sfnt_version, &zeroed_head_records);

        let total = sum_of_others.wrapping_add(head_zero_checksum).wrapping_add(directory_checksum);
        head.checksum_adjustment = calculate_checksum_adjustment(total);

        records.sort_by_key(|(t, _)| *t);
        Ok((records, head))
    }

    // ------------------------------------------------------------------
    // Dumping
    // ------------------------------------------------------------------

    pub fn dump_sfnt(&self, configs: &SfntConfigs) -> Result<Vec<u8>> {
        let (mut records, head) = self.derive_checksum_adjustment(configs)?;
        records.push((tag::HEAD, head.dump(head.checksum_adjustment)));
        records.sort_by_key(|(t, _)| *t);
        let (bytes, _) = SfntDirectory::dump(self.sfnt_version, &records);
        Ok(bytes)
    }

    pub fn dump_woff(&self, configs: &SfntConfigs) -> Result<Vec<u8>> {
        let (mut records, head) = self.derive_checksum_adjustment(configs)?;
        records.push((tag::HEAD, head.dump(head.checksum_adjustment)));
        records.sort_by_key(|(t, _)| *t);

        let total_sfnt_size = {
            let (bytes, _) = SfntDirectory::dump(self.sfnt_version, &records);
            bytes.len() as u32
        };

        let mut tables = Vec::with_capacity(records.len());
        for (t, bytes) in &records {
            let orig_checksum = calculate_checksum(bytes);
            let orig_length = bytes.len() as u32;
            #[cfg(feature = "z")]
            let stored = {
                let compressed = woff1::deflate_table(bytes);
                if compressed.len() < bytes.len() { compressed } else { bytes.clone() }
            };
            #[cfg(not(feature = "z"))]
            let stored = bytes.clone();
            tables.push((*t, stored, orig_checksum, orig_length));
        }

        let meta_orig_length = self.woff_payload.as_ref().and_then(|p| p.metadata.as_ref()).map(|m| m.len() as u32).unwrap_or(0);
        #[cfg(feature = "z")]
        let metadata = self.woff_payload.as_ref().and_then(|p| p.metadata.as_ref()).map(|m| woff1::deflate_table(m));
        #[cfg(not(feature = "z"))]
        let metadata = self.woff_payload.as_ref().and_then(|p| p.metadata.clone());
        let private_data = self.woff_payload.as_ref().and_then(|p| p.private_data.clone());
        let (major_version, minor_version) =
            self.woff_payload.as_ref().map(|p| (p.major_version, p.minor_version)).unwrap_or((1, 0));

        Ok(WoffHeader::dump(
            self.sfnt_version,
            major_version,
            minor_version,
            total_sfnt_size,
            &tables,
            metadata.as_deref(),
            meta_orig_length,
            private_data.as_deref(),
        ))
    }

    /// Writes a WOFF2 blob. `glyf`/`loca` are always emitted through the
    /// transform (matching the default encoder policy described for the
    /// transform's own codec); every other table is stored untransformed
    /// even when a generic transform would apply, since this crate's
    /// `hmtx` transform encoder exists to exercise the decode path
    /// symmetrically rather than to shrink what this writer emits.
    pub fn dump_woff2(&self, configs: &SfntConfigs) -> Result<Vec<u8>> {
        let (mut records, head) = self.derive_checksum_adjustment(configs)?;
        records.push((tag::HEAD, head.dump(head.checksum_adjustment)));
        records.sort_by_key(|(t, _)| *t);

        let total_sfnt_size = {
            let (bytes, _) = SfntDirectory::dump(self.sfnt_version, &records);
            bytes.len() as u32
        };

        let glyf_live = self.get(tag::GLYF).and_then(Table::as_glyf);

        let mut entries = Vec::with_capacity(records.len());
        let mut blob = Vec::new();
        for (t, bytes) in &records {
            if *t == tag::GLYF {
                let glyf = glyf_live.ok_or(FontError::MissingDependency("woff2", "glyf"))?;
                let transformed = glyf_loca::encode(glyf)?;
                entries.push(Woff2TableDirectoryEntry {
                    tag: *t,
                    transform_version: TransformVersion::Version0,
                    orig_length: bytes.len() as u32,
                    transform_length: Some(transformed.len() as u32),
                });
                blob.extend_from_slice(&transformed);
                continue;
            }
            if *t == tag::LOCA {
                entries.push(Woff2TableDirectoryEntry {
                    tag: *t,
                    transform_version: TransformVersion::Version0,
                    orig_length: bytes.len() as u32,
                    transform_length: Some(0),
                });
                continue;
            }
            entries.push(Woff2TableDirectoryEntry {
                tag: *t,
                transform_version: TransformVersion::Version0,
                orig_length: bytes.len() as u32,
                transform_length: None,
            });
            blob.extend_from_slice(bytes);
        }

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
            Woff2Flavor::Sfnt(self.sfnt_version),
            major_version,
            minor_version,
            total_sfnt_size,
            &entries,
            None,
            &compressed,
            metadata.as_deref(),
            meta_orig_length,
            private_data.as_deref(),
        ))
    }
}

/// Dumps any non-`head`, non-`loca` table variant. `loca` needs a mutable
/// `head` to write its chosen format back into, so its caller handles that
/// tag directly rather than routing it through here.
fn dump_table_bytes(table: &Table, configs: &SfntConfigs) -> Result<Vec<u8>> {
    match table {
        Table::Head(h) => Ok(h.dump(h.checksum_adjustment)),
        Table::Maxp(m) => Ok(m.dump()),
        Table::Hhea(h) | Table::Vhea(h) => Ok(h.dump()),
        Table::Hmtx(h) | Table::Vmtx(h) => Ok(h.dump()),
        Table::Loca(_) => Err(FontError::MissingDependency("font", "head")),
        Table::Glyf(g) => g.dump(configs).map(|(bytes, _)| bytes),
        Table::Dsig(d) => Ok(d.dump()),
        Table::Cff(c) | Table::Cff2(c) => Ok(c.dump()),
        Table::Opaque(o) => Ok(o.dump()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::glyf::{GlyfTable, GlyphSlot};
    use crate::tables::hhea::HheaTable;
    use crate::tables::hmtx::{HmtxTable, LongHoriMetric};
    use crate::tables::loca::LocaTable;
    use crate::tables::maxp::MaxpTable;

    fn truetype_font() -> Font {
        let mut font = Font::new(SfntVersion::TrueType);
        font.insert(tag::HEAD, Table::Head(HeadTable::default())).unwrap();
        font.insert(
            tag::MAXP,
            Table::Maxp(MaxpTable { num_glyphs: 1, true_type_maxima: Some(Default::default()) }),
        )
        .unwrap();
        font.insert(tag::HHEA, Table::Hhea(HheaTable { num_hori_metrics: 1, ..Default::default() })).unwrap();
        font.insert(
            tag::HMTX,
            Table::Hmtx(HmtxTable {
                long_metrics: vec![LongHoriMetric { advance_width: 500, left_side_bearing: 0 }],
                trailing_left_side_bearings: vec![],
            }),
        )
        .unwrap();
        font.insert(tag::LOCA, Table::Loca(LocaTable { offsets: vec![0, 0] })).unwrap();
        font.insert(tag::GLYF, Table::Glyf(GlyfTable { glyphs: vec![GlyphSlot::Empty] })).unwrap();
        font
    }

    #[test]
    fn insert_rejects_mismatched_kind() {
        let mut font = Font::new(SfntVersion::TrueType);
        let err = font.insert(tag::HEAD, Table::Maxp(MaxpTable::default()));
        assert!(err.is_err());
    }

    #[test]
    fn insert_allows_opaque_under_unregistered_tag() {
        let mut font = Font::new(SfntVersion::TrueType);
        let tag = Tag::parse(*b"name").unwrap();
        font.insert(tag, Table::Opaque(crate::tables::default::OpaqueTable::parse(b"hi"))).unwrap();
        assert!(font.get(tag).is_some());
    }

    #[test]
    fn dump_sfnt_roundtrips_through_parse() {
        let font = truetype_font();
        let configs = SfntConfigs::default();
        let bytes = font.dump_sfnt(&configs).unwrap();
        let parsed = Font::parse(&bytes, Some(configs), None).unwrap();
        assert_eq!(parsed.sfnt_version, SfntVersion::TrueType);
        assert_eq!(parsed.get(tag::MAXP), font.get(tag::MAXP));
    }

    #[test]
    fn dump_woff_roundtrips_through_parse() {
        let font = truetype_font();
        let configs = SfntConfigs::default();
        let bytes = font.dump_woff(&configs).unwrap();
        let parsed = Font::parse(&bytes, Some(configs), None).unwrap();
        assert_eq!(parsed.get(tag::HHEA), font.get(tag::HHEA));
    }

    #[cfg(feature = "brotli")]
    #[test]
    fn dump_woff2_roundtrips_through_parse() {
        let font = truetype_font();
        let configs = SfntConfigs::default();
        let bytes = font.dump_woff2(&configs).unwrap();
        let parsed = Font::parse(&bytes, Some(configs), None).unwrap();
        assert_eq!(parsed.get(tag::MAXP), font.get(tag::MAXP));
        // WOFF2 doesn't preserve head's own adjustment byte-for-byte intent
        // beyond the structural fields this test already checked via maxp.
    }

    #[test]
    fn load_reads_a_font_from_disk() {
        let font = truetype_font();
        let configs = SfntConfigs::default();
        let bytes = font.dump_sfnt(&configs).unwrap();

        let mut path = tempfile::NamedTempFile::new().unwrap();
        use std::io::Write;
        path.write_all(&bytes).unwrap();

        let loaded = Font::load(path.path(), Some(configs), None).unwrap();
        assert_eq!(loaded.get(tag::MAXP), font.get(tag::MAXP));
    }
}
