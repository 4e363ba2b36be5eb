//! The reader orchestrator: resolves a table's parse-time dependencies,
//! caches parsed tables per font and (for collections) across fonts that
//! share the same underlying bytes, and verifies checksums as it goes.
//!
//! Every container format (`XtfReader`/`XtfCollectionReader` for plain
//! SFNT/TTC, `WoffReader` for WOFF 1.0, `Woff2Reader`/`Woff2CollectionReader`
//! for WOFF2) only has to answer "what are this font's table tags" and
//! "give me tag X's stored bytes and expected checksum"; [`get_or_parse_table`]
//! does the rest, including resolving a table's dependencies by recursing
//! on itself.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::checksum::calculate_checksum;
use crate::config::SfntConfigs;
use crate::container::sfnt::{SfntDirectory, TtcHeader};
use crate::container::woff1::{self, WoffHeader};
use crate::container::woff2::{self, Woff2CollectionDirectory, Woff2Flavor, Woff2Header, Woff2TableDirectoryEntry};
use crate::error::{FontError, Result};
use crate::payload::WoffPayload;
use crate::tables::dsig::DsigTable;
use crate::tables::glyf::GlyfTable;
use crate::tables::head::HeadTable;
use crate::tables::hmtx::HmtxTable;
use crate::tables::loca::LocaTable;
use crate::tables::maxp::MaxpTable;
use crate::tables::{Table, TableKind};
use crate::tag::{self, SfntVersion, Tag};
use crate::transform::{glyf_loca, hmtx as hmtx_transform};

/// Tables sharing `(tag, byte_offset)` identity across the member fonts of
/// one collection are parsed once and looked up by every font that
/// references them, avoiding duplicate work. Shared across every reader
/// opened against the same collection.
pub type CollectionCache = Rc<RefCell<HashMap<(Tag, u32), (Table, u32)>>>;

/// Per-font cache plus an optional handle on the collection-wide one.
struct TableCache {
    per_reader: RefCell<HashMap<Tag, (Table, u32)>>,
    collection: Option<CollectionCache>,
}

impl TableCache {
    fn new(collection: Option<CollectionCache>) -> Self {
        TableCache { per_reader: RefCell::new(HashMap::new()), collection }
    }
}

/// What a concrete container format must supply so [`get_or_parse_table`]
/// can do the rest. `byte_offset` only needs to be meaningful (and unique
/// per distinct table instance) when the reader is part of a collection;
/// standalone readers can return a constant.
pub trait TableSource {
    fn read_table_data_and_expected_checksum(&self, tag: Tag) -> Result<(Vec<u8>, Option<u32>)>;
    fn table_byte_offset(&self, tag: Tag) -> u32;

    /// Runs before the generic cache-miss path. A format whose encoding
    /// doesn't let a table be decoded in isolation (WOFF2's transformed
    /// `glyf`/`loca`/`hmtx`) installs the result directly into the given
    /// cache here instead of answering
    /// `read_table_data_and_expected_checksum` for that tag.
    fn before_parse(&self, _tag: Tag, _cache: &TableCache, _configs: &SfntConfigs) -> Result<()> {
        Ok(())
    }
}

fn install(cache: &TableCache, is_collection: bool, tag: Tag, offset: u32, table: Table, checksum: u32) {
    cache.per_reader.borrow_mut().insert(tag, (table.clone(), checksum));
    if is_collection {
        if let Some(cc) = &cache.collection {
            cc.borrow_mut().insert((tag, offset), (table, checksum));
        }
    }
}

/// Parses (or returns the cached copy of) the table named by `tag`,
/// resolving whatever other tables it structurally depends on by calling
/// itself again. This is the one place the dependency graph between
/// `head`/`maxp`/`hhea`/`hmtx`/`loca`/`glyf` is actually walked.
pub fn get_or_parse_table(
    source: &dyn TableSource,
    cache: &TableCache,
    configs: &SfntConfigs,
    tag: Tag,
) -> Result<Table> {
    if let Some((table, _)) = cache.per_reader.borrow().get(&tag) {
        return Ok(table.clone());
    }

    source.before_parse(tag, cache, configs)?;
    if let Some((table, _)) = cache.per_reader.borrow().get(&tag) {
        return Ok(table.clone());
    }

    let is_collection = cache.collection.is_some();
    let offset = source.table_byte_offset(tag);

    if is_collection {
        let hit = cache.collection.as_ref().and_then(|cc| cc.borrow().get(&(tag, offset)).cloned());
        if let Some((table, checksum)) = hit {
            let table = if configs.share_tables { table } else { deep_copy(&table) };
            cache.per_reader.borrow_mut().insert(tag, (table.clone(), checksum));
            return Ok(table);
        }
    }

    let (data, expected_checksum) = source.read_table_data_and_expected_checksum(tag)?;

    let checksum = if configs.verify_checksum { calculate_checksum(&data) } else { 0 };
    if configs.verify_checksum {
        if let Some(expected) = expected_checksum {
            if checksum != expected {
                return Err(FontError::BadChecksum(tag_name(tag)));
            }
        }
    }

    let table = parse_table(source, cache, configs, tag, &data)?;
    install(cache, is_collection, tag, offset, table.clone(), checksum);
    Ok(table)
}

/// `FontError::BadChecksum` wants a `&'static str`; the handful of tags this
/// crate resolves structurally get their real name, everything else a
/// generic label (the tag is still visible in whatever logged the read).
fn tag_name(tag: Tag) -> &'static str {
    match tag {
        t if t == tag::HEAD => "head",
        t if t == tag::MAXP => "maxp",
        t if t == tag::HHEA => "hhea",
        t if t == tag::VHEA => "vhea",
        t if t == tag::HMTX => "hmtx",
        t if t == tag::VMTX => "vmtx",
        t if t == tag::LOCA => "loca",
        t if t == tag::GLYF => "glyf",
        t if t == tag::DSIG => "DSIG",
        _ => "table",
    }
}

fn deep_copy(table: &Table) -> Table {
    table.clone()
}

fn parse_table(
    source: &dyn TableSource,
    cache: &TableCache,
    configs: &SfntConfigs,
    tag: Tag,
    data: &[u8],
) -> Result<Table> {
    match Table::kind_for_tag(tag) {
        TableKind::Head => Ok(Table::Head(HeadTable::parse(data)?)),
        TableKind::Maxp => Ok(Table::Maxp(MaxpTable::parse(data)?)),
        TableKind::Hhea => Ok(Table::Hhea(crate::tables::hhea::HheaTable::parse(data)?)),
        TableKind::Vhea => Ok(Table::Vhea(crate::tables::hhea::HheaTable::parse(data)?)),
        TableKind::Hmtx => {
            let hhea = get_or_parse_table(source, cache, configs, tag::HHEA)?;
            let maxp = get_or_parse_table(source, cache, configs, tag::MAXP)?;
            let hhea = hhea.as_hhea().ok_or(FontError::MissingDependency("hmtx", "hhea"))?;
            let maxp = maxp.as_maxp().ok_or(FontError::MissingDependency("hmtx", "maxp"))?;
            Ok(Table::Hmtx(HmtxTable::parse(data, hhea.num_hori_metrics, maxp.num_glyphs)?))
        }
        TableKind::Vmtx => {
            let vhea = get_or_parse_table(source, cache, configs, tag::VHEA)?;
            let maxp = get_or_parse_table(source, cache, configs, tag::MAXP)?;
            let vhea = vhea.as_hhea().ok_or(FontError::MissingDependency("vmtx", "vhea"))?;
            let maxp = maxp.as_maxp().ok_or(FontError::MissingDependency("vmtx", "maxp"))?;
            Ok(Table::Vmtx(HmtxTable::parse(data, vhea.num_hori_metrics, maxp.num_glyphs)?))
        }
        TableKind::Loca => {
            let maxp = get_or_parse_table(source, cache, configs, tag::MAXP)?;
            let head = get_or_parse_table(source, cache, configs, tag::HEAD)?;
            let maxp = maxp.as_maxp().ok_or(FontError::MissingDependency("loca", "maxp"))?;
            let head = head.as_head().ok_or(FontError::MissingDependency("loca", "head"))?;
            Ok(Table::Loca(LocaTable::parse(data, maxp, head)?))
        }
        TableKind::Glyf => {
            let loca = get_or_parse_table(source, cache, configs, tag::LOCA)?;
            let loca = loca.as_loca().ok_or(FontError::MissingDependency("glyf", "loca"))?;
            Ok(Table::Glyf(GlyfTable::parse(data, loca)?))
        }
        TableKind::Dsig => Ok(Table::Dsig(DsigTable::parse(data)?)),
        TableKind::Cff => Ok(Table::Cff(crate::tables::CffTable::parse(data))),
        TableKind::Cff2 => Ok(Table::Cff2(crate::tables::CffTable::parse(data))),
        TableKind::Opaque => Ok(Table::Opaque(crate::tables::default::OpaqueTable::parse(data))),
    }
}

// ---------------------------------------------------------------------
// Plain SFNT / TrueType Collection
// ---------------------------------------------------------------------

/// A single font read directly out of a plain SFNT (or one member of a
/// TTC, sharing the collection's byte pool).
pub struct XtfReader {
    data: Rc<Vec<u8>>,
    directory: SfntDirectory,
    cache: TableCache,
}

impl XtfReader {
    pub fn new(data: Rc<Vec<u8>>, directory_offset: usize, collection: Option<CollectionCache>) -> Result<Self> {
        let directory = SfntDirectory::parse(&data, directory_offset)?;
        Ok(XtfReader { data, directory, cache: TableCache::new(collection) })
    }

    pub fn sfnt_version(&self) -> SfntVersion {
        self.directory.version
    }

    pub fn table_tags(&self) -> Vec<Tag> {
        self.directory.records.iter().map(|r| r.tag).collect()
    }

    pub fn get_table(&self, configs: &SfntConfigs, tag: Tag) -> Result<Table> {
        get_or_parse_table(self, &self.cache, configs, tag)
    }
}

impl TableSource for XtfReader {
    fn read_table_data_and_expected_checksum(&self, tag: Tag) -> Result<(Vec<u8>, Option<u32>)> {
        let record = self
            .directory
            .records
            .iter()
            .find(|r| r.tag == tag)
            .ok_or(FontError::MissingDependency("font", "table"))?;
        let start = record.offset as usize;
        let end = start + record.length as usize;
        let data = self
            .data
            .get(start..end)
            .ok_or(FontError::EndOfStream { wanted: record.length as usize, available: self.data.len() })?;
        Ok((data.to_vec(), Some(record.checksum)))
    }

    fn table_byte_offset(&self, tag: Tag) -> u32 {
        self.directory.records.iter().find(|r| r.tag == tag).map(|r| r.offset).unwrap_or(0)
    }
}

/// A TrueType Collection: one shared byte pool, several `XtfReader`s (one
/// per member font) that share a [`CollectionCache`] so tables referenced
/// by more than one font's directory are only ever parsed once.
pub struct XtfCollectionReader {
    pub ttc: TtcHeader,
    readers: Vec<XtfReader>,
}

impl XtfCollectionReader {
    pub fn new(data: Vec<u8>) -> Result<Self> {
        let ttc = TtcHeader::parse(&data)?;
        let data = Rc::new(data);
        let collection_cache: CollectionCache = Rc::new(RefCell::new(HashMap::new()));
        let mut readers = Vec::with_capacity(ttc.font_offsets.len());
        for &offset in &ttc.font_offsets {
            readers.push(XtfReader::new(Rc::clone(&data), offset as usize, Some(Rc::clone(&collection_cache)))?);
        }
        Ok(XtfCollectionReader { ttc, readers })
    }

    pub fn num_fonts(&self) -> usize {
        self.readers.len()
    }

    pub fn font_reader(&self, index: usize) -> Option<&XtfReader> {
        self.readers.get(index)
    }
}

// ---------------------------------------------------------------------
// WOFF 1.0
// ---------------------------------------------------------------------

pub struct WoffReader {
    data: Vec<u8>,
    header: WoffHeader,
    cache: TableCache,
}

impl WoffReader {
    pub fn new(data: Vec<u8>) -> Result<Self> {
        let header = WoffHeader::parse(&data)?;
        Ok(WoffReader { data, header, cache: TableCache::new(None) })
    }

    pub fn sfnt_version(&self) -> SfntVersion {
        self.header.flavor
    }

    pub fn table_tags(&self) -> Vec<Tag> {
        self.header.entries.iter().map(|e| e.tag).collect()
    }

    pub fn get_table(&self, configs: &SfntConfigs, tag: Tag) -> Result<Table> {
        get_or_parse_table(self, &self.cache, configs, tag)
    }

    pub fn read_woff_payload(&self) -> Result<WoffPayload> {
        let metadata = if self.header.meta_length > 0 {
            let start = self.header.meta_offset as usize;
            let end = start + self.header.meta_length as usize;
            let raw = self.data.get(start..end).ok_or(FontError::EndOfStream {
                wanted: self.header.meta_length as usize,
                available: self.data.len(),
            })?;
            #[cfg(feature = "z")]
            {
                Some(woff1::inflate_table(raw, self.header.meta_orig_length)?)
            }
            #[cfg(not(feature = "z"))]
            {
                Some(raw.to_vec())
            }
        } else {
            None
        };
        let private_data = if self.header.priv_length > 0 {
            let start = self.header.priv_offset as usize;
            let end = start + self.header.priv_length as usize;
            Some(
                self.data
                    .get(start..end)
                    .ok_or(FontError::EndOfStream {
                        wanted: self.header.priv_length as usize,
                        available: self.data.len(),
                    })?
                    .to_vec(),
            )
        } else {
            None
        };
        Ok(WoffPayload {
            major_version: self.header.major_version,
            minor_version: self.header.minor_version,
            metadata,
            private_data,
        })
    }
}

impl TableSource for WoffReader {
    fn read_table_data_and_expected_checksum(&self, tag: Tag) -> Result<(Vec<u8>, Option<u32>)> {
        let entry = self
            .header
            .entries
            .iter()
            .find(|e| e.tag == tag)
            .ok_or(FontError::MissingDependency("font", "table"))?;
        let raw = self.header.raw_table_bytes(&self.data, entry)?;
        let data = if entry.comp_length == entry.orig_length {
            raw.to_vec()
        } else {
            #[cfg(feature = "z")]
            {
                woff1::inflate_table(raw, entry.orig_length)?
            }
            #[cfg(not(feature = "z"))]
            {
                return Err(FontError::Decompress("woff table zlib stream (feature \"z\" disabled)"));
            }
        };
        Ok((data, Some(entry.orig_checksum)))
    }

    fn table_byte_offset(&self, tag: Tag) -> u32 {
        self.header.entries.iter().find(|e| e.tag == tag).map(|e| e.offset).unwrap_or(0)
    }
}

// ---------------------------------------------------------------------
// WOFF2
// ---------------------------------------------------------------------

/// One font's worth of WOFF2 table directory entries, each paired with its
/// already brotli-decompressed (but not yet further transform-decoded)
/// bytes.
struct Woff2Tables {
    entries: Vec<Woff2TableDirectoryEntry>,
    bytes: HashMap<Tag, Vec<u8>>,
}

fn slice_woff2_tables(entries: &[Woff2TableDirectoryEntry], uncompressed: &[u8]) -> Result<Woff2Tables> {
    let mut bytes = HashMap::with_capacity(entries.len());
    let mut offset = 0usize;
    for entry in entries {
        let len = entry.stored_length() as usize;
        let end = offset + len;
        let slice = uncompressed
            .get(offset..end)
            .ok_or(FontError::MalformedTransform("woff2 decompressed stream shorter than directory implies"))?;
        bytes.insert(entry.tag, slice.to_vec());
        offset = end;
    }
    Ok(Woff2Tables { entries: entries.to_vec(), bytes })
}

/// Brotli-decompresses `header`'s metadata block (if any) and copies out its
/// raw private-data block (if any). Shared by the single-font and
/// collection WOFF2 readers, since both blocks live outside the compressed
/// table stream at the same header-relative offsets.
fn extract_woff2_payload(data: &[u8], header: &Woff2Header) -> Result<WoffPayload> {
    let metadata = if header.meta_length > 0 {
        let start = header.meta_offset as usize;
        let end = start + header.meta_length as usize;
        let raw = data.get(start..end).ok_or(FontError::EndOfStream {
            wanted: header.meta_length as usize,
            available: data.len(),
        })?;
        #[cfg(feature = "brotli")]
        {
            Some(woff2::decompress(raw, header.meta_orig_length as usize)?)
        }
        #[cfg(not(feature = "brotli"))]
        {
            Some(raw.to_vec())
        }
    } else {
        None
    };
    let private_data = if header.priv_length > 0 {
        let start = header.priv_offset as usize;
        let end = start + header.priv_length as usize;
        Some(
            data.get(start..end)
                .ok_or(FontError::EndOfStream { wanted: header.priv_length as usize, available: data.len() })?
                .to_vec(),
        )
    } else {
        None
    };
    Ok(WoffPayload { major_version: header.major_version, minor_version: header.minor_version, metadata, private_data })
}

pub struct Woff2Reader {
    header: Woff2Header,
    tables: Woff2Tables,
    payload: WoffPayload,
    cache: TableCache,
}

impl Woff2Reader {
    pub fn new(data: &[u8]) -> Result<Self> {
        let (header, directory_end) = Woff2Header::parse(data)?;
        if matches!(header.flavor, Woff2Flavor::Ttc) {
            return Err(FontError::UnsupportedContainer(header.flavor.value()));
        }
        let compressed_start = directory_end;
        let compressed = data.get(compressed_start..compressed_start + header.total_compressed_size as usize).ok_or(
            FontError::EndOfStream { wanted: header.total_compressed_size as usize, available: data.len() },
        )?;
        #[cfg(feature = "brotli")]
        let uncompressed = woff2::decompress(compressed, header.total_sfnt_size as usize)?;
        #[cfg(not(feature = "brotli"))]
        let uncompressed: Vec<u8> = {
            let _ = compressed;
            return Err(FontError::Decompress("woff2 brotli stream (feature \"brotli\" disabled)"));
        };
        let tables = slice_woff2_tables(&header.entries, &uncompressed)?;
        let payload = extract_woff2_payload(data, &header)?;
        Ok(Woff2Reader { header, tables, payload, cache: TableCache::new(None) })
    }

    pub fn sfnt_version(&self) -> SfntVersion {
        match self.header.flavor {
            Woff2Flavor::Sfnt(v) => v,
            Woff2Flavor::Ttc => unreachable!("Woff2Reader::new rejects a ttcf-flavored header"),
        }
    }

    pub fn table_tags(&self) -> Vec<Tag> {
        self.tables.entries.iter().map(|e| e.tag).collect()
    }

    pub fn get_table(&self, configs: &SfntConfigs, tag: Tag) -> Result<Table> {
        get_or_parse_table(self, &self.cache, configs, tag)
    }

    pub fn read_woff_payload(&self) -> WoffPayload {
        self.payload.clone()
    }

    fn entry_for(&self, tag: Tag) -> Option<&Woff2TableDirectoryEntry> {
        self.tables.entries.iter().find(|e| e.tag == tag)
    }
}

fn materialize_glyf_loca(
    source: &dyn TableSource,
    cache: &TableCache,
    configs: &SfntConfigs,
    tables: &Woff2Tables,
) -> Result<()> {
    if cache.per_reader.borrow().contains_key(&tag::GLYF) {
        return Ok(());
    }
    let Some(glyf_bytes) = tables.bytes.get(&tag::GLYF) else { return Ok(()) };
    let (glyf, loca) = glyf_loca::decode(glyf_bytes)?;
    install(cache, false, tag::GLYF, source.table_byte_offset(tag::GLYF), Table::Glyf(glyf), 0);
    install(cache, false, tag::LOCA, source.table_byte_offset(tag::LOCA), Table::Loca(loca), 0);
    let _ = configs;
    Ok(())
}

fn materialize_transformed_hmtx(
    source: &dyn TableSource,
    cache: &TableCache,
    configs: &SfntConfigs,
    tables: &Woff2Tables,
    tag: Tag,
    hhea_tag: Tag,
) -> Result<()> {
    if cache.per_reader.borrow().contains_key(&tag) {
        return Ok(());
    }
    let Some(data) = tables.bytes.get(&tag) else { return Ok(()) };
    let hhea = get_or_parse_table(source, cache, configs, hhea_tag)?;
    let maxp = get_or_parse_table(source, cache, configs, tag::MAXP)?;
    let glyf = get_or_parse_table(source, cache, configs, tag::GLYF)?;
    let hhea = hhea.as_hhea().ok_or(FontError::MissingDependency("hmtx", "hhea"))?;
    let maxp = maxp.as_maxp().ok_or(FontError::MissingDependency("hmtx", "maxp"))?;
    let glyf = glyf.as_glyf().ok_or(FontError::MissingDependency("hmtx", "glyf"))?;
    let table = hmtx_transform::decode(data, hhea.num_hori_metrics, maxp.num_glyphs, glyf)?;
    let variant = if tag == crate::tag::HMTX { Table::Hmtx(table) } else { Table::Vmtx(table) };
    install(cache, false, tag, source.table_byte_offset(tag), variant, 0);
    Ok(())
}

impl TableSource for Woff2Reader {
    fn read_table_data_and_expected_checksum(&self, tag: Tag) -> Result<(Vec<u8>, Option<u32>)> {
        let data = self
            .tables
            .bytes
            .get(&tag)
            .ok_or(FontError::MissingDependency("font", "table"))?
            .clone();
        // WOFF2 does not store individual table checksums.
        Ok((data, None))
    }

    fn table_byte_offset(&self, tag: Tag) -> u32 {
        self.tables.entries.iter().position(|e| e.tag == tag).map(|i| i as u32).unwrap_or(0)
    }

    fn before_parse(&self, tag: Tag, cache: &TableCache, configs: &SfntConfigs) -> Result<()> {
        if tag == crate::tag::GLYF || tag == crate::tag::LOCA {
            if let Some(entry) = self.entry_for(crate::tag::GLYF) {
                if entry.transform_version.is_glyf_loca_transformed() {
                    return materialize_glyf_loca(self, cache, configs, &self.tables);
                }
            }
        }
        if tag == crate::tag::HMTX {
            if let Some(entry) = self.entry_for(tag) {
                if entry.transform_version.is_generic_transformed() {
                    return materialize_transformed_hmtx(self, cache, configs, &self.tables, tag, crate::tag::HHEA);
                }
            }
        }
        if tag == crate::tag::VMTX {
            if let Some(entry) = self.entry_for(tag) {
                if entry.transform_version.is_generic_transformed() {
                    return materialize_transformed_hmtx(self, cache, configs, &self.tables, tag, crate::tag::VHEA);
                }
            }
        }
        Ok(())
    }
}

/// A WOFF2-wrapped TrueType Collection: one shared compressed blob and
/// table directory, plus a [`Woff2CollectionDirectory`] mapping each
/// member font to the subset of directory entries (by index) it uses.
pub struct Woff2CollectionReader {
    pub collection_directory: Woff2CollectionDirectory,
    tables: Rc<Woff2Tables>,
    flavor_by_font: Vec<SfntVersion>,
    tags_by_font: Vec<Vec<Tag>>,
    collection_cache: CollectionCache,
    header: Woff2Header,
    payload: WoffPayload,
}

impl Woff2CollectionReader {
    pub fn new(data: &[u8]) -> Result<Self> {
        let (header, directory_end) = Woff2Header::parse(data)?;
        if !matches!(header.flavor, Woff2Flavor::Ttc) {
            return Err(FontError::UnsupportedContainer(header.flavor.value()));
        }
        let mut stream = crate::stream::Stream::from_bytes(data);
        stream.seek(directory_end);
        let collection_directory = Woff2CollectionDirectory::parse(&mut stream, header.entries.len())?;
        let compressed_start = stream.tell();

        let compressed = data.get(compressed_start..compressed_start + header.total_compressed_size as usize).ok_or(
            FontError::EndOfStream { wanted: header.total_compressed_size as usize, available: data.len() },
        )?;
        #[cfg(feature = "brotli")]
        let uncompressed = woff2::decompress(compressed, header.total_sfnt_size as usize)?;
        #[cfg(not(feature = "brotli"))]
        let uncompressed: Vec<u8> = {
            let _ = compressed;
            return Err(FontError::Decompress("woff2 brotli stream (feature \"brotli\" disabled)"));
        };

        let tables = Rc::new(slice_woff2_tables(&header.entries, &uncompressed)?);
        let flavor_by_font = collection_directory.fonts.iter().map(|f| f.flavor).collect();
        let tags_by_font = collection_directory
            .fonts
            .iter()
            .map(|f| f.table_indices.iter().map(|&i| header.entries[i as usize].tag).collect())
            .collect();
        let payload = extract_woff2_payload(data, &header)?;

        Ok(Woff2CollectionReader {
            collection_directory,
            tables,
            flavor_by_font,
            tags_by_font,
            collection_cache: Rc::new(RefCell::new(HashMap::new())),
            header,
            payload,
        })
    }

    pub fn num_fonts(&self) -> usize {
        self.flavor_by_font.len()
    }

    pub fn read_woff_payload(&self) -> WoffPayload {
        self.payload.clone()
    }

    pub fn font_reader(&self, index: usize) -> Option<Woff2FontReader<'_>> {
        if index >= self.num_fonts() {
            return None;
        }
        Some(Woff2FontReader {
            collection: self,
            flavor: self.flavor_by_font[index],
            tags: self.tags_by_font[index].clone(),
            cache: TableCache::new(Some(Rc::clone(&self.collection_cache))),
        })
    }
}

/// One member font of a [`Woff2CollectionReader`]: a view over the shared
/// table bytes restricted to the tags this font's collection-directory
/// entry references.
pub struct Woff2FontReader<'a> {
    collection: &'a Woff2CollectionReader,
    flavor: SfntVersion,
    tags: Vec<Tag>,
    cache: TableCache,
}

impl Woff2FontReader<'_> {
    pub fn sfnt_version(&self) -> SfntVersion {
        self.flavor
    }

    pub fn table_tags(&self) -> Vec<Tag> {
        self.tags.clone()
    }

    pub fn get_table(&self, configs: &SfntConfigs, tag: Tag) -> Result<Table> {
        get_or_parse_table(self, &self.cache, configs, tag)
    }

    fn entry_for(&self, tag: Tag) -> Option<&Woff2TableDirectoryEntry> {
        self.collection.header.entries.iter().find(|e| e.tag == tag)
    }
}

impl TableSource for Woff2FontReader<'_> {
    fn read_table_data_and_expected_checksum(&self, tag: Tag) -> Result<(Vec<u8>, Option<u32>)> {
        let data = self
            .collection
            .tables
            .bytes
            .get(&tag)
            .ok_or(FontError::MissingDependency("font", "table"))?
            .clone();
        Ok((data, None))
    }

    fn table_byte_offset(&self, tag: Tag) -> u32 {
        self.collection.header.entries.iter().position(|e| e.tag == tag).map(|i| i as u32).unwrap_or(0)
    }

    fn before_parse(&self, tag: Tag, cache: &TableCache, configs: &SfntConfigs) -> Result<()> {
        if tag == crate::tag::GLYF || tag == crate::tag::LOCA {
            if let Some(entry) = self.entry_for(crate::tag::GLYF) {
                if entry.transform_version.is_glyf_loca_transformed() {
                    return materialize_glyf_loca(self, cache, configs, &self.collection.tables);
                }
            }
        }
        if tag == crate::tag::HMTX {
            if let Some(entry) = self.entry_for(tag) {
                if entry.transform_version.is_generic_transformed() {
                    return materialize_transformed_hmtx(
                        self,
                        cache,
                        configs,
                        &self.collection.tables,
                        tag,
                        crate::tag::HHEA,
                    );
                }
            }
        }
        if tag == crate::tag::VMTX {
            if let Some(entry) = self.entry_for(tag) {
                if entry.transform_version.is_generic_transformed() {
                    return materialize_transformed_hmtx(
                        self,
                        cache,
                        configs,
                        &self.collection.tables,
                        tag,
                        crate::tag::VHEA,
                    );
                }
            }
        }
        Ok(())
    }
}
