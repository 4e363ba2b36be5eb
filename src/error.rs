//! The closed error taxonomy shared by every layer of the crate.
//!
//! Every fallible operation in this crate, from a single integer read to a
//! whole-font parse, reports failure through this one enum. Each variant
//! names the subsystem responsible so a caller debugging a bad file has a
//! pointer straight to the relevant spec section.

use thiserror::Error;

/// Errors produced while reading, transforming or writing a font container.
#[derive(Error, Debug)]
pub enum FontError {
    /// The leading four bytes of the input matched none of `\x00\x01\x00\x00`,
    /// `OTTO`, `ttcf`, `wOFF`, `wOF2`.
    #[error("unsupported container: leading tag {0:08x} is not a known font container")]
    UnsupportedContainer(u32),

    /// The container is a collection (`ttcf`/WOFF2-collection) but the caller
    /// did not supply a font index.
    #[error("a font index is required to parse a font collection")]
    MissingFontIndex,

    /// `font_index` named a font that does not exist in the collection.
    #[error("font index {index} out of range (collection has {num_fonts} fonts)")]
    FontIndexOutOfRange { index: u32, num_fonts: u32 },

    /// `head.magicNumber` was not `0x5F0F3CF5`.
    #[error("bad magic number in head table: {0:08x}")]
    BadMagicNumber(u32),

    /// A table carried a version number this crate does not understand.
    #[error("unsupported version for table {table}: {version}")]
    UnsupportedVersion { table: &'static str, version: String },

    /// A per-table or whole-font checksum did not match its expected value.
    #[error("bad checksum for {0}")]
    BadChecksum(&'static str),

    /// A `UIntBase128` value was malformed: a leading `0x80` byte, more than
    /// five bytes, or an encoded value that overflows 32 bits.
    #[error("malformed UIntBase128 value")]
    MalformedVarInt,

    /// A WOFF2 transform violated one of its structural rules: a transformed
    /// `loca` with a nonzero transform length, a composite glyph whose bbox
    /// bit is unset, or a decompressed size that did not match the header.
    #[error("malformed transform: {0}")]
    MalformedTransform(&'static str),

    /// A count derived from one table disagreed with another, e.g.
    /// `hmtx`/`vmtx` metrics versus `maxp.numGlyphs`, or `loca.offsets.len()`
    /// versus `maxp.numGlyphs + 1`.
    #[error("structural count mismatch: {0}")]
    CountMismatch(&'static str),

    /// A four-byte tag was not valid ASCII 0x20..=0x7E, or began/contained a
    /// disallowed space.
    #[error("invalid tag: {0}")]
    InvalidTag(String),

    /// Fewer bytes remained in the stream than the read required.
    #[error("unexpected end of stream: wanted {wanted} bytes, {available} available")]
    EndOfStream { wanted: usize, available: usize },

    /// A table this crate needed to resolve a dependency on was missing.
    #[error("missing dependency table {0:?} required to parse/dump {1:?}")]
    MissingDependency(&'static str, &'static str),

    /// Decompression (zlib or brotli) failed outright.
    #[error("decompression failed: {0}")]
    Decompress(&'static str),

    /// Wrapper around an I/O error encountered while loading a font from disk.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FontError>;
