//! Runtime configuration accepted by `Font::parse`/`dump` and friends.

/// Controls the padding bytes inserted between glyph records when `glyf` is
/// serialized, which in turn affects `loca` offsets and therefore whether
/// `head.index_to_loc_format` ends up `Short` or `Long`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlyfDataOffsetsPaddingMode {
    /// Glyph records are packed back to back with no padding.
    NoPadding,
    /// Each glyph record is padded so the next one starts on a 2-byte
    /// boundary. Matches the convention most SFNT encoders use.
    #[default]
    AlignTo2Byte,
    /// Each glyph record is padded to a 4-byte boundary.
    AlignTo4Byte,
}

impl GlyfDataOffsetsPaddingMode {
    pub(crate) fn pad_len(self, unpadded_len: usize) -> usize {
        match self {
            Self::NoPadding => 0,
            Self::AlignTo2Byte => unpadded_len % 2,
            Self::AlignTo4Byte => (4 - unpadded_len % 4) % 4,
        }
    }
}

/// Top-level configuration record threaded through every `parse`/`dump`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SfntConfigs {
    pub glyf_data_offsets_padding_mode: GlyfDataOffsetsPaddingMode,
    /// Whether per-table and whole-font checksum invariants are verified
    /// while parsing. Disabling this allows tolerant inspection of files
    /// with known-bad checksums.
    pub verify_checksum: bool,
    /// Whether tables sharing the same `(tag, byte_offset)` identity inside
    /// a collection are parsed once and shared, or independently deep-copied
    /// per font.
    pub share_tables: bool,
}

impl Default for SfntConfigs {
    fn default() -> Self {
        Self {
            glyf_data_offsets_padding_mode: GlyfDataOffsetsPaddingMode::default(),
            verify_checksum: true,
            share_tables: true,
        }
    }
}
