//! Container-level payload that doesn't belong to any single table: the
//! WOFF metadata/private-data blocks, and the TTC-wide version/`DSIG`
//! pointer a collection carries alongside its member fonts.

use crate::tables::dsig::DsigTable;

/// The bytes WOFF wraps around its table data but which are not part of
/// the reconstructed SFNT: the version pair stamped in the WOFF header,
/// and the optional XML metadata / arbitrary private-data blocks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WoffPayload {
    pub major_version: u16,
    pub minor_version: u16,
    /// Raw (already decompressed) metadata XML, if the WOFF carried one.
    pub metadata: Option<Vec<u8>>,
    pub private_data: Option<Vec<u8>>,
}

/// The whole-collection data a TrueType Collection carries outside any one
/// member font: its header's own version, and (for version 2.0) the
/// collection-wide `DSIG`.
#[derive(Debug, Clone, PartialEq)]
pub struct TtcPayload {
    pub major_version: u16,
    pub minor_version: u16,
    pub dsig: Option<DsigTable>,
}

impl Default for TtcPayload {
    fn default() -> Self {
        TtcPayload { major_version: 1, minor_version: 0, dsig: None }
    }
}
