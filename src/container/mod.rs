//! Container-level framing: the plain SFNT/TTC directory, and the WOFF1/
//! WOFF2 wrappers around it.

pub mod sfnt;
pub mod woff1;
pub mod woff2;

pub use sfnt::{SfntDirectory, TableRecord, TtcHeader};
pub use woff1::{WoffHeader, WoffTableDirectoryEntry};
pub use woff2::{Woff2CollectionDirectory, Woff2Flavor, Woff2Header, Woff2TableDirectoryEntry};
