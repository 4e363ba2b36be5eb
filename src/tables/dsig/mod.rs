//! `DSIG`: the digital signature table. A font is signed as a whole, so
//! this table's blocks cover the complete binary and are out of scope for
//! any other table's `update`.

pub mod blocks;

pub use blocks::{SignatureBlock, SignatureBlockFormat1};

use crate::error::Result;
use crate::flags::bitflags_record;
use crate::stream::Stream;

bitflags_record! {
    pub struct DsigPermissionFlags: u16 {
        cannot_be_resigned => 0,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DsigTable {
    pub version: u32,
    pub flags: DsigPermissionFlags,
    pub signatures: Vec<SignatureBlock>,
}

impl Default for DsigTable {
    fn default() -> Self {
        DsigTable { version: 1, flags: DsigPermissionFlags::default(), signatures: Vec::new() }
    }
}

impl DsigTable {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut stream = Stream::from_bytes(data);
        let version = stream.read_uint32()?;
        let num_signatures = stream.read_uint16()?;
        let flags = DsigPermissionFlags::parse(stream.read_uint16()?);

        struct Record {
            format: u32,
            length: u32,
            offset: u32,
        }
        let mut records = Vec::with_capacity(num_signatures as usize);
        for _ in 0..num_signatures {
            records.push(Record {
                format: stream.read_uint32()?,
                length: stream.read_uint32()?,
                offset: stream.read_offset32()?,
            });
        }

        let mut signatures = Vec::with_capacity(records.len());
        for record in &records {
            let start = record.offset as usize;
            let end = start + record.length as usize;
            let block = data
                .get(start..end)
                .ok_or(crate::error::FontError::EndOfStream { wanted: record.length as usize, available: data.len() })?;
            signatures.push(SignatureBlock::parse(record.format, block)?);
        }

        Ok(DsigTable { version, flags, signatures })
    }

    /// Writes the header and records first (reserving their space), then
    /// appends each signature block and backfills its offset/length,
    /// matching the two-pass layout the original format requires (records
    /// must precede the blocks they point into, but the blocks' lengths
    /// aren't known until they're serialized).
    pub fn dump(&self) -> Vec<u8> {
        let mut stream = Stream::new();
        let header_and_records_len = 4 + 2 + 2 + (4 + 4 + 4) * self.signatures.len();
        stream.seek(header_and_records_len);

        let mut records = Vec::with_capacity(self.signatures.len());
        for sig in &self.signatures {
            let offset = stream.tell();
            let bytes = sig.dump();
            stream.write(&bytes);
            records.push((sig.format(), bytes.len() as u32, offset as u32));
        }

        stream.seek(0);
        stream.write_uint32(self.version);
        stream.write_uint16(self.signatures.len() as u16);
        stream.write_uint16(self.flags.value());
        for (format, length, offset) in records {
            stream.write_uint32(format);
            stream.write_uint32(length);
            stream.write_offset32(offset);
        }

        stream.seek(stream.len());
        stream.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_multiple_signatures() {
        let table = DsigTable {
            version: 1,
            flags: DsigPermissionFlags { cannot_be_resigned: true },
            signatures: vec![
                SignatureBlock::Format1(SignatureBlockFormat1 { signature: vec![1, 2, 3] }),
                SignatureBlock::Format1(SignatureBlockFormat1 { signature: vec![4, 5, 6, 7] }),
            ],
        };
        let bytes = table.dump();
        let parsed = DsigTable::parse(&bytes).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn empty_table_roundtrip() {
        let table = DsigTable::default();
        let bytes = table.dump();
        assert_eq!(DsigTable::parse(&bytes).unwrap(), table);
    }
}
