//! Signature block payloads. Only format 1 (a raw PKCS#7 signature) is
//! understood; any other format is a hard parse error since this crate has
//! no way to interpret its bytes.

use crate::error::{FontError, Result};
use crate::stream::Stream;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureBlockFormat1 {
    pub signature: Vec<u8>,
}

impl SignatureBlockFormat1 {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut stream = Stream::from_bytes(data);
        let _reserved1 = stream.read_uint16()?;
        let _reserved2 = stream.read_uint16()?;
        let len = stream.read_uint32()? as usize;
        let signature = stream.read(len)?.to_vec();
        Ok(SignatureBlockFormat1 { signature })
    }

    pub fn dump(&self) -> Vec<u8> {
        let mut stream = Stream::new();
        stream.write_uint16(0);
        stream.write_uint16(0);
        stream.write_uint32(self.signature.len() as u32);
        stream.write(&self.signature);
        stream.into_bytes()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureBlock {
    Format1(SignatureBlockFormat1),
}

impl SignatureBlock {
    pub fn parse(format: u32, data: &[u8]) -> Result<Self> {
        match format {
            1 => Ok(SignatureBlock::Format1(SignatureBlockFormat1::parse(data)?)),
            other => Err(FontError::UnsupportedVersion {
                table: "DSIG.SignatureRecord.format",
                version: other.to_string(),
            }),
        }
    }

    pub fn format(&self) -> u32 {
        match self {
            SignatureBlock::Format1(_) => 1,
        }
    }

    pub fn dump(&self) -> Vec<u8> {
        match self {
            SignatureBlock::Format1(b) => b.dump(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format1_roundtrip() {
        let b = SignatureBlockFormat1 { signature: vec![1, 2, 3, 4, 5] };
        let bytes = b.dump();
        assert_eq!(SignatureBlockFormat1::parse(&bytes).unwrap(), b);
    }

    #[test]
    fn unknown_format_is_fatal() {
        assert!(SignatureBlock::parse(2, &[]).is_err());
    }
}
