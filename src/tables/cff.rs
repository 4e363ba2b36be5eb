//! `CFF`/`CFF2`: registered as structural table variants so the dependency
//! graph and `head.update`'s bounding-box recomputation can see them, but
//! the charstring format itself is out of scope for this crate (see crate
//! docs) — the body is an opaque byte buffer.

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CffTable {
    pub data: Vec<u8>,
}

impl CffTable {
    pub fn parse(data: &[u8]) -> Self {
        CffTable { data: data.to_vec() }
    }

    pub fn dump(&self) -> Vec<u8> {
        self.data.clone()
    }

    /// `head.update` would recompute the glyph bounding box from a CFF
    /// outline the same way it does from `glyf`, but that requires parsing
    /// charstrings, which this crate does not do. Always `None`, so a
    /// CFF/CFF2-flavoured font keeps whatever bounds it already has.
    pub fn calculate_bounds_box(&self) -> Option<(i16, i16, i16, i16)> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_is_identity() {
        let t = CffTable::parse(&[1, 2, 3]);
        assert_eq!(t.dump(), vec![1, 2, 3]);
        assert_eq!(t.calculate_bounds_box(), None);
    }
}
