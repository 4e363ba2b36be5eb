//! The table model: a closed sum type over every structural table this
//! crate understands, plus an opaque fallback for everything else. Which
//! variant a tag maps to is a pure function ([`Table::kind_for_tag`]) so the
//! reader orchestrator never has to special-case a tag by name more than
//! once.

pub mod cff;
pub mod default;
pub mod dsig;
pub mod glyf;
pub mod head;
pub mod hhea;
pub mod hmtx;
pub mod loca;
pub mod maxp;

pub use cff::CffTable;
pub use default::OpaqueTable;
pub use dsig::DsigTable;
pub use glyf::GlyfTable;
pub use head::HeadTable;
pub use hhea::HheaTable;
pub use hmtx::HmtxTable;
pub use loca::LocaTable;
pub use maxp::MaxpTable;

use crate::tag::{self, Tag};

/// A parsed table, tagged by its structural kind. `Hhea`/`Vhea` and
/// `Hmtx`/`Vmtx` share a representation (the on-disk layout is identical;
/// only the axis differs, and that's carried by the tag, not the value).
#[derive(Debug, Clone, PartialEq)]
pub enum Table {
    Head(HeadTable),
    Maxp(MaxpTable),
    Hhea(HheaTable),
    Vhea(HheaTable),
    Hmtx(HmtxTable),
    Vmtx(HmtxTable),
    Loca(LocaTable),
    Glyf(GlyfTable),
    Dsig(DsigTable),
    Cff(CffTable),
    Cff2(CffTable),
    Opaque(OpaqueTable),
}

impl Table {
    /// Which variant a tag parses into. `CFF`/`CFF2` are registered
    /// structurally (so the dependency graph can see them) but carry an
    /// opaque body — see [`CffTable`]. Anything else this crate doesn't
    /// model (`cmap`, `name`, `OS/2`, `post`, bitmap/colour tables, vendor
    /// tags, ...) falls through to `Opaque`.
    pub fn kind_for_tag(tag: Tag) -> TableKind {
        match tag {
            t if t == tag::HEAD => TableKind::Head,
            t if t == tag::MAXP => TableKind::Maxp,
            t if t == tag::HHEA => TableKind::Hhea,
            t if t == tag::VHEA => TableKind::Vhea,
            t if t == tag::HMTX => TableKind::Hmtx,
            t if t == tag::VMTX => TableKind::Vmtx,
            t if t == tag::LOCA => TableKind::Loca,
            t if t == tag::GLYF => TableKind::Glyf,
            t if t == tag::DSIG => TableKind::Dsig,
            t if t == tag::CFF => TableKind::Cff,
            t if t == tag::CFF2 => TableKind::Cff2,
            _ => TableKind::Opaque,
        }
    }

    pub fn as_head(&self) -> Option<&HeadTable> {
        match self {
            Table::Head(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_maxp(&self) -> Option<&MaxpTable> {
        match self {
            Table::Maxp(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_loca(&self) -> Option<&LocaTable> {
        match self {
            Table::Loca(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_glyf(&self) -> Option<&GlyfTable> {
        match self {
            Table::Glyf(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_hhea(&self) -> Option<&HheaTable> {
        match self {
            Table::Hhea(t) | Table::Vhea(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_hmtx(&self) -> Option<&HmtxTable> {
        match self {
            Table::Hmtx(t) | Table::Vmtx(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_dsig(&self) -> Option<&DsigTable> {
        match self {
            Table::Dsig(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_cff(&self) -> Option<&CffTable> {
        match self {
            Table::Cff(t) | Table::Cff2(t) => Some(t),
            _ => None,
        }
    }

    /// This value's own variant, for checking it agrees with
    /// [`Table::kind_for_tag`] of the tag it's installed under.
    pub fn kind(&self) -> TableKind {
        match self {
            Table::Head(_) => TableKind::Head,
            Table::Maxp(_) => TableKind::Maxp,
            Table::Hhea(_) => TableKind::Hhea,
            Table::Vhea(_) => TableKind::Vhea,
            Table::Hmtx(_) => TableKind::Hmtx,
            Table::Vmtx(_) => TableKind::Vmtx,
            Table::Loca(_) => TableKind::Loca,
            Table::Glyf(_) => TableKind::Glyf,
            Table::Dsig(_) => TableKind::Dsig,
            Table::Cff(_) => TableKind::Cff,
            Table::Cff2(_) => TableKind::Cff2,
            Table::Opaque(_) => TableKind::Opaque,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Head,
    Maxp,
    Hhea,
    Vhea,
    Hmtx,
    Vmtx,
    Loca,
    Glyf,
    Dsig,
    Cff,
    Cff2,
    Opaque,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tag_is_opaque() {
        let tag = Tag::from_str_const(*b"zzzz");
        assert_eq!(Table::kind_for_tag(tag), TableKind::Opaque);
    }

    #[test]
    fn known_tags_map_to_distinct_kinds() {
        assert_eq!(Table::kind_for_tag(tag::HEAD), TableKind::Head);
        assert_eq!(Table::kind_for_tag(tag::GLYF), TableKind::Glyf);
        assert_eq!(Table::kind_for_tag(tag::DSIG), TableKind::Dsig);
    }
}
