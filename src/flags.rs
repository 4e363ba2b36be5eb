//! Bitflag records: every bitfield-typed field in the format (`head.flags`,
//! `head.macStyle`, per-glyph component flags, DSIG permission flags, WOFF2
//! option flags, ...) is a small record of named booleans at fixed bit
//! positions, round-tripping through `parse(int) -> Self` / `value(&self) -> int`.
//! Unknown bits are dropped silently on parse and always written as zero.
//!
//! `bitflags_record!` generates one such record from a list of
//! `field_name => bit_index` pairs, backed by the given integer width.

macro_rules! bitflags_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $int:ty {
            $($field:ident => $bit:expr),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        $vis struct $name {
            $(pub $field: bool),*
        }

        impl $name {
            #[allow(dead_code)]
            pub fn parse(value: $int) -> Self {
                Self {
                    $($field: value & (1 << $bit) != 0),*
                }
            }

            #[allow(dead_code)]
            pub fn value(&self) -> $int {
                let mut v: $int = 0;
                $(if self.$field { v |= 1 << $bit; })*
                v
            }
        }
    };
}

pub(crate) use bitflags_record;
