//! Dumps a font's table directory, `head`/`maxp` summary, and glyph count.
//! Accepts any of the four supported containers; for a `.ttc`/WOFF2
//! collection, every member font is printed in turn.

use std::process::ExitCode;

use sfnttools::tag;
use sfnttools::{Font, FontCollection, SfntConfigs, Table};

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: sfnt-info <font-file>");
        return ExitCode::FAILURE;
    };

    let configs = SfntConfigs::default();
    match FontCollection::load(&path, Some(configs)) {
        Ok(collection) => {
            for (index, font) in collection.fonts.iter().enumerate() {
                if collection.num_fonts() > 1 {
                    println!("=== font {index} of {} ===", collection.num_fonts());
                }
                print_font(font);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{path}: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_font(font: &Font) {
    println!("sfnt version: {:?}", font.sfnt_version);
    println!("{:<6} {:>10}", "tag", "bytes");
    for tag in font.tags() {
        let size = font.get(tag).map(table_size).unwrap_or(0);
        println!("{:<6} {:>10}", tag, size);
    }

    if let Some(head) = font.as_head() {
        println!(
            "head: unitsPerEm={} xMin={} yMin={} xMax={} yMax={}",
            head.units_per_em, head.x_min, head.y_min, head.x_max, head.y_max
        );
    }
    if let Some(Table::Maxp(maxp)) = font.get(tag::MAXP) {
        println!("maxp: numGlyphs={}", maxp.num_glyphs);
    }
    if let Some(Table::Glyf(glyf)) = font.get(tag::GLYF) {
        println!("glyf: {} glyphs", glyf.num_glyphs());
    }
    println!();
}

/// A rough per-table size for display purposes; not every variant carries
/// its on-disk length directly, so this re-dumps where necessary.
fn table_size(table: &Table) -> usize {
    match table {
        Table::Opaque(o) => o.data.len(),
        Table::Cff(c) | Table::Cff2(c) => c.data.len(),
        _ => 0,
    }
}
