//! Report writers.
//!
//! The reporter phase derives groups from the manifest; this module only
//! knows how to lay them out on disk. Callers skip these functions entirely
//! when a grouping is empty, so no empty report files appear.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use reshelf_core::ActionRecord;

use crate::error::Result;

/// Duplicate-content table, one row per member record, sorted groups first.
pub fn write_duplicates_csv(path: &Path, groups: &[(&str, Vec<&ActionRecord>)]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record([
        "content_hash",
        "source_container",
        "source_path",
        "file_name",
        "size_bytes",
        "destination_key",
        "destination_path",
    ])?;
    for (hash, members) in groups {
        for rec in members {
            let size = rec.size_bytes.to_string();
            writer.write_record([
                *hash,
                rec.source_container.as_str(),
                rec.source_path.as_str(),
                rec.file_name.as_str(),
                size.as_str(),
                rec.destination_key.as_str(),
                rec.destination_path.as_str(),
            ])?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Naming-collision report: one section per colliding destination path.
pub fn write_collisions_txt(path: &Path, groups: &[(&str, Vec<&ActionRecord>)]) -> Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    for (destination, members) in groups {
        writeln!(out, "collision: {destination}")?;
        for rec in members {
            writeln!(
                out,
                "  source={} size={} hash={}",
                rec.source_path, rec.size_bytes, rec.content_hash
            )?;
        }
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}
