//! Output formatting and persistence for query results.
//!
//! Supports pretty-printing, JSON serialization, CSV append and gzip.

use anyhow::{Context, Result};
use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fmt::Debug;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, copy};
use std::path::Path;
use tracing::{debug, info};

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty<T: Debug>(value: &T) {
    debug!("{:#?}", value);
}

/// Writes a value to stdout as pretty-printed JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Appends `records` as rows to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_records<T: Serialize>(path: &str, records: &[T]) -> Result<()> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, rows = records.len(), "Appending CSV records");

    let file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("failed to open {path}"))?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;

    Ok(())
}

/// Writes a gzip-compressed copy of `path` next to it and returns the new
/// file's path (`<path>.gz`).
pub fn gzip_file(path: &str) -> Result<String> {
    let gz_path = format!("{path}.gz");
    let mut input = BufReader::new(File::open(path).with_context(|| format!("failed to open {path}"))?);
    let output = File::create(&gz_path).with_context(|| format!("failed to create {gz_path}"))?;

    let mut encoder = GzEncoder::new(output, Compression::default());
    copy(&mut input, &mut encoder)?;
    encoder.finish()?;

    info!(source = path, output = %gz_path, "Compressed export");
    Ok(gz_path)
}
