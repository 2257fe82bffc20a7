//! Parquet codec for the action manifest.
//!
//! One row per `ActionRecord`, schema fixed at write time. The byte-level
//! entry points keep the artifact portable: a manifest fetched from a remote
//! store decodes exactly like one read from local disk.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use arrow_array::{ArrayRef, RecordBatch, StringArray, UInt64Array};
use arrow_schema::{DataType, Field, Schema};
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use reshelf_core::{Action, ActionRecord, DestinationKey, Manifest};

use crate::error::{Error, Result};

fn manifest_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("source_container", DataType::Utf8, false),
        Field::new("source_path", DataType::Utf8, false),
        Field::new("file_name", DataType::Utf8, false),
        Field::new("size_bytes", DataType::UInt64, false),
        Field::new("content_hash", DataType::Utf8, false),
        Field::new("action", DataType::Utf8, false),
        Field::new("destination_key", DataType::Utf8, false),
        Field::new("destination_path", DataType::Utf8, false),
    ]))
}

/// Encode a manifest into Parquet bytes.
pub fn encode_manifest(manifest: &Manifest) -> Result<Vec<u8>> {
    let schema = manifest_schema();
    let records = manifest.records();

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.source_container.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.source_path.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.file_name.as_str()),
        )),
        Arc::new(UInt64Array::from_iter_values(
            records.iter().map(|r| r.size_bytes),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.content_hash.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.action.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.destination_key.as_str()),
        )),
        Arc::new(StringArray::from_iter_values(
            records.iter().map(|r| r.destination_path.as_str()),
        )),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns)?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut out = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut out, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(out)
}

/// Write a manifest to a local path, creating parent directories.
pub fn write_manifest_file(manifest: &Manifest, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, encode_manifest(manifest)?)?;
    Ok(())
}

fn str_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| Error::Schema(format!("missing or mistyped column '{name}'")))
}

fn u64_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a UInt64Array> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<UInt64Array>())
        .ok_or_else(|| Error::Schema(format!("missing or mistyped column '{name}'")))
}

/// Decode a manifest from Parquet bytes.
pub fn decode_manifest(bytes: Vec<u8>) -> Result<Manifest> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(bytes))?.build()?;

    let mut records = Vec::new();
    for batch in reader {
        let batch = batch?;
        let source_container = str_col(&batch, "source_container")?;
        let source_path = str_col(&batch, "source_path")?;
        let file_name = str_col(&batch, "file_name")?;
        let size_bytes = u64_col(&batch, "size_bytes")?;
        let content_hash = str_col(&batch, "content_hash")?;
        let action = str_col(&batch, "action")?;
        let destination_key = str_col(&batch, "destination_key")?;
        let destination_path = str_col(&batch, "destination_path")?;

        for row in 0..batch.num_rows() {
            records.push(ActionRecord {
                source_container: source_container.value(row).to_string(),
                source_path: source_path.value(row).to_string(),
                file_name: file_name.value(row).to_string(),
                size_bytes: size_bytes.value(row),
                content_hash: content_hash.value(row).to_string(),
                action: Action::parse(action.value(row))
                    .map_err(|e| Error::Record(e.to_string()))?,
                destination_key: DestinationKey::parse(destination_key.value(row))
                    .map_err(|e| Error::Record(e.to_string()))?,
                destination_path: destination_path.value(row).to_string(),
            });
        }
    }
    Ok(Manifest::from_records(records))
}

/// Read a manifest from a local path.
pub fn read_manifest_file(path: &Path) -> Result<Manifest> {
    decode_manifest(fs::read(path)?)
}
