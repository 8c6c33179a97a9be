//! Parquet tables.
//!
//! Every column is a non-nullable `Float64`. Table metadata is stored as JSON
//! in the file's key-value metadata under [`META_KEY`].

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::metadata::KeyValue;
use parquet::file::properties::WriterProperties;

use crate::error::AppError;
use crate::io::table::{Column, Table, TableMeta};

pub const META_KEY: &str = "archeo.meta";

pub fn write_parquet(file: &File, table: &Table) -> Result<(), AppError> {
    let io_err = |e: parquet::errors::ParquetError| AppError::Io(format!("Failed to write Parquet table: {e}"));

    let fields: Vec<Field> = table
        .columns()
        .iter()
        .map(|c| Field::new(c.name.as_str(), DataType::Float64, false))
        .collect();
    let schema = Arc::new(Schema::new(fields));
    let arrays: Vec<ArrayRef> = table
        .columns()
        .iter()
        .map(|c| Arc::new(Float64Array::from(c.values.clone())) as ArrayRef)
        .collect();
    let batch = RecordBatch::try_new(schema.clone(), arrays)
        .map_err(|e| AppError::Io(format!("Failed to build record batch: {e}")))?;

    let mut props = WriterProperties::builder().set_compression(Compression::SNAPPY);
    if let Some(meta) = &table.meta {
        let json = serde_json::to_string(meta)
            .map_err(|e| AppError::Io(format!("Failed to encode table metadata: {e}")))?;
        props = props.set_key_value_metadata(Some(vec![KeyValue::new(META_KEY.to_string(), json)]));
    }

    let mut writer = ArrowWriter::try_new(file, schema, Some(props.build())).map_err(io_err)?;
    writer.write(&batch).map_err(io_err)?;
    writer.close().map_err(io_err)?;
    Ok(())
}

pub fn read_parquet(path: &Path) -> Result<Table, AppError> {
    let file = File::open(path).map_err(|e| AppError::load(path, format!("cannot open file: {e}")))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| AppError::load(path, format!("invalid Parquet file: {e}")))?;

    let meta = match builder
        .metadata()
        .file_metadata()
        .key_value_metadata()
        .and_then(|kvs| kvs.iter().find(|kv| kv.key == META_KEY))
        .and_then(|kv| kv.value.as_deref())
    {
        Some(json) => Some(
            serde_json::from_str::<TableMeta>(json)
                .map_err(|e| AppError::load(path, format!("invalid table metadata: {e}")))?,
        ),
        None => None,
    };

    let mut columns: Vec<Column> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| Column {
            name: f.name().clone(),
            values: Vec::new(),
        })
        .collect();

    let reader = builder
        .build()
        .map_err(|e| AppError::load(path, format!("cannot read Parquet data: {e}")))?;
    for batch in reader {
        let batch = batch.map_err(|e| AppError::load(path, format!("cannot read Parquet data: {e}")))?;
        for (column, array) in columns.iter_mut().zip(batch.columns()) {
            let values = array.as_any().downcast_ref::<Float64Array>().ok_or_else(|| {
                AppError::load(
                    path,
                    format!("column `{}` has type {} (expected Float64)", column.name, array.data_type()),
                )
            })?;
            if values.null_count() > 0 {
                return Err(AppError::load(path, format!("column `{}` contains nulls", column.name)));
            }
            column.values.extend_from_slice(values.values());
        }
    }

    let table = Table::new(columns).map_err(|e| AppError::load(path, e.to_string()))?;
    Ok(match meta {
        Some(meta) => table.with_meta(meta),
        None => table,
    })
}
