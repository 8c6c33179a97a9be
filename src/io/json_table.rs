//! Columnar JSON tables: `{"meta": {...}, "columns": [{"name", "values"}]}`.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::AppError;
use crate::io::table::Table;

pub fn write_json(file: &File, table: &Table) -> Result<(), AppError> {
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, table)
        .map_err(|e| AppError::Io(format!("Failed to write JSON table: {e}")))?;
    writer
        .flush()
        .map_err(|e| AppError::Io(format!("Failed to flush JSON table: {e}")))
}

pub fn read_json(path: &Path) -> Result<Table, AppError> {
    let file = File::open(path).map_err(|e| AppError::load(path, format!("cannot open file: {e}")))?;
    let table: Table = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::load(path, format!("invalid JSON table: {e}")))?;
    table.validate().map_err(|e| AppError::load(path, e))?;
    Ok(table)
}
