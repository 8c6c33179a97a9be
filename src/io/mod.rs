//! Input/output helpers.
//!
//! - columnar tables and their CSV / JSON / Parquet encodings (`table`, `*_table`)
//! - atomic file publication (`atomic`)
//! - prior configuration files (`config_file`)
//! - observed posterior samples (`observed`)

pub mod atomic;
pub mod config_file;
pub mod csv_table;
pub mod format;
pub mod json_table;
pub mod observed;
pub mod parquet_table;
pub mod table;

use std::path::Path;

pub use atomic::*;
pub use config_file::*;
pub use format::*;
pub use observed::*;
pub use table::*;

use crate::error::AppError;

/// Write a table atomically in the given format.
pub fn write_table(path: &Path, format: TableFormat, table: &Table) -> Result<(), AppError> {
    write_atomic(path, |file| match format {
        TableFormat::Csv => csv_table::write_csv(file, table),
        TableFormat::Json => json_table::write_json(file, table),
        TableFormat::Parquet => parquet_table::write_parquet(file, table),
    })
}

pub fn read_table(path: &Path, format: TableFormat) -> Result<Table, AppError> {
    match format {
        TableFormat::Csv => csv_table::read_csv(path),
        TableFormat::Json => json_table::read_json(path),
        TableFormat::Parquet => parquet_table::read_parquet(path),
    }
}
