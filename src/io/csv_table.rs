//! CSV tables.
//!
//! Values are written with Rust's shortest round-trip float formatting, so a
//! write/read cycle is lossless. CSV carries no metadata.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::AppError;
use crate::io::table::{Column, Table};

pub fn write_csv(file: &File, table: &Table) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(BufWriter::new(file));
    let io_err = |e: csv::Error| AppError::Io(format!("Failed to write CSV: {e}"));

    writer.write_record(table.names()).map_err(io_err)?;
    let mut row = Vec::with_capacity(table.columns().len());
    for i in 0..table.n_rows() {
        row.clear();
        row.extend(table.columns().iter().map(|c| c.values[i].to_string()));
        writer.write_record(&row).map_err(io_err)?;
    }

    let mut inner = writer
        .into_inner()
        .map_err(|e| AppError::Io(format!("Failed to flush CSV: {e}")))?;
    inner
        .flush()
        .map_err(|e| AppError::Io(format!("Failed to flush CSV: {e}")))
}

pub fn read_csv(path: &Path) -> Result<Table, AppError> {
    let file = File::open(path).map_err(|e| AppError::load(path, format!("cannot open file: {e}")))?;
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let headers = reader
        .headers()
        .map_err(|e| AppError::load(path, format!("cannot read CSV header: {e}")))?
        .clone();
    if headers.is_empty() {
        return Err(AppError::load(path, "CSV file has no header"));
    }

    let mut columns: Vec<Column> = headers
        .iter()
        .map(|name| Column {
            name: name.to_string(),
            values: Vec::new(),
        })
        .collect();

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = result.map_err(|e| AppError::load(path, format!("line {line}: {e}")))?;
        for (column, field) in columns.iter_mut().zip(record.iter()) {
            let value: f64 = field.parse().map_err(|_| {
                AppError::load(
                    path,
                    format!("line {line}: column `{}` has non-numeric value '{field}'", column.name),
                )
            })?;
            column.values.push(value);
        }
    }

    Table::new(columns).map_err(|e| AppError::load(path, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn round_trip_preserves_bits() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        let values = vec![0.1 + 0.2, 1.0 / 3.0, 6.02214076e23, -0.0, 5e-324];
        let table = Table::new(vec![
            Column {
                name: "x".into(),
                values: values.clone(),
            },
            Column {
                name: "y".into(),
                values: values.iter().map(|v| v * 2.0).collect(),
            },
        ])
        .unwrap();

        let file = File::create(&path).unwrap();
        write_csv(&file, &table).unwrap();
        drop(file);

        let back = read_csv(&path).unwrap();
        assert_eq!(back.names(), vec!["x", "y"]);
        for (a, b) in back.column("x").unwrap().iter().zip(&values) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn truncated_row_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        fs::write(&path, "m_f,a_f\n1.0,0.5\n2.0\n").unwrap();
        let err = read_csv(&path).unwrap_err();
        assert!(matches!(err, AppError::Load { .. }));
        assert!(err.to_string().contains("line 3"), "{err}");
    }

    #[test]
    fn non_numeric_value_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.csv");
        fs::write(&path, "m_f,a_f\n1.0,abc\n").unwrap();
        let err = read_csv(&path).unwrap_err();
        assert!(err.to_string().contains("a_f"));
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let err = read_csv(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, AppError::Load { .. }));
    }
}
