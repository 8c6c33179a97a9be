//! Table file formats.

use std::fmt;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    /// Row-oriented text, one header line.
    Csv,
    /// Columnar JSON with embedded metadata.
    Json,
    /// Columnar binary with embedded metadata.
    Parquet,
}

impl TableFormat {
    pub const ALL: [TableFormat; 3] = [TableFormat::Csv, TableFormat::Json, TableFormat::Parquet];

    pub fn extension(self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::Json => "json",
            TableFormat::Parquet => "parquet",
        }
    }

    /// Whether the format can carry prior configuration and generation metadata.
    pub fn embeds_metadata(self) -> bool {
        !matches!(self, TableFormat::Csv)
    }

    /// Infer the format from a file extension (`.csv`, `.json`, `.parquet`, `.pq`).
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "csv" => Some(TableFormat::Csv),
            "json" => Some(TableFormat::Json),
            "parquet" | "pq" => Some(TableFormat::Parquet),
            _ => None,
        }
    }

    /// Explicit choice wins; otherwise the extension decides.
    pub fn resolve(explicit: Option<TableFormat>, path: &Path) -> Result<Self, AppError> {
        if let Some(format) = explicit {
            return Ok(format);
        }
        Self::from_path(path).ok_or_else(|| {
            AppError::input(format!(
                "Cannot infer table format from '{}'; use a .csv, .json or .parquet extension or pass --format.",
                path.display()
            ))
        })
    }
}

impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
