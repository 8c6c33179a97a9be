//! In-memory columnar table shared by all file formats.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Component, PriorConfig};
use crate::error::AppError;
use crate::infer::{MatchMode, Tolerances};
use crate::prior::GenerationReport;

pub const TOOL_NAME: &str = "archeo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    Prior,
    Posterior,
}

/// Metadata embedded by formats that support it (JSON, Parquet).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
    pub tool: String,
    pub version: String,
    pub kind: TableKind,
    pub written_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<PriorConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerances: Option<Tolerances>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_mode: Option<MatchMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<Component>,
}

impl TableMeta {
    pub fn new(kind: TableKind) -> Self {
        Self {
            tool: TOOL_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            kind,
            written_at: Utc::now(),
            config: None,
            generation: None,
            tolerances: None,
            match_mode: None,
            component: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

/// Named `f64` columns of equal length, in a fixed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<TableMeta>,
    columns: Vec<Column>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Result<Self, AppError> {
        let table = Self { meta: None, columns };
        table.validate().map_err(AppError::input)?;
        Ok(table)
    }

    pub fn with_meta(mut self, meta: TableMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Check the shape invariants. Used after deserialising untrusted files.
    pub(crate) fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for c in &self.columns {
            if !seen.insert(c.name.as_str()) {
                return Err(format!("duplicate column `{}`", c.name));
            }
        }
        if let Some(first) = self.columns.first() {
            for c in &self.columns[1..] {
                if c.values.len() != first.values.len() {
                    return Err(format!(
                        "column `{}` has {} values but `{}` has {}",
                        c.name,
                        c.values.len(),
                        first.name,
                        first.values.len()
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Like [`Table::column`] but with an error naming the missing column.
    pub fn require(&self, name: &str) -> Result<&[f64], String> {
        self.column(name).ok_or_else(|| {
            format!("missing column `{name}` (found: {})", self.names().join(", "))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn col(name: &str, values: &[f64]) -> Column {
        Column {
            name: name.to_string(),
            values: values.to_vec(),
        }
    }

    #[test]
    fn rejects_ragged_columns() {
        let err = Table::new(vec![col("a", &[1.0, 2.0]), col("b", &[1.0])]).unwrap_err();
        assert!(err.to_string().contains("`b`"));
    }

    #[test]
    fn rejects_duplicate_names() {
        assert!(Table::new(vec![col("a", &[1.0]), col("a", &[2.0])]).is_err());
    }

    #[test]
    fn column_lookup() {
        let t = Table::new(vec![col("m_f", &[1.0, 2.0]), col("a_f", &[0.1, 0.2])]).unwrap();
        assert_eq!(t.n_rows(), 2);
        assert_eq!(t.column("a_f"), Some(&[0.1, 0.2][..]));
        let err = t.require("k_f").unwrap_err();
        assert!(err.contains("k_f") && err.contains("m_f, a_f"));
    }
}
