use std::path::{Path, PathBuf};

use ela_core::errors::{ElaError, ErrorInfo};
use ela_features::row::is_runtime_key;
use ela_features::FeatureRow;
use serde::{Deserialize, Serialize};

use crate::serde::serde_error;

/// File name of the feature table of one job.
pub fn feature_file_name(fid: u64, dim: usize, iid: u64, sample_size_factor: usize) -> String {
    format!("F{fid}_D{dim}_I{iid}_SSize{sample_size_factor}_features.csv")
}

/// Column-labelled table of feature values, one row per repetition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FeatureMatrix {
    /// Column names.
    pub columns: Vec<String>,
    /// Values, each row aligned with `columns`.
    pub rows: Vec<Vec<f64>>,
}

impl FeatureMatrix {
    /// Builds a matrix from feature rows sharing one key set.
    pub fn from_rows(rows: &[FeatureRow]) -> Result<Self, ElaError> {
        let Some(first) = rows.first() else {
            return Ok(Self::default());
        };
        let columns: Vec<String> = first.entries().into_iter().map(|(key, _)| key).collect();
        let mut values = Vec::with_capacity(rows.len());
        for row in rows {
            let entries = row.entries();
            let keys_match = entries.len() == columns.len()
                && entries.iter().zip(&columns).all(|((key, _), column)| key == column);
            if !keys_match {
                return Err(ElaError::Serde(
                    ErrorInfo::new("feature_columns", "feature rows have different key sets")
                        .with_context("rep", row.rep.to_string()),
                ));
            }
            values.push(entries.into_iter().map(|(_, value)| value).collect());
        }
        Ok(Self {
            columns,
            rows: values,
        })
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Values of column `name`.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|column| column == name)?;
        Some(self.rows.iter().map(|row| row[idx]).collect())
    }

    /// Appends the rows of `other`; both matrices must have the same columns.
    pub fn extend(&mut self, other: FeatureMatrix) -> Result<(), ElaError> {
        if self.columns.is_empty() {
            *self = other;
            return Ok(());
        }
        if other.columns != self.columns && !other.columns.is_empty() {
            return Err(ElaError::Serde(ErrorInfo::new(
                "feature_columns",
                "cannot concatenate tables with different columns",
            )));
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    /// Prepares the table for downstream learners.
    ///
    /// Infinite values saturate to the `f32` range, finite values are clamped
    /// into it, and every column holding a NaN is dropped. Runtime columns are
    /// dropped too when `drop_runtime` is set.
    pub fn sanitize(&self, drop_runtime: bool) -> FeatureMatrix {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|idx| !(drop_runtime && is_runtime_key(&self.columns[*idx])))
            .filter(|idx| self.rows.iter().all(|row| !row[*idx].is_nan()))
            .collect();
        let limit = f64::from(f32::MAX);
        FeatureMatrix {
            columns: keep.iter().map(|idx| self.columns[*idx].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| keep.iter().map(|idx| row[*idx].clamp(-limit, limit)).collect())
                .collect(),
        }
    }

    /// Writes the table as CSV with a header row.
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), ElaError> {
        let mut writer =
            csv::Writer::from_path(path.as_ref()).map_err(|err| serde_error("csv_open", err))?;
        writer
            .write_record(&self.columns)
            .map_err(|err| serde_error("csv_write", err))?;
        for row in &self.rows {
            writer
                .write_record(row.iter().map(|value| value.to_string()))
                .map_err(|err| serde_error("csv_write", err))?;
        }
        writer.flush().map_err(|err| serde_error("csv_flush", err))
    }

    /// Reads a table written by [`write_csv`](Self::write_csv).
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self, ElaError> {
        let mut reader =
            csv::Reader::from_path(path.as_ref()).map_err(|err| serde_error("csv_open", err))?;
        let columns: Vec<String> = reader
            .headers()
            .map_err(|err| serde_error("csv_header", err))?
            .iter()
            .map(str::to_string)
            .collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|err| serde_error("csv_read", err))?;
            let row = record
                .iter()
                .map(|field| {
                    field.trim().parse::<f64>().map_err(|err| {
                        ElaError::Serde(
                            ErrorInfo::new("csv_value", err.to_string())
                                .with_context("field", field.to_string()),
                        )
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }
        Ok(Self { columns, rows })
    }
}

/// Writes the rows of one job to `out/<feature_file_name>` and returns the path.
pub fn write_feature_csv(
    out: &Path,
    rows: &[FeatureRow],
    sample_size_factor: usize,
) -> Result<PathBuf, ElaError> {
    let Some(first) = rows.first() else {
        return Err(ElaError::InsufficientSample(ErrorInfo::new(
            "csv_no_rows",
            "no feature rows to write",
        )));
    };
    let path = out.join(feature_file_name(
        first.fid,
        first.dim,
        first.iid,
        sample_size_factor,
    ));
    FeatureMatrix::from_rows(rows)?.write_csv(&path)?;
    Ok(path)
}
