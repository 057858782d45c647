//! Historical loan outcomes (HMEQ layout)

use crate::error::{ExplainerError, Result};
use crate::preprocessing::RawRow;
use crate::record::{CATEGORICAL_FIELDS, NUMERIC_FIELDS, TARGET_COLUMN};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Historical applicants with their observed outcome.
///
/// Cells may be missing; the outcome is `None` where the dataset has no label.
#[derive(Debug, Clone, Default)]
pub struct HistoricalDataset {
    pub rows: Vec<RawRow>,
    pub labels: Vec<Option<i64>>,
}

impl HistoricalDataset {
    pub fn new(rows: Vec<RawRow>, labels: Vec<Option<i64>>) -> Result<Self> {
        if rows.len() != labels.len() {
            return Err(ExplainerError::ShapeError {
                expected: format!("{} labels", rows.len()),
                actual: format!("{} labels", labels.len()),
            });
        }
        Ok(Self { rows, labels })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows with a known outcome, as `(row, label)` pairs in file order
    pub fn labeled(&self) -> (Vec<RawRow>, Vec<i64>) {
        self.rows
            .iter()
            .zip(&self.labels)
            .filter_map(|(row, label)| label.map(|l| (row.clone(), l)))
            .unzip()
    }

    /// Load the dataset from a CSV file with a header row
    pub fn load_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ExplainerError::artifact(path, e))?;

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(1000))
            .into_reader_with_file_handle(file)
            .finish()
            .map_err(|e| ExplainerError::artifact(path, e))?;

        let dataset = Self::from_dataframe(&df).map_err(|e| ExplainerError::artifact(path, e))?;
        info!(
            path = %path.display(),
            rows = dataset.len(),
            "Loaded historical dataset"
        );
        Ok(dataset)
    }

    /// Extract the target, numeric and categorical columns from a frame
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let n = df.height();

        let labels: Vec<Option<i64>> = float_column(df, TARGET_COLUMN)?
            .into_iter()
            .map(|v| v.map(|b| b.round() as i64))
            .collect();

        let numeric: Vec<Vec<Option<f64>>> = NUMERIC_FIELDS
            .iter()
            .map(|spec| float_column(df, spec.name))
            .collect::<Result<_>>()?;

        let categorical: Vec<Vec<Option<String>>> = CATEGORICAL_FIELDS
            .iter()
            .map(|spec| string_column(df, spec.name))
            .collect::<Result<_>>()?;

        let rows = (0..n)
            .map(|i| RawRow {
                numeric: numeric.iter().map(|col| col[i]).collect(),
                categorical: categorical.iter().map(|col| col[i].clone()).collect(),
            })
            .collect();

        debug!(rows = n, columns = df.width(), "Extracted historical columns");
        Self::new(rows, labels)
    }
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = df
        .column(name)
        .map_err(|_| ExplainerError::DataError(format!("missing column {}", name)))?
        .as_materialized_series()
        .cast(&DataType::Float64)?;
    Ok(series
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect())
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let series = df
        .column(name)
        .map_err(|_| ExplainerError::DataError(format!("missing column {}", name)))?
        .as_materialized_series()
        .cast(&DataType::String)?;
    Ok(series
        .str()?
        .into_iter()
        .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(String::from))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "\
BAD,LOAN,MORTDUE,VALUE,REASON,JOB,YOJ,DEROG,DELINQ,CLAGE,NINQ,CLNO,DEBTINC
1,1100,25860,39025,HomeImp,Other,10.5,0,0,94.36,1,9,
1,1300,70053,68400,HomeImp,Other,7,0,2,121.83,0,14,
0,1700,97800,112000,HomeImp,Office,3,0,0,93.33,0,14,
,1800,48649,57037,,,5,,,77.1,1,17,
0,2000,64536,87400,DebtCon,Mgr,2.5,0,0,147.13,0,24,40.2
";

    #[test]
    fn test_load_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();

        let ds = HistoricalDataset::load_csv(file.path()).unwrap();
        assert_eq!(ds.len(), 5);
        assert_eq!(ds.labels, vec![Some(1), Some(1), Some(0), None, Some(0)]);

        // numeric order follows NUMERIC_FIELDS, not file order
        assert_eq!(ds.rows[0].numeric[0], Some(1100.0));
        assert_eq!(ds.rows[0].numeric[3], Some(10.5));
        assert_eq!(ds.rows[0].numeric[9], None);
        assert_eq!(ds.rows[4].numeric[9], Some(40.2));
        assert_eq!(ds.rows[4].categorical, vec![Some("DebtCon".to_string()), Some("Mgr".to_string())]);
        assert_eq!(ds.rows[3].categorical, vec![None, None]);
    }

    #[test]
    fn test_labeled_drops_missing_outcomes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        let ds = HistoricalDataset::load_csv(file.path()).unwrap();
        let (rows, labels) = ds.labeled();
        assert_eq!(rows.len(), 4);
        assert_eq!(labels, vec![1, 1, 0, 0]);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"BAD,LOAN\n1,1000\n").unwrap();
        let err = HistoricalDataset::load_csv(file.path()).unwrap_err();
        assert!(err.to_string().contains("MORTDUE"));
    }

    #[test]
    fn test_missing_file_is_artifact_error() {
        assert!(matches!(
            HistoricalDataset::load_csv("/nonexistent/hmeq.csv"),
            Err(ExplainerError::ArtifactError { .. })
        ));
    }
}
