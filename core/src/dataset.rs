//! Historical dataset loading
//!
//! Reads the CSV export, checks the required header, remaps a textual target
//! column through a [`LabelMapping`] and drops rows with any missing value.

use crate::config::DatasetConfig;
use crate::error::{Error, Result};
use crate::labels::{Label, LabelMapping};
use crate::reading::FEATURE_COUNT;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Cleaned training data
#[derive(Debug, Clone)]
pub struct TrainingSet {
    /// One row per sample: moisture, temperature, humidity
    pub features: Array2<f64>,
    pub labels: Array1<usize>,
    /// Present when the target column held category strings
    pub mapping: Option<LabelMapping>,
    /// Rows read from the file before cleaning
    pub total_rows: usize,
    /// Rows removed because a required value was missing
    pub dropped_rows: usize,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Distinct labels present after cleaning, ascending
    pub fn classes(&self) -> Vec<Label> {
        let mut classes: Vec<Label> = self.labels.iter().map(|&l| Label(l)).collect();
        classes.sort();
        classes.dedup();
        classes
    }
}

/// Load the dataset file described by `config`
pub fn load_csv(config: &DatasetConfig) -> Result<TrainingSet> {
    let path = config.path.as_path();
    if !path.exists() {
        return Err(Error::DatasetNotFound(path.to_path_buf()));
    }
    info!("Loading historical dataset from {}", path.display());

    let frame = read_frame(path)?;
    debug!("Columns available in CSV: {:?}", frame.get_column_names());
    from_frame(&frame, config)
}

fn read_frame(path: &Path) -> Result<DataFrame> {
    let frame = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(frame)
}

/// Build a training set from an already parsed frame
pub fn from_frame(frame: &DataFrame, config: &DatasetConfig) -> Result<TrainingSet> {
    let expected = config.required_columns();
    let present = frame.get_column_names();
    let missing: Vec<String> = expected
        .iter()
        .filter(|c| !present.iter().any(|p| *p == c.as_str()))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingColumns { missing, expected });
    }

    let mut columns: Vec<Vec<Option<f64>>> = Vec::with_capacity(FEATURE_COUNT);
    for name in config.feature_columns() {
        columns.push(numeric_column(frame, name)?);
    }

    let (targets, mapping) = target_column(frame, &config.target_column)?;
    if let Some(mapping) = &mapping {
        info!("Target column '{}' mapped to: {}", config.target_column, mapping);
    } else {
        info!(
            "Target column '{}' is already numeric, no mapping needed",
            config.target_column
        );
    }

    let total_rows = frame.height();
    let mut flat = Vec::with_capacity(total_rows * FEATURE_COUNT);
    let mut labels = Vec::with_capacity(total_rows);

    for row in 0..total_rows {
        let values = [columns[0][row], columns[1][row], columns[2][row]];
        match (values, targets[row]) {
            ([Some(m), Some(t), Some(h)], Some(label)) => {
                flat.extend_from_slice(&[m, t, h]);
                labels.push(label);
            }
            _ => debug!("Dropping row {} with missing values", row),
        }
    }

    let kept = labels.len();
    let dropped_rows = total_rows - kept;
    info!(
        "Dataset size after dropping incomplete rows: {} of {} ({} dropped)",
        kept, total_rows, dropped_rows
    );
    if kept == 0 {
        return Err(Error::Dataset(
            "no complete rows left after dropping missing values".to_string(),
        ));
    }

    let features = Array2::from_shape_vec((kept, FEATURE_COUNT), flat)
        .map_err(|e| Error::Dataset(e.to_string()))?;

    Ok(TrainingSet {
        features,
        labels: Array1::from(labels),
        mapping,
        total_rows,
        dropped_rows,
    })
}

fn numeric_column(frame: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let series = frame.column(name)?;
    if !series.dtype().is_numeric() {
        return Err(Error::Dataset(format!(
            "column '{}' must be numeric, found {}",
            name,
            series.dtype()
        )));
    }
    let values = series.cast(&DataType::Float64)?;
    let values = values.f64()?.into_iter().map(|v| v.filter(|x| !x.is_nan())).collect();
    Ok(values)
}

type TargetValues = (Vec<Option<usize>>, Option<LabelMapping>);

fn target_column(frame: &DataFrame, name: &str) -> Result<TargetValues> {
    let series = frame.column(name)?;

    if matches!(series.dtype(), DataType::String) {
        let values = series.str()?;
        let mapping = LabelMapping::from_values(values.into_iter().flatten());
        let labels = values
            .into_iter()
            .map(|v| v.and_then(|s| mapping.encode(s)).map(Label::value))
            .collect();
        return Ok((labels, Some(mapping)));
    }

    if !series.dtype().is_numeric() {
        return Err(Error::Dataset(format!(
            "target column '{}' must be numeric or text, found {}",
            name,
            series.dtype()
        )));
    }

    let values = series.cast(&DataType::Float64)?;
    let labels = values
        .f64()?
        .into_iter()
        .map(|v| match v {
            Some(x) if x.is_nan() => Ok(None),
            Some(x) if x >= 0.0 && x.fract() == 0.0 => Ok(Some(x as usize)),
            Some(x) => Err(Error::InvalidTarget {
                column: name.to_string(),
                value: x.to_string(),
            }),
            None => Ok(None),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((labels, None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "Soil Moisture,Temperature,Air Humidity,Pump Data";

    fn write_csv(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "{}", body).unwrap();
        file
    }

    fn config_for(file: &tempfile::NamedTempFile) -> DatasetConfig {
        DatasetConfig {
            path: file.path().to_path_buf(),
            ..Default::default()
        }
    }

    #[test]
    fn test_load_textual_target() {
        let file = write_csv(&format!(
            "{}\n600,28.5,70,ON\n200,31.0,40,OFF\n650,27.0,75,ON\n",
            HEADER
        ));
        let set = load_csv(&config_for(&file)).unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(set.labels.to_vec(), vec![0, 1, 0]);
        let mapping = set.mapping.unwrap();
        assert_eq!(mapping.decode(Label(0)), Some("ON"));
        assert_eq!(mapping.decode(Label(1)), Some("OFF"));
        assert_eq!(set.features.row(1).to_vec(), vec![200.0, 31.0, 40.0]);
    }

    #[test]
    fn test_numeric_target_used_directly() {
        let file = write_csv(&format!("{}\n600,28.5,70,1\n200,31.0,40,0\n", HEADER));
        let set = load_csv(&config_for(&file)).unwrap();

        assert!(set.mapping.is_none());
        assert_eq!(set.labels.to_vec(), vec![1, 0]);
        assert_eq!(set.classes(), vec![Label(0), Label(1)]);
    }

    #[test]
    fn test_rows_with_missing_values_are_dropped() {
        let file = write_csv(&format!(
            "{}\n600,28.5,70,1\n,30.0,50,0\n300,,45,0\n250,29.0,44,\n200,31.0,40,0\n",
            HEADER
        ));
        let set = load_csv(&config_for(&file)).unwrap();

        assert_eq!(set.total_rows, 5);
        assert_eq!(set.dropped_rows, 3);
        assert_eq!(set.labels.to_vec(), vec![1, 0]);
        assert_eq!(set.features.row(1).to_vec(), vec![200.0, 31.0, 40.0]);
    }

    #[test]
    fn test_missing_columns_are_named() {
        let file = write_csv("Soil Moisture,Temperature,Pump Data\n600,28.5,1\n");
        let err = load_csv(&config_for(&file)).unwrap_err();

        match err {
            Error::MissingColumns { missing, expected } => {
                assert_eq!(missing, vec!["Air Humidity".to_string()]);
                assert_eq!(expected.len(), 4);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let config = DatasetConfig {
            path: "/nonexistent/download.csv".into(),
            ..Default::default()
        };
        assert!(matches!(load_csv(&config), Err(Error::DatasetNotFound(_))));
    }

    #[test]
    fn test_negative_numeric_target_rejected() {
        let file = write_csv(&format!("{}\n600,28.5,70,-1\n", HEADER));
        assert!(matches!(
            load_csv(&config_for(&file)),
            Err(Error::InvalidTarget { .. })
        ));
    }
}
