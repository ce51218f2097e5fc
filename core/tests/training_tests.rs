//! Calibration Tests
//!
//! CSV on disk through to a bundle that classifies live readings:
//! - Incomplete rows are dropped before any statistics are taken
//! - Text targets keep their category names end to end
//! - Header problems name the missing columns

use pumpwise_core::acquisition::{AcquisitionLoop, CycleOutcome};
use pumpwise_core::config::{DatasetConfig, PumpwiseConfig};
use pumpwise_core::dataset::load_csv;
use pumpwise_core::labels::Label;
use pumpwise_core::operator::{Event, Operator};
use pumpwise_core::reading::Reading;
use pumpwise_core::signal::StopSignal;
use pumpwise_core::{calibrate, Error};
use std::io::{self, Write};
use std::path::Path;
use tempfile::TempDir;

const HEADER: &str = "Soil Moisture,Temperature,Air Humidity,Pump Data";

fn write_dataset(dir: &Path, rows: &[String]) -> std::path::PathBuf {
    let path = dir.join("download.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "{}", HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    path
}

// Dry soil runs the pump; dry days are also hot and arid
fn irrigation_rows(on: &str, off: &str) -> Vec<String> {
    (0..40)
        .map(|i| {
            let moisture = 100.0 + i as f64 * 20.0;
            let label = if moisture < 400.0 { on } else { off };
            format!(
                "{},{},{},{}",
                moisture,
                35.0 - moisture / 100.0,
                30.0 + moisture / 20.0,
                label
            )
        })
        .collect()
}

fn config_for(path: &Path) -> PumpwiseConfig {
    PumpwiseConfig {
        dataset: DatasetConfig {
            path: path.to_path_buf(),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[derive(Default)]
struct Recorder {
    events: Vec<Event>,
}

impl Operator for Recorder {
    fn ask(&mut self, _prompt: &str) -> io::Result<Option<String>> {
        Ok(None)
    }

    fn notify(&mut self, event: Event) {
        self.events.push(event);
    }
}

#[test]
fn test_incomplete_rows_do_not_affect_scaler() {
    let clean_dir = TempDir::new().unwrap();
    let mut rows = irrigation_rows("1", "0");
    let clean = config_for(&write_dataset(clean_dir.path(), &rows));

    rows.push("5000,,10,1".to_string());
    rows.push(",99,99,0".to_string());
    rows.push("5000,99,99,".to_string());
    let dirty_dir = TempDir::new().unwrap();
    let dirty = config_for(&write_dataset(dirty_dir.path(), &rows));

    let clean_set = load_csv(&clean.dataset).unwrap();
    let dirty_set = load_csv(&dirty.dataset).unwrap();
    assert_eq!(dirty_set.total_rows, 43);
    assert_eq!(dirty_set.dropped_rows, 3);
    assert_eq!(dirty_set.features, clean_set.features);

    let clean_bundle = calibrate(&clean).unwrap();
    let dirty_bundle = calibrate(&dirty).unwrap();
    assert_eq!(clean_bundle.scaler, dirty_bundle.scaler);
}

#[test]
fn test_text_targets_flow_to_operator() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(dir.path(), &irrigation_rows("ON", "OFF"));
    let bundle = calibrate(&config_for(&path)).unwrap();

    let mapping = bundle.mapping.as_ref().expect("text target is mapped");
    assert_eq!(mapping.encode("ON"), Some(Label(0)));
    assert_eq!(mapping.encode("OFF"), Some(Label(1)));

    let mut acquisition = AcquisitionLoop::new(&bundle, StopSignal::new());
    let mut operator = Recorder::default();
    let outcome = acquisition.run_manual_cycle(Reading::new(120.0, 33.8, 36.0), &mut operator);

    // "ON" was seen first, so it is label 0 and maps to MOTOR_OFF
    match outcome {
        CycleOutcome::Decided { decision, sent } => {
            assert_eq!(decision.label, Label(0));
            assert_eq!(sent, None);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    let outputs = operator.events.iter().find_map(|e| match e {
        Event::Decision { outputs, .. } => Some(outputs.clone()),
        _ => None,
    });
    assert_eq!(outputs, Some(["ON".to_string(), "ON".to_string()]));
}

#[test]
fn test_evaluations_cover_both_models() {
    let dir = TempDir::new().unwrap();
    let path = write_dataset(dir.path(), &irrigation_rows("1", "0"));
    let bundle = calibrate(&config_for(&path)).unwrap();

    assert_eq!(bundle.training_samples + bundle.test_samples, 40);
    assert_eq!(bundle.test_samples, 8);
    let names: Vec<&str> = bundle.evaluations.iter().map(|e| e.model.as_str()).collect();
    assert_eq!(names, vec!["KNN", "Decision Tree"]);
    for evaluation in &bundle.evaluations {
        assert!(evaluation.accuracy >= 0.75, "{:?}", evaluation);
    }
}

#[test]
fn test_missing_header_columns_are_named() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("download.csv");
    std::fs::write(&path, "Soil Moisture,Temperature,Pump Data\n1,2,1\n").unwrap();

    match calibrate(&config_for(&path)) {
        Err(Error::MissingColumns { missing, expected }) => {
            assert_eq!(missing, vec!["Air Humidity".to_string()]);
            assert_eq!(expected.len(), 4);
        }
        other => panic!("unexpected result: {:?}", other.map(|_| ())),
    }
}

#[test]
fn test_missing_dataset_file() {
    let dir = TempDir::new().unwrap();
    let result = calibrate(&config_for(&dir.path().join("absent.csv")));
    assert!(matches!(result, Err(Error::DatasetNotFound(_))));
}
