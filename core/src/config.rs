//! Configuration Management Module
//!
//! Layered configuration: built-in defaults, then an optional TOML file,
//! then `PUMPWISE__*` environment variables. CLI flags are applied on top by
//! the binary through [`PumpwiseConfig::apply_overrides`].

use crate::error::{Error, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "pumpwise.toml";

/// Environment variable prefix (`PUMPWISE__DEVICE__PORT=/dev/ttyUSB0`)
pub const ENV_PREFIX: &str = "PUMPWISE";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PumpwiseConfig {
    pub dataset: DatasetConfig,
    pub training: TrainingConfig,
    pub device: DeviceConfig,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
    /// Directory for daily-rolling log files; console only when unset
    pub log_dir: Option<PathBuf>,
}

impl Default for PumpwiseConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig::default(),
            training: TrainingConfig::default(),
            device: DeviceConfig::default(),
            log_level: "warn".to_string(),
            log_dir: None,
        }
    }
}

/// Dataset location and column names
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatasetConfig {
    pub path: PathBuf,
    pub moisture_column: String,
    pub temperature_column: String,
    pub humidity_column: String,
    pub target_column: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("download.csv"),
            moisture_column: "Soil Moisture".to_string(),
            temperature_column: "Temperature".to_string(),
            humidity_column: "Air Humidity".to_string(),
            target_column: "Pump Data".to_string(),
        }
    }
}

impl DatasetConfig {
    /// Feature columns in reading order: moisture, temperature, humidity
    pub fn feature_columns(&self) -> [&str; 3] {
        [
            self.moisture_column.as_str(),
            self.temperature_column.as_str(),
            self.humidity_column.as_str(),
        ]
    }

    /// Every column the dataset must carry, target last
    pub fn required_columns(&self) -> Vec<String> {
        let mut columns: Vec<String> = self
            .feature_columns()
            .iter()
            .map(|c| c.to_string())
            .collect();
        columns.push(self.target_column.clone());
        columns
    }
}

/// Classifier hyperparameters and split settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrainingConfig {
    /// Neighbours consulted by the KNN classifier
    pub knn_neighbors: usize,
    /// `None` grows the tree until leaves are pure
    pub tree_max_depth: Option<usize>,
    /// Fraction of rows held out for evaluation
    pub test_fraction: f64,
    pub random_seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            knn_neighbors: 5,
            tree_max_depth: None,
            test_fraction: 0.2,
            random_seed: 42,
        }
    }
}

/// Serial device settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeviceConfig {
    pub port: String,
    pub baud_rate: u32,
    pub read_timeout_ms: u64,
    /// Pause after opening the port before the first read
    pub settle_delay_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            port: default_port().to_string(),
            baud_rate: 115_200,
            read_timeout_ms: 1000,
            settle_delay_ms: 2000,
        }
    }
}

impl DeviceConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

#[cfg(windows)]
fn default_port() -> &'static str {
    "COM9"
}

#[cfg(not(windows))]
fn default_port() -> &'static str {
    "/dev/ttyUSB0"
}

/// Values supplied on the command line; `None` leaves the loaded value alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub dataset: Option<PathBuf>,
    pub port: Option<String>,
    pub baud_rate: Option<u32>,
    pub log_level: Option<String>,
}

impl PumpwiseConfig {
    /// Load configuration
    ///
    /// An explicit `path` must exist. Without one, `pumpwise.toml` in the
    /// working directory is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "config file '{}' does not exist",
                        path.display()
                    )));
                }
                info!("Loading configuration from {}", path.display());
                builder = builder.add_source(File::from(path).format(FileFormat::Toml));
            }
            None => {
                debug!("Looking for optional {}", DEFAULT_CONFIG_FILE);
                builder = builder.add_source(
                    File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
                );
            }
        }

        let config: PumpwiseConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string (no environment layer)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: PumpwiseConfig =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides and re-validate
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) -> Result<()> {
        if let Some(dataset) = overrides.dataset {
            self.dataset.path = dataset;
        }
        if let Some(port) = overrides.port {
            self.device.port = port;
        }
        if let Some(baud_rate) = overrides.baud_rate {
            self.device.baud_rate = baud_rate;
        }
        if let Some(log_level) = overrides.log_level {
            self.log_level = log_level;
        }
        self.validate()
    }

    /// Reject settings that would make training or the device link meaningless
    pub fn validate(&self) -> Result<()> {
        if self.training.knn_neighbors == 0 {
            return Err(Error::Config("training.knn_neighbors must be at least 1".into()));
        }
        let fraction = self.training.test_fraction;
        if !(fraction > 0.0 && fraction < 1.0) {
            return Err(Error::Config(format!(
                "training.test_fraction must be between 0 and 1 (exclusive), got {}",
                fraction
            )));
        }
        if self.training.tree_max_depth == Some(0) {
            return Err(Error::Config("training.tree_max_depth must be at least 1".into()));
        }
        if self.device.baud_rate == 0 {
            return Err(Error::Config("device.baud_rate must be non-zero".into()));
        }
        if self.device.port.trim().is_empty() {
            return Err(Error::Config("device.port must not be empty".into()));
        }

        let mut columns = self.dataset.required_columns();
        columns.sort();
        columns.dedup();
        if columns.len() != 4 {
            return Err(Error::Config(
                "dataset column names must be distinct".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_match_reference_setup() {
        let config = PumpwiseConfig::default();
        assert_eq!(config.device.baud_rate, 115_200);
        assert_eq!(config.device.read_timeout(), Duration::from_secs(1));
        assert_eq!(config.device.settle_delay(), Duration::from_secs(2));
        assert_eq!(config.training.knn_neighbors, 5);
        assert_eq!(config.training.random_seed, 42);
        assert_eq!(
            config.dataset.required_columns(),
            vec!["Soil Moisture", "Temperature", "Air Humidity", "Pump Data"]
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PumpwiseConfig::from_toml_str(
            r#"
log_level = "debug"

[device]
port = "COM3"

[training]
knn_neighbors = 3
"#,
        )
        .unwrap();

        assert_eq!(config.device.port, "COM3");
        assert_eq!(config.device.baud_rate, 115_200);
        assert_eq!(config.training.knn_neighbors, 3);
        assert_eq!(config.training.test_fraction, 0.2);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = PumpwiseConfig::default();
        config.training.knn_neighbors = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = PumpwiseConfig::default();
        config.training.test_fraction = 1.0;
        assert!(config.validate().is_err());

        let mut config = PumpwiseConfig::default();
        config.device.baud_rate = 0;
        assert!(config.validate().is_err());

        let mut config = PumpwiseConfig::default();
        config.dataset.target_column = "Temperature".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file_and_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[dataset]\npath = \"history.csv\"\n").unwrap();

        let mut config = PumpwiseConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.dataset.path, PathBuf::from("history.csv"));

        config
            .apply_overrides(ConfigOverrides {
                port: Some("/dev/ttyACM0".to_string()),
                baud_rate: Some(9600),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(config.device.port, "/dev/ttyACM0");
        assert_eq!(config.device.baud_rate, 9600);
        assert_eq!(config.dataset.path, PathBuf::from("history.csv"));
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let result = PumpwiseConfig::load(Some(Path::new("/nonexistent/pumpwise.toml")));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
