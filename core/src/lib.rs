//! Pumpwise Core
//!
//! Irrigation pump control from soil and air readings. Two classifiers are
//! trained once from a historical dataset; at runtime each reading is
//! scaled, classified by both, and the faster classifier's answer decides
//! whether the pump runs.
//!
//! - `dataset`, `scaler`, `classifier`, `training`, `metrics`: offline calibration
//!   producing a frozen [`TrainedBundle`]
//! - `arbiter`: latency race between the two classifiers
//! - `protocol`, `device`: serial line protocol and connection
//! - `acquisition`, `session`, `operator`, `signal`: the runtime loop

pub mod acquisition;
pub mod arbiter;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod device;
pub mod error;
pub mod labels;
pub mod metrics;
pub mod operator;
pub mod protocol;
pub mod reading;
pub mod scaler;
pub mod session;
pub mod signal;
pub mod training;

pub use acquisition::{AcquisitionLoop, CycleOutcome, LoopState};
pub use arbiter::{Decision, PredictionArbiter, Verdict, Winner};
pub use classifier::{Classifier, ClassifierPair};
pub use config::{ConfigOverrides, PumpwiseConfig};
pub use dataset::TrainingSet;
pub use device::{DeviceConnector, DeviceLink, SerialConnector};
pub use error::{Error, ParseError, Result};
pub use labels::{Label, LabelMapping};
pub use metrics::{AveragedMetrics, ClassMetrics, ClassificationReport};
pub use operator::{Event, Operator};
pub use protocol::MotorCommand;
pub use reading::{Reading, StandardizedReading};
pub use scaler::StandardScaler;
pub use session::Session;
pub use signal::{InterruptAction, StopSignal};
pub use training::{ModelEvaluation, TrainedBundle};

/// Load the dataset and train both classifiers
pub fn calibrate(config: &PumpwiseConfig) -> Result<TrainedBundle> {
    let set = dataset::load_csv(&config.dataset)?;
    training::train(&set, &config.training)
}
