//! Sensor readings

use ndarray::{Array1, Array2};
use std::fmt;

/// Number of features in a reading
pub const FEATURE_COUNT: usize = 3;

/// One raw sample from the soil probe and the air sensor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Soil moisture, raw probe units (0-1000)
    pub moisture: f64,
    /// Air temperature in °C
    pub temperature: f64,
    /// Relative air humidity in %
    pub humidity: f64,
}

impl Reading {
    pub fn new(moisture: f64, temperature: f64, humidity: f64) -> Self {
        Self {
            moisture,
            temperature,
            humidity,
        }
    }

    /// Features in model order
    pub fn features(&self) -> [f64; FEATURE_COUNT] {
        [self.moisture, self.temperature, self.humidity]
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "moisture {:.2}, temperature {:.2} °C, humidity {:.2}%",
            self.moisture, self.temperature, self.humidity
        )
    }
}

/// A reading expressed in the scaler's coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct StandardizedReading(Array1<f64>);

impl StandardizedReading {
    pub fn new(values: Array1<f64>) -> Self {
        debug_assert_eq!(values.len(), FEATURE_COUNT);
        Self(values)
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.0
    }

    /// Single-row matrix, the shape batch predictors expect
    pub fn as_row(&self) -> Array2<f64> {
        self.0.clone().insert_axis(ndarray::Axis(0))
    }
}
