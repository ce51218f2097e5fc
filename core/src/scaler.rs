//! Z-score feature scaling

use crate::error::{Error, Result};
use crate::reading::{Reading, StandardizedReading, FEATURE_COUNT};
use ndarray::{Array1, Array2, Axis};

/// Per-feature mean and population standard deviation
///
/// Fitted once from the cleaned dataset. Columns with zero spread are
/// divided by 1 so constant features map to 0.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Array1<f64>,
    std: Array1<f64>,
}

impl StandardScaler {
    pub fn fit(features: &Array2<f64>) -> Result<Self> {
        if features.ncols() != FEATURE_COUNT {
            return Err(Error::Dataset(format!(
                "scaler expects {} feature columns, got {}",
                FEATURE_COUNT,
                features.ncols()
            )));
        }
        let mean = features
            .mean_axis(Axis(0))
            .ok_or_else(|| Error::Dataset("cannot fit scaler on an empty dataset".into()))?;
        let std = features
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s == 0.0 { 1.0 } else { s });

        Ok(Self { mean, std })
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn std(&self) -> &Array1<f64> {
        &self.std
    }

    /// Scale a whole feature matrix (rows are samples)
    pub fn transform(&self, features: &Array2<f64>) -> Array2<f64> {
        (features - &self.mean) / &self.std
    }

    pub fn transform_reading(&self, reading: &Reading) -> StandardizedReading {
        let raw = Array1::from(reading.features().to_vec());
        StandardizedReading::new((raw - &self.mean) / &self.std)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_fit_uses_population_statistics() {
        let features = array![[1.0, 10.0, 5.0], [3.0, 20.0, 5.0]];
        let scaler = StandardScaler::fit(&features).unwrap();

        assert_eq!(scaler.mean(), &array![2.0, 15.0, 5.0]);
        // ddof = 0; the constant humidity column falls back to 1
        assert_eq!(scaler.std(), &array![1.0, 5.0, 1.0]);
    }

    #[test]
    fn test_transform_reading_matches_matrix_transform() {
        let features = array![
            [500.0, 25.0, 60.0],
            [700.0, 30.0, 80.0],
            [300.0, 20.0, 40.0]
        ];
        let scaler = StandardScaler::fit(&features).unwrap();

        let scaled = scaler.transform(&features);
        let single = scaler.transform_reading(&Reading::new(700.0, 30.0, 80.0));
        assert_eq!(single.values(), &scaled.row(1).to_owned());

        let column_means = scaled.mean_axis(Axis(0)).unwrap();
        for m in column_means.iter() {
            assert!(m.abs() < 1e-12);
        }
    }

    #[test]
    fn test_fit_rejects_empty_and_wrong_width() {
        let empty = Array2::<f64>::zeros((0, 3));
        assert!(StandardScaler::fit(&empty).is_err());

        let narrow = array![[1.0, 2.0]];
        assert!(StandardScaler::fit(&narrow).is_err());
    }
}
