//! Classifiers
//!
//! Both classifiers share one contract: standardized features in, a label
//! out. Their learned parameters are fixed at construction and every
//! prediction borrows them immutably.

pub mod knn;
pub mod tree;

pub use knn::KnnClassifier;
pub use tree::TreeClassifier;

use crate::error::Result;
use crate::labels::Label;
use crate::reading::StandardizedReading;
use ndarray::{Array1, Array2};

/// A trained predictor
pub trait Classifier: Send + Sync {
    /// Display name used in reports
    fn name(&self) -> &str;

    /// Classify one standardized reading
    fn predict(&self, reading: &StandardizedReading) -> Result<Label>;

    /// Classify every row of a standardized feature matrix
    fn predict_batch(&self, records: &Array2<f64>) -> Result<Array1<usize>> {
        records
            .rows()
            .into_iter()
            .map(|row| {
                self.predict(&StandardizedReading::new(row.to_owned()))
                    .map(Label::value)
            })
            .collect()
    }
}

/// The two classifiers raced by the arbiter, in call order
pub struct ClassifierPair {
    pub first: Box<dyn Classifier>,
    pub second: Box<dyn Classifier>,
}

impl ClassifierPair {
    pub fn new(first: Box<dyn Classifier>, second: Box<dyn Classifier>) -> Self {
        Self { first, second }
    }
}

impl std::fmt::Debug for ClassifierPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierPair")
            .field("first", &self.first.name())
            .field("second", &self.second.name())
            .finish()
    }
}
