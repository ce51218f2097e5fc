//! Decision tree classifier

use super::Classifier;
use crate::error::{Error, Result};
use crate::labels::Label;
use crate::reading::StandardizedReading;
use linfa::prelude::*;
use linfa_trees::DecisionTree;
use ndarray::{Array1, Array2};
use tracing::info;

const NAME: &str = "Decision Tree";

#[derive(Debug, Clone)]
pub struct TreeClassifier {
    model: DecisionTree<f64, usize>,
}

impl TreeClassifier {
    /// Fit a CART tree; `max_depth = None` grows until leaves are pure
    pub fn fit(
        features: &Array2<f64>,
        labels: &Array1<usize>,
        max_depth: Option<usize>,
    ) -> Result<Self> {
        if features.nrows() != labels.len() {
            return Err(training_error(format!(
                "features and labels must have same number of samples: {} vs {}",
                features.nrows(),
                labels.len()
            )));
        }
        if features.is_empty() {
            return Err(training_error("features cannot be empty"));
        }

        let dataset = Dataset::new(features.clone(), labels.clone());
        let model = DecisionTree::params()
            .max_depth(max_depth)
            .fit(&dataset)
            .map_err(|e| training_error(e.to_string()))?;

        info!(
            "Fitted decision tree on {} samples (depth {}, {} leaves)",
            features.nrows(),
            model.max_depth(),
            model.num_leaves()
        );
        Ok(Self { model })
    }
}

impl Classifier for TreeClassifier {
    fn name(&self) -> &str {
        NAME
    }

    fn predict(&self, reading: &StandardizedReading) -> Result<Label> {
        let predictions = self.model.predict(&reading.as_row());
        predictions
            .get(0)
            .map(|&label| Label(label))
            .ok_or_else(|| Error::Prediction {
                model: NAME.to_string(),
                reason: "model returned no prediction".to_string(),
            })
    }

    fn predict_batch(&self, records: &Array2<f64>) -> Result<Array1<usize>> {
        Ok(self.model.predict(records))
    }
}

fn training_error(reason: impl Into<String>) -> Error {
    Error::Training {
        model: NAME.to_string(),
        reason: reason.into(),
    }
}
