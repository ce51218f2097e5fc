//! K-Nearest Neighbours classifier using Linfa
//!
//! Majority vote over the `k` closest training samples (Euclidean distance).
//! Equal vote counts resolve to the smallest label.
//!
//! The ball tree is built once in [`KnnClassifier::fit`]. The index borrows
//! its points, so the training matrix is leaked for the life of the process;
//! a bundle is trained once per run.

use super::Classifier;
use crate::error::{Error, Result};
use crate::labels::Label;
use crate::reading::StandardizedReading;
use linfa_nn::{distance::L2Dist, BallTree, NearestNeighbour, NearestNeighbourIndex};
use ndarray::{Array1, Array2};
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

const NAME: &str = "KNN";

type Index = Box<dyn NearestNeighbourIndex<f64> + Send + Sync>;

pub struct KnnClassifier {
    k: usize,
    index: Index,
    labels: Array1<usize>,
}

impl KnnClassifier {
    /// Index the training samples
    pub fn fit(features: &Array2<f64>, labels: &Array1<usize>, k: usize) -> Result<Self> {
        if k == 0 {
            return Err(training_error("k must be at least 1"));
        }
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

        let points: &'static Array2<f64> = Box::leak(Box::new(features.clone()));
        let index = BallTree::new()
            .from_batch(points, L2Dist)
            .map_err(|e| training_error(format!("failed to build ball tree: {}", e)))?;

        info!("Fitted KNN with k={} on {} samples", k, features.nrows());
        Ok(Self {
            k,
            index,
            labels: labels.clone(),
        })
    }
}

impl fmt::Debug for KnnClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnnClassifier")
            .field("k", &self.k)
            .field("samples", &self.labels.len())
            .finish()
    }
}

impl Classifier for KnnClassifier {
    fn name(&self) -> &str {
        NAME
    }

    fn predict(&self, reading: &StandardizedReading) -> Result<Label> {
        let k = self.k.min(self.labels.len());
        let neighbors = self
            .index
            .k_nearest(reading.values().view(), k)
            .map_err(|e| prediction_error(format!("neighbour search failed: {}", e)))?;

        let mut votes: BTreeMap<usize, usize> = BTreeMap::new();
        for (_point, idx) in neighbors.iter() {
            *votes.entry(self.labels[*idx]).or_insert(0) += 1;
        }

        // BTreeMap iterates labels ascending; keep the first maximum
        let mut winner: Option<(usize, usize)> = None;
        for (label, count) in votes {
            if winner.map_or(true, |(_, best)| count > best) {
                winner = Some((label, count));
            }
        }

        winner
            .map(|(label, _)| Label(label))
            .ok_or_else(|| prediction_error("no neighbours found"))
    }
}

fn training_error(reason: impl Into<String>) -> Error {
    Error::Training {
        model: NAME.to_string(),
        reason: reason.into(),
    }
}

fn prediction_error(reason: impl Into<String>) -> Error {
    Error::Prediction {
        model: NAME.to_string(),
        reason: reason.into(),
    }
}
