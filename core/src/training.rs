//! Offline calibration
//!
//! Turns a cleaned [`TrainingSet`] into a frozen [`TrainedBundle`]: fitted
//! scaler, both classifiers and the label mapping. The bundle is never
//! mutated after this step.

use crate::classifier::{Classifier, ClassifierPair, KnnClassifier, TreeClassifier};
use crate::config::TrainingConfig;
use crate::dataset::TrainingSet;
use crate::error::{Error, Result};
use crate::labels::LabelMapping;
use crate::metrics::ClassificationReport;
use crate::scaler::StandardScaler;
use linfa::prelude::*;
use ndarray::{Array1, Array2, Axis};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Serialize;
use tracing::{debug, info};

/// Held-out scores of one classifier
#[derive(Debug, Clone, Serialize)]
pub struct ModelEvaluation {
    pub model: String,
    pub accuracy: f32,
    /// Precision, recall and F1 per class, with macro and weighted averages
    #[serde(flatten)]
    pub report: ClassificationReport,
    pub test_samples: usize,
    /// Rendered confusion matrix
    pub confusion: String,
}

/// Everything the runtime loop needs, read-only
#[derive(Debug)]
pub struct TrainedBundle {
    pub scaler: StandardScaler,
    pub classifiers: ClassifierPair,
    pub mapping: Option<LabelMapping>,
    pub evaluations: Vec<ModelEvaluation>,
    pub training_samples: usize,
    pub test_samples: usize,
}

/// Row indices of a seeded shuffle split
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle `0..n` and hold out `ceil(n * test_fraction)` rows
pub fn split_indices(n: usize, test_fraction: f64, seed: u64) -> Result<Split> {
    let test_len = (n as f64 * test_fraction).ceil() as usize;
    if test_len == 0 || test_len >= n {
        return Err(Error::Training {
            model: "dataset".to_string(),
            reason: format!(
                "cannot split {} samples with test fraction {}",
                n, test_fraction
            ),
        });
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let train = indices.split_off(test_len);
    Ok(Split {
        train,
        test: indices,
    })
}

/// Fit the scaler, split, train both classifiers and score them
pub fn train(set: &TrainingSet, config: &TrainingConfig) -> Result<TrainedBundle> {
    let scaler = StandardScaler::fit(&set.features)?;
    debug!(
        "Scaler fitted: mean {:?}, std {:?}",
        scaler.mean(),
        scaler.std()
    );
    let scaled = scaler.transform(&set.features);

    let split = split_indices(set.len(), config.test_fraction, config.random_seed)?;
    let train_x = scaled.select(Axis(0), &split.train);
    let train_y = set.labels.select(Axis(0), &split.train);
    let test_x = scaled.select(Axis(0), &split.test);
    let test_y = set.labels.select(Axis(0), &split.test);

    info!(
        "Training set: {} samples, test set: {} samples, classes: {:?}",
        train_y.len(),
        test_y.len(),
        set.classes()
    );

    let knn = KnnClassifier::fit(&train_x, &train_y, config.knn_neighbors)?;
    let tree = TreeClassifier::fit(&train_x, &train_y, config.tree_max_depth)?;

    let evaluations = vec![
        evaluate(&knn, &test_x, &test_y, set.mapping.as_ref())?,
        evaluate(&tree, &test_x, &test_y, set.mapping.as_ref())?,
    ];
    for evaluation in &evaluations {
        info!(
            "{} accuracy on held-out data: {:.2}",
            evaluation.model, evaluation.accuracy
        );
    }

    Ok(TrainedBundle {
        scaler,
        classifiers: ClassifierPair::new(Box::new(knn), Box::new(tree)),
        mapping: set.mapping.clone(),
        evaluations,
        training_samples: train_y.len(),
        test_samples: test_y.len(),
    })
}

/// Score `model` against held-out rows
pub fn evaluate(
    model: &dyn Classifier,
    test_x: &Array2<f64>,
    test_y: &Array1<usize>,
    mapping: Option<&LabelMapping>,
) -> Result<ModelEvaluation> {
    let predicted = model.predict_batch(test_x)?;
    let truth = Dataset::new(test_x.clone(), test_y.clone());
    let cm = predicted
        .confusion_matrix(&truth)
        .map_err(|e| Error::Training {
            model: model.name().to_string(),
            reason: format!("evaluation failed: {}", e),
        })?;

    Ok(ModelEvaluation {
        model: model.name().to_string(),
        accuracy: cm.accuracy(),
        report: ClassificationReport::from_predictions(test_y, &predicted, mapping),
        test_samples: test_y.len(),
        confusion: format!("{:?}", cm),
    })
}
