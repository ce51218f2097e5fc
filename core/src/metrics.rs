//! Per-class classification scores
//!
//! One row per class seen in either the truth or the predictions, plus the
//! unweighted (macro) and support-weighted averages. A ratio with a zero
//! denominator scores 0.

use crate::labels::{describe, Label, LabelMapping};
use ndarray::Array1;
use serde::Serialize;
use std::collections::BTreeSet;

/// Scores of a single class
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassMetrics {
    pub label: usize,
    /// Category name for textual targets, the label otherwise
    pub name: String,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    /// Held-out rows whose true class is this one
    pub support: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AveragedMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub macro_avg: AveragedMetrics,
    pub weighted_avg: AveragedMetrics,
}

impl ClassificationReport {
    /// Score `predicted` against `truth`, row by row
    pub fn from_predictions(
        truth: &Array1<usize>,
        predicted: &Array1<usize>,
        mapping: Option<&LabelMapping>,
    ) -> Self {
        let labels: BTreeSet<usize> = truth.iter().chain(predicted.iter()).copied().collect();

        let classes: Vec<ClassMetrics> = labels
            .into_iter()
            .map(|label| class_metrics(label, truth, predicted, mapping))
            .collect();

        Self {
            macro_avg: macro_average(&classes),
            weighted_avg: weighted_average(&classes),
            classes,
        }
    }
}

fn class_metrics(
    label: usize,
    truth: &Array1<usize>,
    predicted: &Array1<usize>,
    mapping: Option<&LabelMapping>,
) -> ClassMetrics {
    let mut true_pos = 0;
    let mut false_pos = 0;
    let mut false_neg = 0;
    for (&actual, &guess) in truth.iter().zip(predicted.iter()) {
        match (actual == label, guess == label) {
            (true, true) => true_pos += 1,
            (false, true) => false_pos += 1,
            (true, false) => false_neg += 1,
            (false, false) => {}
        }
    }

    let precision = ratio(true_pos, true_pos + false_pos);
    let recall = ratio(true_pos, true_pos + false_neg);
    ClassMetrics {
        label,
        name: describe(mapping, Label(label)),
        precision,
        recall,
        f1_score: harmonic_mean(precision, recall),
        support: true_pos + false_neg,
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn harmonic_mean(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

fn macro_average(classes: &[ClassMetrics]) -> AveragedMetrics {
    if classes.is_empty() {
        return AveragedMetrics::default();
    }
    let n = classes.len() as f64;
    AveragedMetrics {
        precision: classes.iter().map(|c| c.precision).sum::<f64>() / n,
        recall: classes.iter().map(|c| c.recall).sum::<f64>() / n,
        f1_score: classes.iter().map(|c| c.f1_score).sum::<f64>() / n,
    }
}

fn weighted_average(classes: &[ClassMetrics]) -> AveragedMetrics {
    let total: usize = classes.iter().map(|c| c.support).sum();
    if total == 0 {
        return AveragedMetrics::default();
    }
    AveragedMetrics {
        precision: weighted_by_support(classes, total, |c| c.precision),
        recall: weighted_by_support(classes, total, |c| c.recall),
        f1_score: weighted_by_support(classes, total, |c| c.f1_score),
    }
}

fn weighted_by_support(
    classes: &[ClassMetrics],
    total: usize,
    score: impl Fn(&ClassMetrics) -> f64,
) -> f64 {
    classes
        .iter()
        .map(|c| score(c) * c.support as f64)
        .sum::<f64>()
        / total as f64
}
