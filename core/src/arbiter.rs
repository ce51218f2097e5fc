//! Prediction arbiter
//!
//! Runs both classifiers on the same reading, times each call and keeps the
//! label of whichever answered first. An exact tie keeps the second
//! classifier's answer.

use crate::classifier::ClassifierPair;
use crate::error::Result;
use crate::labels::Label;
use crate::reading::StandardizedReading;
use std::time::{Duration, Instant};
use tracing::debug;

/// Which member of the pair produced the chosen label
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    First,
    Second,
}

/// Outcome of one arbitration
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub label: Label,
    pub winner: Winner,
    pub winner_name: String,
    pub first: Verdict,
    pub second: Verdict,
}

/// One classifier's answer and how long it took
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub name: String,
    pub label: Label,
    pub latency: Duration,
}

impl Decision {
    /// Pick between two timed verdicts; ties go to `second`
    pub fn from_verdicts(first: Verdict, second: Verdict) -> Self {
        let (winner, label, winner_name) = if first.latency < second.latency {
            (Winner::First, first.label, first.name.clone())
        } else {
            (Winner::Second, second.label, second.name.clone())
        };
        Self {
            label,
            winner,
            winner_name,
            first,
            second,
        }
    }

    pub fn winning_latency(&self) -> Duration {
        match self.winner {
            Winner::First => self.first.latency,
            Winner::Second => self.second.latency,
        }
    }
}

pub struct PredictionArbiter<'a> {
    pair: &'a ClassifierPair,
}

impl<'a> PredictionArbiter<'a> {
    pub fn new(pair: &'a ClassifierPair) -> Self {
        Self { pair }
    }

    /// Classify `reading` with both models
    ///
    /// A failing classifier fails the whole arbitration.
    pub fn decide(&self, reading: &StandardizedReading) -> Result<Decision> {
        let start = Instant::now();
        let first_label = self.pair.first.predict(reading)?;
        let first_latency = start.elapsed();

        let start = Instant::now();
        let second_label = self.pair.second.predict(reading)?;
        let second_latency = start.elapsed();

        let decision = Decision::from_verdicts(
            Verdict {
                name: self.pair.first.name().to_string(),
                label: first_label,
                latency: first_latency,
            },
            Verdict {
                name: self.pair.second.name().to_string(),
                label: second_label,
                latency: second_latency,
            },
        );
        debug!(
            "Arbitration: {} -> {} in {:?}, {} -> {} in {:?}, using {}",
            decision.first.name,
            decision.first.label,
            decision.first.latency,
            decision.second.name,
            decision.second.label,
            decision.second.latency,
            decision.winner_name
        );
        Ok(decision)
    }
}
