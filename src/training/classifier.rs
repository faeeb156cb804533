// src/training/classifier.rs
//
// Seam for the secondary classifier (a decision-tree learner in practice).
// The crate only defines the contract; the learner itself is supplied by the
// embedding application.

use super::store::TrainingSample;
use crate::matching::{FeatureKind, FeatureName, FeatureValue};
use std::fmt;

/// Name of the label column in every dataset.
pub const TARGET_COLUMN: &str = "matches";

/// Answer of a trained model for one feature row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Label(bool),
    /// The model was trained without data and has no opinion.
    Untrained,
}

pub trait TrainedModel: Send + Sync + fmt::Debug {
    fn classify(&self, row: &[FeatureValue]) -> Classification;

    /// Human-readable dump of the model, logged after training.
    fn describe(&self) -> String {
        format!("{:?}", self)
    }
}

/// Training input for one gesture: its reduced feature columns, their kinds,
/// and the labeled rows.
#[derive(Debug, Clone)]
pub struct TrainingDataset<'a> {
    pub samples: &'a [TrainingSample],
    pub features: &'a [FeatureName],
    pub feature_kinds: Vec<FeatureKind>,
    pub target: &'static str,
}

impl<'a> TrainingDataset<'a> {
    pub fn new(samples: &'a [TrainingSample], features: &'a [FeatureName]) -> Self {
        Self {
            samples,
            features,
            feature_kinds: features.iter().map(FeatureName::kind).collect(),
            target: TARGET_COLUMN,
        }
    }

    pub fn column_of(&self, name: FeatureName) -> Option<usize> {
        self.features.iter().position(|&f| f == name)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

pub trait Classifier {
    /// Produce a model for `dataset`. An empty dataset must still yield a
    /// model, one that answers `Classification::Untrained`.
    fn train(&self, dataset: &TrainingDataset<'_>) -> anyhow::Result<Box<dyn TrainedModel>>;
}
