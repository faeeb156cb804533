// src/training/tree_classifier.rs
//
// Classifier backed by a CART decision tree (linfa-trees, Gini splits).
//
// Rows are encoded as dense f64 records: numeric features pass through, the
// curve type is mapped to a fixed ordinal. Labels are 0 (rejected) and
// 1 (matches). A gesture without samples gets a model that answers
// `Classification::Untrained`.

use super::classifier::{Classification, Classifier, TrainedModel, TrainingDataset};
use crate::matching::FeatureValue;
use crate::types::CurveType;
use anyhow::anyhow;
use linfa::prelude::*;
use linfa_trees::DecisionTree;
use ndarray::{Array1, Array2};
use std::fmt;
use tracing::{debug, warn};

const MATCH_LABEL: usize = 1;

fn curve_ordinal(curve_type: CurveType) -> f64 {
    match curve_type {
        CurveType::Loop => 0.0,
        CurveType::Arch => 1.0,
        CurveType::Cusp => 2.0,
        CurveType::Serpentine => 3.0,
        CurveType::Line => 4.0,
        CurveType::Quadratic => 5.0,
    }
}

fn encode(value: &FeatureValue) -> f64 {
    match *value {
        FeatureValue::Number(v) => v,
        FeatureValue::Category(curve_type) => curve_ordinal(curve_type),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TreeClassifier {
    /// Unlimited when None.
    max_depth: Option<usize>,
}

impl TreeClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth: Some(max_depth),
        }
    }
}

impl Classifier for TreeClassifier {
    fn train(&self, dataset: &TrainingDataset<'_>) -> anyhow::Result<Box<dyn TrainedModel>> {
        let width = dataset.features.len();
        if dataset.is_empty() {
            return Ok(Box::new(TreeModel {
                tree: None,
                width,
                samples: 0,
            }));
        }

        let values: Vec<f64> = dataset
            .samples
            .iter()
            .flat_map(|sample| sample.values.iter().map(encode))
            .collect();
        let records = Array2::from_shape_vec((dataset.samples.len(), width), values)?;
        let targets: Array1<usize> = dataset
            .samples
            .iter()
            .map(|sample| usize::from(sample.matches))
            .collect();

        let tree = DecisionTree::params()
            .max_depth(self.max_depth)
            .fit(&Dataset::new(records, targets))
            .map_err(|e| anyhow!("decision tree training failed: {}", e))?;
        debug!(
            "Trained decision tree on {} rows x {} features",
            dataset.samples.len(),
            width
        );

        Ok(Box::new(TreeModel {
            tree: Some(tree),
            width,
            samples: dataset.samples.len(),
        }))
    }
}

pub struct TreeModel {
    tree: Option<DecisionTree<f64, usize>>,
    width: usize,
    samples: usize,
}

impl fmt::Debug for TreeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeModel")
            .field("trained", &self.tree.is_some())
            .field("width", &self.width)
            .field("samples", &self.samples)
            .finish()
    }
}

impl TrainedModel for TreeModel {
    fn classify(&self, row: &[FeatureValue]) -> Classification {
        let Some(tree) = &self.tree else {
            return Classification::Untrained;
        };

        let values: Vec<f64> = row.iter().map(encode).collect();
        let record = match Array2::from_shape_vec((1, self.width), values) {
            Ok(record) => record,
            Err(e) => {
                warn!("Row of {} values does not fit the tree: {}", row.len(), e);
                return Classification::Label(false);
            }
        };

        let prediction = tree.predict(&record);
        Classification::Label(prediction.get(0) == Some(&MATCH_LABEL))
    }

    fn describe(&self) -> String {
        match &self.tree {
            Some(tree) => format!(
                "depth {}, {} leaves, {} samples",
                tree.max_depth(),
                tree.num_leaves(),
                self.samples
            ),
            None => "untrained".to_string(),
        }
    }
}
