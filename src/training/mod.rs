// src/training/mod.rs

mod check;
mod classifier;
mod store;
mod tree_classifier;

pub use check::SampleStoreCheck;
pub use classifier::{Classification, Classifier, TrainedModel, TrainingDataset, TARGET_COLUMN};
pub use store::{
    GestureSampleSet, GestureSampleStore, SampleExport, SharedSampleStore, TrainingSample,
};
pub use tree_classifier::{TreeClassifier, TreeModel};
