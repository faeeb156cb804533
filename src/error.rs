// src/error.rs

use thiserror::Error;

/// Failure of a single least-squares fit. The windowed segmenter treats both
/// variants as "skip this window".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FitError {
    #[error("not enough points to fit a cubic: {found} < 4")]
    InsufficientSamples { found: usize },

    #[error("normal equations are singular for {samples} samples")]
    DegenerateSystem { samples: usize },
}

#[derive(Debug, Error)]
pub enum GestureError {
    #[error("gesture {gesture_index} was verified before its model was trained")]
    UntrainedModel { gesture_index: usize },

    #[error("training gesture {gesture_index} failed: {message}")]
    Training {
        gesture_index: usize,
        message: String,
    },

    #[error("gesture index {index} is out of range ({configured} gestures configured)")]
    UnknownGesture { index: usize, configured: usize },

    #[error("malformed gesture definition #{index}: {reason}")]
    MalformedDefinition { index: usize, reason: String },

    #[error("imported samples do not fit the gesture base: {0}")]
    SampleShape(String),

    #[error("a classifier is required for strategy '{0}'")]
    MissingClassifier(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
