// src/matching/mod.rs

pub mod definition;
pub mod features;
pub mod matcher;

pub use definition::{
    angular_distance, default_definitions, load_definitions, parse_definitions,
    DirectionConstraint, GestureDefinition, DEFAULT_DIRECTION_MARGIN,
};
pub use features::{FeatureExtractor, FeatureKind, FeatureName, FeatureRecord, FeatureValue};
pub use matcher::{satisfies, AdditionalCheck, GestureMatcher};
