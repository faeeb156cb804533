// src/lib.rs
//
// Online recognition of pointer gestures from a stream of 2-D points, in
// constant memory per window: cubic least-squares fits over staggered windows,
// topological classification of the fitted Bezier curves, rule-based matching
// against declarative gesture definitions, and an optional learned veto.

pub mod config;
pub mod error;
pub mod fitting;
pub mod geometry;
pub mod matching;
pub mod pipeline;
pub mod recording;
pub mod strategy;
pub mod training;
pub mod types;

pub use error::{FitError, GestureError};
pub use types::{Config, CurveType, InputEvent, KeyCode, Point, StrategyKind};
