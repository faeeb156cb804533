// src/types.rs

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub fitting: FittingConfig,
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub gestures: GesturesConfig,
    pub recordings: RecordingsConfig,
    #[serde(default)]
    pub training: TrainingConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FittingConfig {
    /// Points per frame; windows are staggered by one frame.
    pub frame_size: usize,
    /// Number of simultaneously live windows.
    pub gesture_span: usize,
}

impl Default for FittingConfig {
    fn default() -> Self {
        Self {
            frame_size: 10,
            gesture_span: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub kind: StrategyKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GesturesConfig {
    /// JSON file with the ordered gesture definitions. Built-in examples when absent.
    pub definitions_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingsConfig {
    pub input_dir: String,
    /// Pause between replayed events; 0 replays as fast as possible.
    #[serde(default)]
    pub tick_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub import_path: Option<String>,
    pub export_path: Option<String>,
    #[serde(default = "default_reset_on_import")]
    pub reset_on_import: bool,
}

fn default_reset_on_import() -> bool {
    true
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            import_path: None,
            export_path: None,
            reset_on_import: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Null,
    Signaled,
    VariableLength,
    Matching,
    TreeMatching,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Signaled => "signaled",
            Self::VariableLength => "variable_length",
            Self::Matching => "matching",
            Self::TreeMatching => "tree_matching",
        }
    }
}

/// A sampled pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Direction in degrees, `atan2(y, x)`, in (-180, 180].
    pub fn angle_deg(&self) -> f64 {
        self.y.atan2(self.x).to_degrees()
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Topological type of a cubic Bezier curve.
///
/// Gesture definitions may only name the first four; `Line` and `Quadratic`
/// are degenerate outcomes the geometry collaborator can still report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveType {
    Loop,
    Arch,
    Cusp,
    Serpentine,
    Line,
    Quadratic,
}

impl CurveType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loop => "loop",
            Self::Arch => "arch",
            Self::Cusp => "cusp",
            Self::Serpentine => "serpentine",
            Self::Line => "line",
            Self::Quadratic => "quadratic",
        }
    }

    pub fn is_gesture_type(&self) -> bool {
        matches!(
            self,
            Self::Loop | Self::Arch | Self::Cusp | Self::Serpentine
        )
    }
}

impl fmt::Display for CurveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keys a strategy reacts to. Everything else is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyCode {
    /// Label the most recent match as a false positive.
    KeyQ,
    /// Label the most recent match as correct.
    KeyW,
    #[serde(other)]
    Other,
}

/// One entry of a recorded input session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum InputEvent {
    Down,
    Up,
    Tick { x: f64, y: f64 },
    Key { code: KeyCode },
}
