// src/matching/definition.rs
//
// Declarative gesture definitions. Every field is optional; an absent field
// places no constraint on the match. The list order is the match priority.
//
// JSON shape (unknown fields are rejected):
//   [{ "type": "loop" | "arch" | "cusp" | "serpentine",
//      "inDir":  { "angle": <int>, "margin": <number>? },
//      "outDir": { "angle": <int>, "margin": <number>? },
//      "averageResidual": <int>,
//      "numberOfFrames": [<int>, <int>],
//      "length": [<int>, <int>] }, ...]

use crate::error::GestureError;
use crate::types::CurveType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Tolerance used when a direction names no margin, in degrees.
pub const DEFAULT_DIRECTION_MARGIN: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectionConstraint {
    /// Target direction in degrees, `atan2(y, x)` convention.
    pub angle: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margin: Option<f64>,
}

impl DirectionConstraint {
    pub fn margin(&self) -> f64 {
        self.margin.unwrap_or(DEFAULT_DIRECTION_MARGIN)
    }

    /// Circular distance to `angle_deg` is strictly below the margin.
    pub fn is_satisfied_by(&self, angle_deg: f64) -> bool {
        angular_distance(self.angle as f64, angle_deg) < self.margin()
    }
}

/// Absolute angular difference wrapped into [0, 180].
pub fn angular_distance(a_deg: f64, b_deg: f64) -> f64 {
    let delta = (a_deg - b_deg).rem_euclid(360.0);
    delta.min(360.0 - delta)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct GestureDefinition {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub curve_type: Option<CurveType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub in_dir: Option<DirectionConstraint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<DirectionConstraint>,
    /// Exclusive ceiling on residual per sample.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_residual: Option<i64>,
    /// Inclusive frame-number range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_frames: Option<[i64; 2]>,
    /// Inclusive arc-length range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<[i64; 2]>,
}

impl GestureDefinition {
    fn validate(&self, index: usize) -> Result<(), GestureError> {
        let malformed = |reason: String| GestureError::MalformedDefinition { index, reason };

        if let Some(curve_type) = self.curve_type {
            if !curve_type.is_gesture_type() {
                return Err(malformed(format!(
                    "type '{}' is not one of loop, arch, cusp, serpentine",
                    curve_type
                )));
            }
        }

        for (name, dir) in [("inDir", &self.in_dir), ("outDir", &self.out_dir)] {
            if let Some(margin) = dir.and_then(|d| d.margin) {
                if !(margin > 0.0) {
                    return Err(malformed(format!("{}.margin must be positive", name)));
                }
            }
        }

        for (name, range) in [
            ("numberOfFrames", &self.number_of_frames),
            ("length", &self.length),
        ] {
            if let Some([min, max]) = range {
                if min > max {
                    return Err(malformed(format!("{} range [{}, {}] is empty", name, min, max)));
                }
            }
        }

        Ok(())
    }
}

/// Parse and validate an ordered definition list from JSON.
pub fn parse_definitions(json: &str) -> Result<Vec<GestureDefinition>, GestureError> {
    let definitions: Vec<GestureDefinition> = serde_json::from_str(json)?;
    for (index, definition) in definitions.iter().enumerate() {
        definition.validate(index)?;
    }
    Ok(definitions)
}

pub fn load_definitions(path: impl AsRef<Path>) -> anyhow::Result<Vec<GestureDefinition>> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let definitions = parse_definitions(&contents)?;
    info!(
        "Loaded {} gesture definition(s) from {}",
        definitions.len(),
        path.display()
    );
    Ok(definitions)
}

/// The starter set: two loops leaving downward/upward and one slow arch.
pub fn default_definitions() -> Vec<GestureDefinition> {
    let dir = |angle, margin| {
        Some(DirectionConstraint {
            angle,
            margin: Some(margin),
        })
    };
    vec![
        GestureDefinition {
            curve_type: Some(CurveType::Loop),
            in_dir: dir(0, 60.0),
            out_dir: dir(90, 60.0),
            ..Default::default()
        },
        GestureDefinition {
            curve_type: Some(CurveType::Loop),
            in_dir: dir(0, 60.0),
            out_dir: dir(-90, 60.0),
            ..Default::default()
        },
        GestureDefinition {
            curve_type: Some(CurveType::Arch),
            in_dir: dir(180, 45.0),
            out_dir: dir(90, 45.0),
            number_of_frames: Some([4, 20]),
            ..Default::default()
        },
    ]
}
