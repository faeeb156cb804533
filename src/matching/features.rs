// src/matching/features.rs

use super::definition::GestureDefinition;
use crate::fitting::{BezierHandles, PlanarCurve};
use crate::geometry::CurveGeometry;
use crate::types::{CurveType, Point};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Parameter times for entry/exit directions of curves without a loop.
const ENTRY_TIME: f64 = 0.2;
const EXIT_TIME: f64 = 0.8;

/// Geometric snapshot of one fitted window.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub curve_type: CurveType,
    pub average_residual: f64,
    /// floor(samples / frame_size) − 1
    pub frame_number: i64,
    pub length: f64,
    pub tangent_in: Point,
    pub tangent_out: Point,
    /// Self-intersection parameter times; loops only.
    pub intersections: Option<(f64, f64)>,
    /// Arc length between the self-intersections over total arc length.
    /// 1.0 when the curve has no loop.
    pub proportion_inside_loop: f64,
    pub bezier: BezierHandles,
}

impl FeatureRecord {
    pub fn angle_in(&self) -> f64 {
        self.tangent_in.angle_deg()
    }

    pub fn angle_out(&self) -> f64 {
        self.tangent_out.angle_deg()
    }

    pub fn value(&self, name: FeatureName) -> FeatureValue {
        match name {
            FeatureName::Type => FeatureValue::Category(self.curve_type),
            FeatureName::AverageResidual => FeatureValue::Number(self.average_residual),
            FeatureName::FrameNumber => FeatureValue::Number(self.frame_number as f64),
            FeatureName::Length => FeatureValue::Number(self.length),
            FeatureName::AngleIn => FeatureValue::Number(self.angle_in()),
            FeatureName::AngleOut => FeatureValue::Number(self.angle_out()),
            FeatureName::ProportionInsideLoop => FeatureValue::Number(self.proportion_inside_loop),
        }
    }

    /// Values of `names`, in that order.
    pub fn row(&self, names: &[FeatureName]) -> Vec<FeatureValue> {
        names.iter().map(|&name| self.value(name)).collect()
    }

    /// Short description for display: frame number and arc length.
    pub fn debug_description(&self) -> String {
        format!("FR={}, LN={:.1}", self.frame_number, self.length)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Category(CurveType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Category,
    Number,
}

/// Features a secondary classifier can learn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureName {
    Type,
    AverageResidual,
    FrameNumber,
    Length,
    AngleIn,
    AngleOut,
    ProportionInsideLoop,
}

impl FeatureName {
    pub const ALL: [FeatureName; 7] = [
        Self::Type,
        Self::AverageResidual,
        Self::FrameNumber,
        Self::Length,
        Self::AngleIn,
        Self::AngleOut,
        Self::ProportionInsideLoop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::AverageResidual => "averageResidual",
            Self::FrameNumber => "frameNumber",
            Self::Length => "length",
            Self::AngleIn => "angleIn",
            Self::AngleOut => "angleOut",
            Self::ProportionInsideLoop => "proportionInsideLoop",
        }
    }

    pub fn kind(&self) -> FeatureKind {
        match self {
            Self::Type => FeatureKind::Category,
            _ => FeatureKind::Number,
        }
    }

    /// Whether the definition already pins this feature down.
    pub fn is_constrained_by(&self, definition: &GestureDefinition) -> bool {
        match self {
            Self::Type => definition.curve_type.is_some(),
            Self::AverageResidual => definition.average_residual.is_some(),
            Self::FrameNumber => definition.number_of_frames.is_some(),
            Self::Length => definition.length.is_some(),
            Self::AngleIn => definition.in_dir.is_some(),
            Self::AngleOut => definition.out_dir.is_some(),
            Self::ProportionInsideLoop => false,
        }
    }

    /// The features left free by `definition`, in canonical order.
    pub fn unconstrained_by(definition: &GestureDefinition) -> Vec<FeatureName> {
        Self::ALL
            .iter()
            .copied()
            .filter(|name| !name.is_constrained_by(definition))
            .collect()
    }
}

/// Turns a fitted curve into a `FeatureRecord` with help from the geometry
/// collaborator.
#[derive(Clone)]
pub struct FeatureExtractor {
    frame_size: usize,
    geometry: Arc<dyn CurveGeometry>,
}

impl FeatureExtractor {
    pub fn new(frame_size: usize, geometry: Arc<dyn CurveGeometry>) -> Self {
        Self {
            frame_size: frame_size.max(1),
            geometry,
        }
    }

    pub fn extract(
        &self,
        curve: &PlanarCurve,
        residual: f64,
        sample_count: usize,
    ) -> FeatureRecord {
        let bezier = curve.bezier_handles();
        let classification = self.geometry.classify(&bezier);
        let length = self.geometry.length_of(&bezier);

        let intersections = match classification.curve_type {
            CurveType::Loop => classification.intersections,
            _ => None,
        };
        let (t_in, t_out) = intersections.unwrap_or((ENTRY_TIME, EXIT_TIME));

        let proportion_inside_loop = match intersections {
            Some((t1, t2)) if length > 0.0 => {
                let inner = self.geometry.sub_curve(&bezier, t1, t2);
                self.geometry.length_of(&inner) / length
            }
            _ => 1.0,
        };

        FeatureRecord {
            curve_type: classification.curve_type,
            average_residual: residual / sample_count.max(1) as f64,
            frame_number: (sample_count / self.frame_size) as i64 - 1,
            length,
            tangent_in: self.geometry.tangent_at(&bezier, t_in),
            tangent_out: self.geometry.tangent_at(&bezier, t_out),
            intersections,
            proportion_inside_loop,
            bezier,
        }
    }
}
