// src/geometry/mod.rs
//
// Geometry collaborator: everything the feature extractor needs to know about
// a cubic Bezier curve. Implementations must be pure functions of the four
// control points.

mod kurbo_geometry;

pub use kurbo_geometry::KurboGeometry;

use crate::fitting::BezierHandles;
use crate::types::{CurveType, Point};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveClassification {
    pub curve_type: CurveType,
    /// Parameter times of the self-intersection, ascending. Loops only.
    pub intersections: Option<(f64, f64)>,
}

pub trait CurveGeometry: Send + Sync {
    fn classify(&self, curve: &BezierHandles) -> CurveClassification;

    /// Unit tangent direction at parameter `t`.
    fn tangent_at(&self, curve: &BezierHandles, t: f64) -> Point;

    fn length_of(&self, curve: &BezierHandles) -> f64;

    /// The part of `curve` between parameters `t1` and `t2`.
    fn sub_curve(&self, curve: &BezierHandles, t1: f64, t2: f64) -> BezierHandles;
}
