// src/geometry/kurbo_geometry.rs
//
// CurveGeometry backed by kurbo's CubicBez.
//
// Arc length, derivative and subdivision come from kurbo. Topological
// classification follows the inflection-polynomial discriminant of Loop &
// Blinn: the coefficients of I(s, t) are computed from the control points,
// normalized, and the sign of 3·d2² − 4·d1·d3 separates serpentines (two real
// inflections) from loops (a double point). For a loop the two roots are the
// parameters of the self-intersection. Any candidate whose roots fall outside
// (0, 1) degrades to an arch; a loop needs both roots inside.

use super::{CurveClassification, CurveGeometry};
use crate::fitting::BezierHandles;
use crate::types::{CurveType, Point};
use kurbo::{CubicBez, ParamCurve, ParamCurveArclen, ParamCurveDeriv};

/// Absolute arc length accuracy in input units (pixels).
const ARCLEN_ACCURACY: f64 = 1e-4;

const EPSILON: f64 = 1e-12;

/// Below this derivative magnitude the tangent falls back to the chord.
const MIN_DERIVATIVE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, Default)]
pub struct KurboGeometry;

impl KurboGeometry {
    pub fn new() -> Self {
        Self
    }
}

fn to_cubic(curve: &BezierHandles) -> CubicBez {
    CubicBez::new(
        (curve[0].x, curve[0].y),
        (curve[1].x, curve[1].y),
        (curve[2].x, curve[2].y),
        (curve[3].x, curve[3].y),
    )
}

fn from_cubic(cubic: &CubicBez) -> BezierHandles {
    [
        Point::new(cubic.p0.x, cubic.p0.y),
        Point::new(cubic.p1.x, cubic.p1.y),
        Point::new(cubic.p2.x, cubic.p2.y),
        Point::new(cubic.p3.x, cubic.p3.y),
    ]
}

fn unit(x: f64, y: f64) -> Option<Point> {
    let len = x.hypot(y);
    (len > MIN_DERIVATIVE).then(|| Point::new(x / len, y / len))
}

fn is_zero(v: f64) -> bool {
    v.abs() <= EPSILON
}

/// Settle the final type from the candidate and its roots.
fn with_roots(candidate: CurveType, t1: f64, t2: Option<f64>) -> CurveClassification {
    let inside = |t: f64| t > 0.0 && t < 1.0;
    let t1_ok = inside(t1);
    let t2_ok = t2.map_or(false, inside);

    let degrade = !(t1_ok || t2_ok) || (candidate == CurveType::Loop && !(t1_ok && t2_ok));
    if degrade {
        return CurveClassification {
            curve_type: CurveType::Arch,
            intersections: None,
        };
    }

    let intersections = match (candidate, t2) {
        (CurveType::Loop, Some(t2)) => Some((t1.min(t2), t1.max(t2))),
        _ => None,
    };
    CurveClassification {
        curve_type: candidate,
        intersections,
    }
}

fn without_roots(curve_type: CurveType) -> CurveClassification {
    CurveClassification {
        curve_type,
        intersections: None,
    }
}

impl CurveGeometry for KurboGeometry {
    fn classify(&self, curve: &BezierHandles) -> CurveClassification {
        let [p0, p1, p2, p3] = *curve;
        let (x0, y0, x1, y1) = (p0.x, p0.y, p1.x, p1.y);
        let (x2, y2, x3, y3) = (p2.x, p2.y, p3.x, p3.y);

        let a1 = x0 * (y3 - y2) + y0 * (x2 - x3) + x3 * y2 - y3 * x2;
        let a2 = x1 * (y0 - y3) + y1 * (x3 - x0) + x0 * y3 - y0 * x3;
        let a3 = x2 * (y1 - y0) + y2 * (x0 - x1) + x1 * y0 - y1 * x0;

        let mut d3 = 3.0 * a3;
        let mut d2 = d3 - a2;
        let mut d1 = d2 - a2 + a1;

        let norm = (d1 * d1 + d2 * d2 + d3 * d3).sqrt();
        let scale = if norm != 0.0 { 1.0 / norm } else { 0.0 };
        d1 *= scale;
        d2 *= scale;
        d3 *= scale;

        if is_zero(d1) {
            if is_zero(d2) {
                return without_roots(if is_zero(d3) {
                    CurveType::Line
                } else {
                    CurveType::Quadratic
                });
            }
            return with_roots(CurveType::Serpentine, d3 / (3.0 * d2), None);
        }

        let discriminant = 3.0 * d2 * d2 - 4.0 * d1 * d3;
        if is_zero(discriminant) {
            return with_roots(CurveType::Cusp, d2 / (2.0 * d1), None);
        }

        let f1 = if discriminant > 0.0 {
            (discriminant / 3.0).sqrt()
        } else {
            (-discriminant).sqrt()
        };
        let f2 = 2.0 * d1;
        let candidate = if discriminant > 0.0 {
            CurveType::Serpentine
        } else {
            CurveType::Loop
        };
        with_roots(candidate, (d2 + f1) / f2, Some((d2 - f1) / f2))
    }

    fn tangent_at(&self, curve: &BezierHandles, t: f64) -> Point {
        let cubic = to_cubic(curve);
        let d = cubic.deriv().eval(t.clamp(0.0, 1.0));

        unit(d.x, d.y)
            .or_else(|| unit(cubic.p3.x - cubic.p0.x, cubic.p3.y - cubic.p0.y))
            .unwrap_or(Point::new(1.0, 0.0))
    }

    fn length_of(&self, curve: &BezierHandles) -> f64 {
        to_cubic(curve).arclen(ARCLEN_ACCURACY)
    }

    fn sub_curve(&self, curve: &BezierHandles, t1: f64, t2: f64) -> BezierHandles {
        from_cubic(&to_cubic(curve).subsegment(t1..t2))
    }
}
