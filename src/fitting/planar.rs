// src/fitting/planar.rs

use super::statistic::{xtx_matrix, Polynomial, StatisticAccumulator, XtxMatrix};
use crate::error::FitError;
use crate::types::Point;

/// Control points of a cubic Bezier curve: start, two handles, end.
pub type BezierHandles = [Point; 4];

/// Parametric planar cubic: one polynomial per axis over the same samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlanarCurve {
    pub x: Polynomial,
    pub y: Polynomial,
}

impl PlanarCurve {
    pub fn eval(&self, t: f64) -> Point {
        Point::new(self.x.eval(t), self.y.eval(t))
    }

    pub fn bezier_handles(&self) -> BezierHandles {
        let xs = self.x.bezier_handles();
        let ys = self.y.bezier_handles();
        [
            Point::new(xs[0], ys[0]),
            Point::new(xs[1], ys[1]),
            Point::new(xs[2], ys[2]),
            Point::new(xs[3], ys[3]),
        ]
    }
}

/// Two accumulators that always see the same number of samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanarFitter {
    x: StatisticAccumulator,
    y: StatisticAccumulator,
}

impl PlanarFitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
    }

    pub fn insert(&mut self, point: Point) {
        self.x.insert(point.x);
        self.y.insert(point.y);
    }

    pub fn count(&self) -> usize {
        self.x.count()
    }

    /// Fit with a freshly computed XᵀX for the current sample count.
    pub fn fit(&self) -> Result<(PlanarCurve, f64), FitError> {
        self.fit_with(&xtx_matrix(self.count().max(1)))
    }

    /// Fit with a caller-supplied XᵀX; it must belong to `self.count()`.
    /// Returns the curve and the summed residual of both axes.
    pub fn fit_with(&self, xtx: &XtxMatrix) -> Result<(PlanarCurve, f64), FitError> {
        let (x, residual_x) = self.x.fit(xtx)?;
        let (y, residual_y) = self.y.fit(xtx)?;
        Ok((PlanarCurve { x, y }, residual_x + residual_y))
    }
}
