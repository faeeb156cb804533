// src/fitting/mod.rs
//
// Incremental curve fitting, leaves first:
//   StatisticAccumulator (one axis) → PlanarFitter (x + y) → WindowedSegmenter
//   (ring of planar fitters over one point stream).

pub mod planar;
pub mod statistic;
pub mod windowed;

pub use planar::{BezierHandles, PlanarCurve, PlanarFitter};
pub use statistic::{xtx_matrix, Polynomial, StatisticAccumulator, XtxMatrix, MIN_FIT_SAMPLES};
pub use windowed::{CurveProcessor, FrameReport, WindowedSegmenter};
