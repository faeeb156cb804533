// src/fitting/windowed.rs
//
// Variable-length segmentation over a ring of planar fitters.
//
// Every point goes into all `span` fitters. At each frame boundary exactly one
// fitter (the next in the cycle) is reset, so at any time the ring holds
// windows of roughly frame_size, 2·frame_size, …, span·frame_size points.
// Each window is then fitted and offered to a `CurveProcessor`, longest first.
// Acceptance consumes the gesture: all windows restart together.
//
// Memory is `span` fitters of constant size, independent of stream length.

use super::planar::{PlanarCurve, PlanarFitter};
use super::statistic::xtx_matrix;
use crate::error::FitError;
use crate::types::Point;
use tracing::debug;

/// Consumer of fitted windows.
pub trait CurveProcessor {
    /// Called once per completed frame, before any window is fitted.
    fn on_next_frame(&mut self) {}

    /// Return true when the curve was accepted as a gesture.
    fn process_curve(&mut self, curve: &PlanarCurve, residual: f64, sample_count: usize) -> bool;
}

/// Outcome of one frame boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Windows that produced a curve and were offered to the processor.
    pub fitted: usize,
    /// Windows skipped because they could not be fitted yet.
    pub skipped: usize,
    /// Sample count of the accepted window, if any.
    pub accepted: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct WindowedSegmenter {
    frame_size: usize,
    span: usize,
    fitters: Vec<PlanarFitter>,
    points_in_frame: usize,
    last_reset: usize,
}

impl WindowedSegmenter {
    /// Both parameters are clamped to at least 1.
    pub fn new(frame_size: usize, span: usize) -> Self {
        let span = span.max(1);
        Self {
            frame_size: frame_size.max(1),
            span,
            fitters: vec![PlanarFitter::new(); span],
            points_in_frame: 0,
            last_reset: 0,
        }
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn span(&self) -> usize {
        self.span
    }

    /// Number of fitters held. Always equals `span`.
    pub fn live_windows(&self) -> usize {
        self.fitters.len()
    }

    /// Current sample count of each window, in ring order.
    pub fn window_lengths(&self) -> Vec<usize> {
        self.fitters.iter().map(PlanarFitter::count).collect()
    }

    /// Restart every window. The position inside the current frame is kept.
    pub fn reset(&mut self) {
        for fitter in &mut self.fitters {
            fitter.reset();
        }
        self.last_reset = 0;
    }

    /// Feed one point. Returns a report when the point completed a frame.
    pub fn insert<P>(&mut self, point: Point, processor: &mut P) -> Option<FrameReport>
    where
        P: CurveProcessor + ?Sized,
    {
        for fitter in &mut self.fitters {
            fitter.insert(point);
        }
        self.points_in_frame += 1;

        if self.points_in_frame < self.frame_size {
            return None;
        }

        self.points_in_frame = 0;
        self.reset_next_in_cycle();
        processor.on_next_frame();
        Some(self.try_fit(processor))
    }

    fn reset_next_in_cycle(&mut self) {
        self.last_reset = (self.last_reset + 1) % self.span;
        self.fitters[self.last_reset].reset();
    }

    fn try_fit<P>(&mut self, processor: &mut P) -> FrameReport
    where
        P: CurveProcessor + ?Sized,
    {
        let mut report = FrameReport::default();

        for offset in 1..=self.span {
            let fitter = &self.fitters[(self.last_reset + offset) % self.span];
            let sample_count = fitter.count();

            let (curve, residual) = match fitter.fit_with(&xtx_matrix(sample_count.max(1))) {
                Ok(fit) => fit,
                Err(FitError::InsufficientSamples { .. }) => {
                    report.skipped += 1;
                    continue;
                }
                Err(e) => {
                    debug!("Skipping window of {} points: {}", sample_count, e);
                    report.skipped += 1;
                    continue;
                }
            };

            report.fitted += 1;
            if processor.process_curve(&curve, residual, sample_count) {
                debug!(
                    "Window of {} points consumed, restarting all windows",
                    sample_count
                );
                report.accepted = Some(sample_count);
                self.reset();
                break;
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records every offered window; accepts windows of a given length.
    #[derive(Default)]
    struct Recorder {
        frames: usize,
        offered: Vec<usize>,
        accept_len: Option<usize>,
    }

    impl CurveProcessor for Recorder {
        fn on_next_frame(&mut self) {
            self.frames += 1;
        }

        fn process_curve(&mut self, _curve: &PlanarCurve, _residual: f64, n: usize) -> bool {
            self.offered.push(n);
            self.accept_len == Some(n)
        }
    }

    fn feed(seg: &mut WindowedSegmenter, rec: &mut Recorder, count: usize) -> Vec<FrameReport> {
        (0..count)
            .filter_map(|i| {
                let t = i as f64;
                seg.insert(Point::new(t, (t * 0.1).sin() * 5.0), rec)
            })
            .collect()
    }

    #[test]
    fn test_reports_only_on_frame_boundaries() {
        let mut seg = WindowedSegmenter::new(5, 3);
        let mut rec = Recorder::default();
        let reports = feed(&mut seg, &mut rec, 23);
        assert_eq!(reports.len(), 4);
        assert_eq!(rec.frames, 4);
    }

    #[test]
    fn test_windows_are_staggered_by_one_frame() {
        let mut seg = WindowedSegmenter::new(4, 3);
        let mut rec = Recorder::default();
        feed(&mut seg, &mut rec, 4 * 6);

        let mut lengths = seg.window_lengths();
        lengths.sort_unstable();
        assert_eq!(lengths, vec![0, 4, 8]);
    }

    #[test]
    fn test_candidates_scanned_longest_first() {
        let mut seg = WindowedSegmenter::new(4, 3);
        let mut rec = Recorder::default();
        feed(&mut seg, &mut rec, 4 * 3);

        // Fourth frame: the 12-point window is the one reset, leaving 8 and 4.
        rec.offered.clear();
        feed(&mut seg, &mut rec, 4);
        assert_eq!(rec.offered, vec![8, 4]);
    }

    #[test]
    fn test_short_windows_are_skipped() {
        let mut seg = WindowedSegmenter::new(2, 4);
        let mut rec = Recorder::default();
        let reports = feed(&mut seg, &mut rec, 2);

        // One frame of two points: nothing can be fitted yet.
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].fitted, 0);
        assert_eq!(reports[0].skipped, 4);
        assert!(rec.offered.is_empty());
    }

    #[test]
    fn test_acceptance_restarts_all_windows() {
        let mut seg = WindowedSegmenter::new(5, 4);
        let mut rec = Recorder {
            accept_len: Some(10),
            ..Default::default()
        };
        let reports = feed(&mut seg, &mut rec, 10);

        assert_eq!(reports.last().unwrap().accepted, Some(10));
        assert!(seg.window_lengths().iter().all(|&n| n == 0));

        // Scanning stopped at the accepted window.
        assert_eq!(rec.offered.last(), Some(&10));
        assert_eq!(rec.offered.iter().filter(|&&n| n == 10).count(), 1);
    }

    #[test]
    fn test_unsolvable_windows_are_skipped_and_scan_continues() {
        let mut seg = WindowedSegmenter::new(4, 3);
        let mut rec = Recorder::default();

        // A NaN sample poisons every window that contains it.
        seg.insert(Point::new(f64::NAN, 0.0), &mut rec);
        let first = feed(&mut seg, &mut rec, 3);
        assert_eq!(
            first,
            vec![FrameReport {
                fitted: 0,
                skipped: 3,
                accepted: None,
            }]
        );

        // Second frame: the 8-point windows still hold the NaN, the 4-point
        // window started after it and is fitted.
        let second = feed(&mut seg, &mut rec, 4);
        assert_eq!(
            second,
            vec![FrameReport {
                fitted: 1,
                skipped: 2,
                accepted: None,
            }]
        );
        assert_eq!(rec.offered, vec![4]);
    }

    #[test]
    fn test_memory_bounded_by_span() {
        let mut seg = WindowedSegmenter::new(3, 5);
        let mut rec = Recorder::default();
        feed(&mut seg, &mut rec, 10_000);

        assert_eq!(seg.live_windows(), 5);
        assert!(seg.window_lengths().iter().all(|&n| n <= 3 * 5));
    }
}
