// src/strategy/variable_length.rs
//
// Strategies driven by the windowed segmenter: no pointer signals, gestures
// are found in the continuous point stream. The CurveProcessor lives in its
// own field so the segmenter and the processor can be borrowed separately.

use super::{mark_trial_for_key, Strategy};
use crate::fitting::{CurveProcessor, FrameReport, PlanarCurve, WindowedSegmenter};
use crate::matching::GestureMatcher;
use crate::pipeline::{EventBus, GestureEvent, GestureMetrics};
use crate::types::{FittingConfig, KeyCode, Point};

fn record_frame(metrics: &GestureMetrics, report: Option<FrameReport>) {
    if let Some(report) = report {
        metrics.inc(&metrics.frames);
        metrics.add(&metrics.windows_fitted, report.fitted as u64);
        metrics.add(&metrics.windows_skipped, report.skipped as u64);
    }
}

/// Publishes every fitted window for display.
struct WindowDisplay {
    frame_size: usize,
    events: EventBus,
}

impl WindowDisplay {
    fn new(frame_size: usize) -> Self {
        Self {
            frame_size: frame_size.max(1),
            events: EventBus::default(),
        }
    }

    fn show(&mut self, curve: &PlanarCurve, sample_count: usize) {
        self.events.publish(GestureEvent::WindowFitted {
            frame_number: (sample_count / self.frame_size) as i64 - 1,
            bezier: curve.bezier_handles(),
        });
    }
}

impl CurveProcessor for WindowDisplay {
    fn on_next_frame(&mut self) {
        self.events.publish(GestureEvent::FrameAdvanced);
    }

    fn process_curve(&mut self, curve: &PlanarCurve, _residual: f64, sample_count: usize) -> bool {
        self.show(curve, sample_count);
        false
    }
}

/// Shows candidate windows; never accepts one.
pub struct VariableLengthStrategy {
    segmenter: WindowedSegmenter,
    display: WindowDisplay,
    metrics: GestureMetrics,
}

impl VariableLengthStrategy {
    pub fn new(fitting: FittingConfig, metrics: GestureMetrics) -> Self {
        Self {
            segmenter: WindowedSegmenter::new(fitting.frame_size, fitting.gesture_span),
            display: WindowDisplay::new(fitting.frame_size),
            metrics,
        }
    }
}

impl Strategy for VariableLengthStrategy {
    fn name(&self) -> &'static str {
        "Variable length"
    }

    fn on_tick(&mut self, point: Point) {
        self.metrics.inc(&self.metrics.points);
        let report = self.segmenter.insert(point, &mut self.display);
        record_frame(&self.metrics, report);
    }

    fn reset(&mut self) {
        self.segmenter.reset();
    }

    fn drain_events(&mut self) -> Vec<GestureEvent> {
        self.display.events.drain()
    }
}

struct MatchProcessor {
    display: WindowDisplay,
    matcher: GestureMatcher,
}

impl CurveProcessor for MatchProcessor {
    fn on_next_frame(&mut self) {
        self.display.on_next_frame();
    }

    fn process_curve(&mut self, curve: &PlanarCurve, residual: f64, sample_count: usize) -> bool {
        self.display.show(curve, sample_count);

        let Some(index) = self.matcher.match_curve(curve, residual, sample_count) else {
            return false;
        };
        let description = self.matcher.debug_description().unwrap_or_default();
        self.display
            .events
            .publish(GestureEvent::GestureMatched { index, description });
        true
    }
}

/// Matches every window against the gesture definitions; the first accepted
/// window consumes the gesture.
pub struct MatchingStrategy {
    name: &'static str,
    segmenter: WindowedSegmenter,
    processor: MatchProcessor,
    metrics: GestureMetrics,
}

impl MatchingStrategy {
    pub fn new(fitting: FittingConfig, matcher: GestureMatcher, metrics: GestureMetrics) -> Self {
        Self::named("Variable length (matching)", fitting, matcher, metrics)
    }

    /// Same as `new`; the matcher is expected to carry the sample-store veto.
    pub fn with_tree(
        fitting: FittingConfig,
        matcher: GestureMatcher,
        metrics: GestureMetrics,
    ) -> Self {
        Self::named(
            "Variable length (based on decision tree)",
            fitting,
            matcher,
            metrics,
        )
    }

    fn named(
        name: &'static str,
        fitting: FittingConfig,
        matcher: GestureMatcher,
        metrics: GestureMetrics,
    ) -> Self {
        Self {
            name,
            segmenter: WindowedSegmenter::new(fitting.frame_size, fitting.gesture_span),
            processor: MatchProcessor {
                display: WindowDisplay::new(fitting.frame_size),
                matcher,
            },
            metrics,
        }
    }
}

impl Strategy for MatchingStrategy {
    fn name(&self) -> &'static str {
        self.name
    }

    fn on_tick(&mut self, point: Point) {
        self.metrics.inc(&self.metrics.points);
        let report = self.segmenter.insert(point, &mut self.processor);
        record_frame(&self.metrics, report);
    }

    fn on_key(&mut self, key: KeyCode) {
        let processor = &mut self.processor;
        mark_trial_for_key(&mut processor.matcher, &mut processor.display.events, key);
    }

    fn reset(&mut self) {
        self.segmenter.reset();
        self.processor.matcher.reset();
    }

    fn drain_events(&mut self) -> Vec<GestureEvent> {
        self.processor.display.events.drain()
    }
}
