// src/strategy/signaled.rs
//
// Strategies without windowing. The signaled variant relies on the user to
// mark the gesture: pointer-down starts a fresh fit, pointer-up fits whatever
// was collected and tries to match it as one curve.

use super::{mark_trial_for_key, Strategy};
use crate::fitting::PlanarFitter;
use crate::matching::GestureMatcher;
use crate::pipeline::{EventBus, GestureEvent, GestureMetrics};
use crate::types::{KeyCode, Point};
use tracing::info;

/// Ignores all input.
pub struct NullStrategy;

impl Strategy for NullStrategy {
    fn name(&self) -> &'static str {
        "Null"
    }

    fn on_tick(&mut self, _point: Point) {}

    fn reset(&mut self) {}

    fn drain_events(&mut self) -> Vec<GestureEvent> {
        Vec::new()
    }
}

pub struct SignaledStrategy {
    fitter: PlanarFitter,
    matcher: GestureMatcher,
    events: EventBus,
    metrics: GestureMetrics,
}

impl SignaledStrategy {
    pub fn new(matcher: GestureMatcher, metrics: GestureMetrics) -> Self {
        Self {
            fitter: PlanarFitter::new(),
            matcher,
            events: EventBus::default(),
            metrics,
        }
    }
}

impl Strategy for SignaledStrategy {
    fn name(&self) -> &'static str {
        "Signaled"
    }

    fn on_pointer_down(&mut self) {
        self.fitter.reset();
    }

    fn on_pointer_up(&mut self) {
        let sample_count = self.fitter.count();
        let (curve, residual) = match self.fitter.fit() {
            Ok(fit) => fit,
            Err(e) => {
                info!("Cannot fit signaled gesture: {}", e);
                self.metrics.inc(&self.metrics.windows_skipped);
                return;
            }
        };
        self.metrics.inc(&self.metrics.windows_fitted);

        let extractor = self.matcher.extractor();
        let features = extractor.extract(&curve, residual, sample_count);
        info!(
            "Matched polynomial with avg residual {:.3} classified as {}.",
            residual.max(0.0).sqrt() / sample_count as f64,
            features.curve_type
        );
        self.events.publish(GestureEvent::WindowFitted {
            frame_number: features.frame_number,
            bezier: features.bezier,
        });

        match self.matcher.match_features(features) {
            Some(index) => {
                let description = self.matcher.debug_description().unwrap_or_default();
                self.events
                    .publish(GestureEvent::GestureMatched { index, description });
            }
            None => {
                info!("No gesture detected.");
                self.events.publish(GestureEvent::NoGesture);
            }
        }
    }

    fn on_tick(&mut self, point: Point) {
        self.metrics.inc(&self.metrics.points);
        self.fitter.insert(point);
    }

    fn on_key(&mut self, key: KeyCode) {
        mark_trial_for_key(&mut self.matcher, &mut self.events, key);
    }

    fn reset(&mut self) {
        self.fitter.reset();
        self.matcher.reset();
    }

    fn drain_events(&mut self) -> Vec<GestureEvent> {
        self.events.drain()
    }
}
