// src/strategy/mod.rs
//
// Input strategies. Each variant owns its fitting machinery and turns pointer,
// tick and key input into GestureEvents; they share nothing but the sample
// store and the counters they were built with.

mod signaled;
mod variable_length;

pub use signaled::{NullStrategy, SignaledStrategy};
pub use variable_length::{MatchingStrategy, VariableLengthStrategy};

use crate::error::GestureError;
use crate::geometry::CurveGeometry;
use crate::matching::{FeatureExtractor, GestureDefinition, GestureMatcher};
use crate::pipeline::{EventBus, GestureEvent, GestureMetrics};
use crate::training::{Classifier, SampleStoreCheck, SharedSampleStore};
use crate::types::{FittingConfig, InputEvent, KeyCode, Point, StrategyKind};
use std::sync::Arc;
use tracing::{debug, info};

pub trait Strategy: Send {
    fn name(&self) -> &'static str;

    fn on_pointer_down(&mut self) {}

    fn on_pointer_up(&mut self) {}

    /// One sampled pointer position.
    fn on_tick(&mut self, point: Point);

    fn on_key(&mut self, _key: KeyCode) {}

    fn reset(&mut self);

    fn drain_events(&mut self) -> Vec<GestureEvent>;

    fn handle(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::Down => self.on_pointer_down(),
            InputEvent::Up => self.on_pointer_up(),
            InputEvent::Tick { x, y } => self.on_tick(Point::new(x, y)),
            InputEvent::Key { code } => self.on_key(code),
        }
    }
}

/// Everything a strategy may need at construction.
pub struct StrategyContext<'a> {
    pub fitting: FittingConfig,
    pub definitions: &'a [GestureDefinition],
    pub store: SharedSampleStore,
    pub metrics: GestureMetrics,
    pub geometry: Arc<dyn CurveGeometry>,
    /// Required by tree matching only.
    pub classifier: Option<&'a dyn Classifier>,
}

impl StrategyContext<'_> {
    fn matcher(&self) -> GestureMatcher {
        GestureMatcher::new(
            self.definitions.to_vec(),
            FeatureExtractor::new(self.fitting.frame_size, self.geometry.clone()),
            self.store.clone(),
            self.metrics.clone(),
        )
    }
}

pub fn build_strategy(
    kind: StrategyKind,
    ctx: StrategyContext<'_>,
) -> Result<Box<dyn Strategy>, GestureError> {
    ctx.store.write().configure(ctx.definitions);

    let strategy: Box<dyn Strategy> = match kind {
        StrategyKind::Null => Box::new(NullStrategy),
        StrategyKind::Signaled => {
            Box::new(SignaledStrategy::new(ctx.matcher(), ctx.metrics.clone()))
        }
        StrategyKind::VariableLength => {
            Box::new(VariableLengthStrategy::new(ctx.fitting, ctx.metrics.clone()))
        }
        StrategyKind::Matching => {
            Box::new(MatchingStrategy::new(ctx.fitting, ctx.matcher(), ctx.metrics.clone()))
        }
        StrategyKind::TreeMatching => {
            let classifier = ctx
                .classifier
                .ok_or_else(|| GestureError::MissingClassifier(kind.as_str().to_string()))?;
            ctx.store.write().retrain(classifier)?;

            let matcher = ctx
                .matcher()
                .with_additional_check(Box::new(SampleStoreCheck::new(ctx.store.clone())));
            Box::new(MatchingStrategy::with_tree(ctx.fitting, matcher, ctx.metrics.clone()))
        }
    };

    info!("Strategy '{}' ready", strategy.name());
    Ok(strategy)
}

/// Q labels the recent match negative, W positive.
fn mark_trial_for_key(matcher: &mut GestureMatcher, events: &mut EventBus, key: KeyCode) {
    let matches = match key {
        KeyCode::KeyQ => false,
        KeyCode::KeyW => true,
        KeyCode::Other => return,
    };

    if !matcher.mark_trial(matches) {
        debug!("No recent gesture to mark");
        return;
    }
    if let Some((index, _)) = matcher.recent_match() {
        events.publish(GestureEvent::TrialMarked { index, matches });
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::fitting::BezierHandles;
    use crate::geometry::{CurveClassification, CurveGeometry};
    use crate::types::{CurveType, Point};

    /// Classifies everything as an arch of fixed length heading right.
    pub struct StubGeometry {
        pub length: f64,
    }

    impl CurveGeometry for StubGeometry {
        fn classify(&self, _: &BezierHandles) -> CurveClassification {
            CurveClassification {
                curve_type: CurveType::Arch,
                intersections: None,
            }
        }
        fn tangent_at(&self, _: &BezierHandles, _: f64) -> Point {
            Point::new(1.0, 0.0)
        }
        fn length_of(&self, _: &BezierHandles) -> f64 {
            self.length
        }
        fn sub_curve(&self, curve: &BezierHandles, _: f64, _: f64) -> BezierHandles {
            *curve
        }
    }

    pub fn wave(i: usize) -> Point {
        let x = i as f64;
        Point::new(x, (x / 7.0).sin() * 20.0)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::StubGeometry;
    use super::*;
    use crate::matching::FeatureRecord;
    use crate::training::{
        Classification, GestureSampleStore, TrainedModel, TrainingDataset, TreeClassifier,
    };
    use crate::types::CurveType;

    #[derive(Debug)]
    struct Constant(Classification);

    impl TrainedModel for Constant {
        fn classify(&self, _: &[crate::matching::FeatureValue]) -> Classification {
            self.0
        }
    }

    struct ConstantClassifier(Classification);

    impl Classifier for ConstantClassifier {
        fn train(&self, _: &TrainingDataset<'_>) -> anyhow::Result<Box<dyn TrainedModel>> {
            Ok(Box::new(Constant(self.0)))
        }
    }

    fn arch() -> Vec<GestureDefinition> {
        vec![GestureDefinition {
            curve_type: Some(CurveType::Arch),
            ..Default::default()
        }]
    }

    fn context<'a>(
        definitions: &'a [GestureDefinition],
        store: SharedSampleStore,
        metrics: GestureMetrics,
        classifier: Option<&'a dyn Classifier>,
    ) -> StrategyContext<'a> {
        StrategyContext {
            fitting: FittingConfig {
                frame_size: 10,
                gesture_span: 5,
            },
            definitions,
            store,
            metrics,
            geometry: Arc::new(StubGeometry { length: 50.0 }),
            classifier,
        }
    }

    #[test]
    fn test_build_refreshes_store_base() {
        let defs = arch();
        let store = GestureSampleStore::shared();
        let ctx = context(&defs, store.clone(), GestureMetrics::new(), None);
        let strategy = build_strategy(StrategyKind::Null, ctx).unwrap();
        assert_eq!(strategy.name(), "Null");
        assert_eq!(store.read().gesture_count(), 1);
    }

    #[test]
    fn test_tree_matching_requires_classifier() {
        let defs = arch();
        let store = GestureSampleStore::shared();
        let result = build_strategy(
            StrategyKind::TreeMatching,
            context(&defs, store, GestureMetrics::new(), None),
        );
        assert!(matches!(result, Err(GestureError::MissingClassifier(_))));
    }

    #[test]
    fn test_tree_matching_vetoes_with_trained_model() {
        let defs = arch();
        let metrics = GestureMetrics::new();
        let store = GestureSampleStore::shared();
        let classifier = ConstantClassifier(Classification::Label(false));
        let mut strategy = build_strategy(
            StrategyKind::TreeMatching,
            context(&defs, store, metrics.clone(), Some(&classifier)),
        )
        .unwrap();

        for i in 0..30 {
            strategy.on_tick(test_support::wave(i));
        }
        let events = strategy.drain_events();
        assert!(!events
            .iter()
            .any(|e| matches!(e, GestureEvent::GestureMatched { .. })));
        assert!(metrics.summary().gestures_vetoed > 0);
        assert_eq!(metrics.summary().gestures_matched, 0);
    }

    #[test]
    fn test_tree_matching_learns_from_labelled_rows() {
        let defs = arch();
        let store = GestureSampleStore::shared();
        store.write().configure(&defs);
        let row = |length| FeatureRecord {
            curve_type: CurveType::Arch,
            average_residual: 0.0,
            frame_number: 1,
            length,
            tangent_in: Point::new(1.0, 0.0),
            tangent_out: Point::new(1.0, 0.0),
            intersections: None,
            proportion_inside_loop: 1.0,
            bezier: [Point::default(); 4],
        };
        for (length, matches) in [(500.0, true), (600.0, true), (40.0, false), (60.0, false)] {
            store.write().add_trial(&row(length), 0, matches).unwrap();
        }

        // Stub windows are 50 long, next to the rejected rows.
        let metrics = GestureMetrics::new();
        let classifier = TreeClassifier::new();
        let mut strategy = build_strategy(
            StrategyKind::TreeMatching,
            context(&defs, store.clone(), metrics.clone(), Some(&classifier)),
        )
        .unwrap();
        for i in 0..30 {
            strategy.on_tick(test_support::wave(i));
        }

        assert_eq!(metrics.summary().gestures_matched, 0);
        assert!(metrics.summary().gestures_vetoed > 0);
        assert!(store.read().sample_set(0).unwrap().is_trained());
    }

    #[test]
    fn test_tree_matching_accepts_untrained() {
        let defs = arch();
        let store = GestureSampleStore::shared();
        let classifier = ConstantClassifier(Classification::Untrained);
        let mut strategy = build_strategy(
            StrategyKind::TreeMatching,
            context(&defs, store, GestureMetrics::new(), Some(&classifier)),
        )
        .unwrap();

        for i in 0..10 {
            strategy.on_tick(test_support::wave(i));
        }
        assert!(strategy
            .drain_events()
            .contains(&GestureEvent::GestureMatched {
                index: 0,
                description: "FR=0, LN=50.0".to_string(),
            }));
    }

    #[test]
    fn test_handle_dispatches_input_events() {
        let defs = arch();
        let store = GestureSampleStore::shared();
        let mut strategy = build_strategy(
            StrategyKind::Signaled,
            context(&defs, store.clone(), GestureMetrics::new(), None),
        )
        .unwrap();

        strategy.handle(&InputEvent::Down);
        for i in 0..12 {
            let p = test_support::wave(i);
            strategy.handle(&InputEvent::Tick { x: p.x, y: p.y });
        }
        strategy.handle(&InputEvent::Up);
        strategy.handle(&InputEvent::Key {
            code: KeyCode::KeyW,
        });

        let events = strategy.drain_events();
        assert_eq!(
            events.last(),
            Some(&GestureEvent::TrialMarked {
                index: 0,
                matches: true,
            })
        );
        assert_eq!(store.read().sample_set(0).unwrap().samples().len(), 1);
    }
}
