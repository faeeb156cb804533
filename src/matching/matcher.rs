// src/matching/matcher.rs
//
// First-match gesture recognition over an ordered definition list.
//
// A curve is turned into a FeatureRecord once, then the definitions are tried
// in declared order. The first one whose present constraints all hold is the
// candidate; an optional additional check may still veto it, in which case the
// scan continues with the next definition. Accepted matches are remembered so
// the user can label them as trials afterwards.

use super::definition::GestureDefinition;
use super::features::{FeatureExtractor, FeatureRecord};
use crate::fitting::PlanarCurve;
use crate::pipeline::GestureMetrics;
use crate::training::SharedSampleStore;
use tracing::{debug, error, info};

/// Secondary veto consulted after a definition's constraints hold.
pub trait AdditionalCheck: Send + Sync {
    fn verify(&self, features: &FeatureRecord, gesture_index: usize) -> bool;
}

/// Whether every constraint present in `definition` holds for `features`.
pub fn satisfies(definition: &GestureDefinition, features: &FeatureRecord) -> bool {
    if let Some(curve_type) = definition.curve_type {
        if curve_type != features.curve_type {
            return false;
        }
    }
    if let Some(dir) = &definition.in_dir {
        if !dir.is_satisfied_by(features.angle_in()) {
            return false;
        }
    }
    if let Some(dir) = &definition.out_dir {
        if !dir.is_satisfied_by(features.angle_out()) {
            return false;
        }
    }
    if let Some(ceiling) = definition.average_residual {
        if features.average_residual >= ceiling as f64 {
            return false;
        }
    }
    if let Some([min, max]) = definition.number_of_frames {
        if features.frame_number < min || features.frame_number > max {
            return false;
        }
    }
    if let Some([min, max]) = definition.length {
        if features.length < min as f64 || features.length > max as f64 {
            return false;
        }
    }
    true
}

#[derive(Debug, Clone)]
struct RecentMatch {
    gesture_index: usize,
    features: FeatureRecord,
}

pub struct GestureMatcher {
    definitions: Vec<GestureDefinition>,
    extractor: FeatureExtractor,
    store: SharedSampleStore,
    additional_check: Option<Box<dyn AdditionalCheck>>,
    metrics: GestureMetrics,
    recent: Option<RecentMatch>,
}

impl GestureMatcher {
    pub fn new(
        definitions: Vec<GestureDefinition>,
        extractor: FeatureExtractor,
        store: SharedSampleStore,
        metrics: GestureMetrics,
    ) -> Self {
        Self {
            definitions,
            extractor,
            store,
            additional_check: None,
            metrics,
            recent: None,
        }
    }

    pub fn with_additional_check(mut self, check: Box<dyn AdditionalCheck>) -> Self {
        self.additional_check = Some(check);
        self
    }

    pub fn definitions(&self) -> &[GestureDefinition] {
        &self.definitions
    }

    pub fn extractor(&self) -> &FeatureExtractor {
        &self.extractor
    }

    /// Index and features of the last accepted match, until `reset`.
    pub fn recent_match(&self) -> Option<(usize, &FeatureRecord)> {
        self.recent
            .as_ref()
            .map(|recent| (recent.gesture_index, &recent.features))
    }

    pub fn match_curve(
        &mut self,
        curve: &PlanarCurve,
        residual: f64,
        sample_count: usize,
    ) -> Option<usize> {
        let features = self.extractor.extract(curve, residual, sample_count);
        self.match_features(features)
    }

    /// Match an already extracted record.
    pub fn match_features(&mut self, features: FeatureRecord) -> Option<usize> {
        for (index, definition) in self.definitions.iter().enumerate() {
            if !satisfies(definition, &features) {
                continue;
            }

            if let Some(check) = &self.additional_check {
                if !check.verify(&features, index) {
                    debug!("Gesture {} vetoed by additional check", index + 1);
                    self.metrics.inc(&self.metrics.gestures_vetoed);
                    continue;
                }
            }

            info!(
                "🌀 Matched gesture {}. ({})",
                index + 1,
                features.debug_description()
            );
            self.metrics.inc(&self.metrics.gestures_matched);
            self.recent = Some(RecentMatch {
                gesture_index: index,
                features,
            });
            return Some(index);
        }
        None
    }

    /// Label the most recent match as a positive or negative trial.
    /// Returns false (recording nothing) when there is no recent match.
    pub fn mark_trial(&mut self, is_positive: bool) -> bool {
        let Some(recent) = &self.recent else {
            return false;
        };

        match self
            .store
            .write()
            .add_trial(&recent.features, recent.gesture_index, is_positive)
        {
            Ok(()) => self.metrics.inc(&self.metrics.trials_marked),
            Err(e) => error!("Could not record trial: {}", e),
        }
        true
    }

    /// Forget the recent match.
    pub fn reset(&mut self) {
        self.recent = None;
    }

    pub fn debug_description(&self) -> Option<String> {
        self.recent
            .as_ref()
            .map(|recent| recent.features.debug_description())
    }
}
