// src/training/store.rs
//
// Labeled samples and trained models, one set per gesture definition.
//
// A gesture only learns from the features its definition leaves free: a
// feature the definition already constrains would be constant across every
// sample that reached the classifier and teaches nothing.
//
// The store is created once and shared by every matcher (`SharedSampleStore`).
// Changing the definition list rebuilds it from scratch; samples survive
// retraining, and a gesture's model is only replaced by a successful train.

use super::classifier::{Classification, Classifier, TrainedModel, TrainingDataset};
use crate::error::GestureError;
use crate::matching::{FeatureName, FeatureRecord, FeatureValue, GestureDefinition};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

pub type SharedSampleStore = Arc<RwLock<GestureSampleStore>>;

/// Serialized form: one list of rows per gesture, in definition order.
pub type SampleExport = Vec<Vec<TrainingSample>>;

/// A reduced feature row plus its human-assigned label.
///
/// Serialized as a flat array: the feature values followed by the label,
/// e.g. `[12.5, 3, 87.1, true]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RowCell>", into = "Vec<RowCell>")]
pub struct TrainingSample {
    pub values: Vec<FeatureValue>,
    pub matches: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RowCell {
    Label(bool),
    Value(FeatureValue),
}

impl TryFrom<Vec<RowCell>> for TrainingSample {
    type Error = String;

    fn try_from(mut cells: Vec<RowCell>) -> Result<Self, Self::Error> {
        let matches = match cells.pop() {
            Some(RowCell::Label(label)) => label,
            _ => return Err("sample row must end with a boolean label".to_string()),
        };
        let values = cells
            .into_iter()
            .map(|cell| match cell {
                RowCell::Value(value) => Ok(value),
                RowCell::Label(_) => Err("label found before the end of a sample row".to_string()),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { values, matches })
    }
}

impl From<TrainingSample> for Vec<RowCell> {
    fn from(sample: TrainingSample) -> Self {
        sample
            .values
            .into_iter()
            .map(RowCell::Value)
            .chain(std::iter::once(RowCell::Label(sample.matches)))
            .collect()
    }
}

#[derive(Debug)]
pub struct GestureSampleSet {
    features: Vec<FeatureName>,
    samples: Vec<TrainingSample>,
    model: Option<Box<dyn TrainedModel>>,
}

impl GestureSampleSet {
    fn for_definition(definition: &GestureDefinition) -> Self {
        Self {
            features: FeatureName::unconstrained_by(definition),
            samples: Vec::new(),
            model: None,
        }
    }

    pub fn features(&self) -> &[FeatureName] {
        &self.features
    }

    pub fn samples(&self) -> &[TrainingSample] {
        &self.samples
    }

    pub fn is_trained(&self) -> bool {
        self.model.is_some()
    }
}

#[derive(Debug, Default)]
pub struct GestureSampleStore {
    gestures: Vec<GestureSampleSet>,
    base: Vec<GestureDefinition>,
}

impl GestureSampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedSampleStore {
        Arc::new(RwLock::new(Self::new()))
    }

    pub fn gesture_count(&self) -> usize {
        self.gestures.len()
    }

    pub fn sample_set(&self, index: usize) -> Option<&GestureSampleSet> {
        self.gestures.get(index)
    }

    /// Adopt a new definition list. Rebuilds (dropping samples and models)
    /// only when it differs from the current one; returns whether it did.
    pub fn configure(&mut self, definitions: &[GestureDefinition]) -> bool {
        if !self.gestures.is_empty() && self.base == definitions {
            return false;
        }
        info!(
            "Updating gesture base in sample store ({} gestures)",
            definitions.len()
        );
        self.base = definitions.to_vec();
        self.rebuild();
        true
    }

    /// Drop all samples and models, keeping the current definitions.
    pub fn reset_samples(&mut self) {
        self.rebuild();
        info!("Training samples reset");
    }

    fn rebuild(&mut self) {
        self.gestures = self
            .base
            .iter()
            .map(GestureSampleSet::for_definition)
            .collect();
    }

    fn gesture(&self, index: usize) -> Result<&GestureSampleSet, GestureError> {
        self.gestures.get(index).ok_or(GestureError::UnknownGesture {
            index,
            configured: self.gestures.len(),
        })
    }

    fn gesture_mut(&mut self, index: usize) -> Result<&mut GestureSampleSet, GestureError> {
        let configured = self.gestures.len();
        self.gestures
            .get_mut(index)
            .ok_or(GestureError::UnknownGesture { index, configured })
    }

    pub fn add_trial(
        &mut self,
        features: &FeatureRecord,
        gesture_index: usize,
        matches: bool,
    ) -> Result<(), GestureError> {
        let set = self.gesture_mut(gesture_index)?;
        set.samples.push(TrainingSample {
            values: features.row(&set.features),
            matches,
        });
        info!(
            "Added new sample to gesture {} with match={} ({} samples)",
            gesture_index + 1,
            matches,
            set.samples.len()
        );
        Ok(())
    }

    /// Ask the gesture's model about `features`.
    ///
    /// A model that has not seen any data yet answers `Untrained`, which
    /// accepts. Calling this before `retrain` is an error.
    pub fn verify(
        &self,
        features: &FeatureRecord,
        gesture_index: usize,
    ) -> Result<bool, GestureError> {
        let set = self.gesture(gesture_index)?;
        let model = set
            .model
            .as_ref()
            .ok_or(GestureError::UntrainedModel { gesture_index })?;

        match model.classify(&features.row(&set.features)) {
            Classification::Untrained => {
                info!("Accepted untrained gesture {}", gesture_index + 1);
                Ok(true)
            }
            Classification::Label(matches) => Ok(matches),
        }
    }

    /// Train a fresh model per gesture. Stops at the first failure, which
    /// leaves that gesture's previous model in place.
    pub fn retrain(&mut self, classifier: &dyn Classifier) -> Result<(), GestureError> {
        for (gesture_index, set) in self.gestures.iter_mut().enumerate() {
            let dataset = TrainingDataset::new(&set.samples, &set.features);
            match classifier.train(&dataset) {
                Ok(model) => {
                    debug!("Gesture {} tree: {}", gesture_index + 1, model.describe());
                    set.model = Some(model);
                }
                Err(e) => {
                    error!("Training gesture {} failed: {:#}", gesture_index + 1, e);
                    return Err(GestureError::Training {
                        gesture_index,
                        message: format!("{:#}", e),
                    });
                }
            }
        }
        info!("Retrained {} gesture model(s)", self.gestures.len());
        Ok(())
    }

    pub fn export_samples(&self) -> SampleExport {
        self.gestures
            .iter()
            .map(|set| set.samples.clone())
            .collect()
    }

    /// Load exported samples. With `reset_current` existing samples are
    /// replaced, otherwise appended. The export must match the current
    /// gesture base (same gesture count, same row widths); nothing is changed
    /// when it does not.
    pub fn import_samples(
        &mut self,
        samples: SampleExport,
        reset_current: bool,
    ) -> Result<(), GestureError> {
        if samples.len() != self.gestures.len() {
            return Err(GestureError::SampleShape(format!(
                "{} gesture sample list(s) for {} configured gesture(s)",
                samples.len(),
                self.gestures.len()
            )));
        }
        for (index, (rows, set)) in samples.iter().zip(&self.gestures).enumerate() {
            let width = set.features.len();
            if let Some(row) = rows.iter().find(|row| row.values.len() != width) {
                return Err(GestureError::SampleShape(format!(
                    "gesture {} expects {} feature(s) per row, found {}",
                    index + 1,
                    width,
                    row.values.len()
                )));
            }
        }

        for (rows, set) in samples.into_iter().zip(self.gestures.iter_mut()) {
            if reset_current {
                set.samples.clear();
            }
            set.samples.extend(rows);
        }
        info!(
            "Imported training samples (reset_current={})",
            reset_current
        );
        Ok(())
    }

    pub fn export_json(&self) -> Result<String, GestureError> {
        Ok(serde_json::to_string(&self.export_samples())?)
    }

    pub fn import_json(&mut self, json: &str, reset_current: bool) -> Result<(), GestureError> {
        let samples: SampleExport = serde_json::from_str(json)?;
        self.import_samples(samples, reset_current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CurveType, Point};
    use anyhow::anyhow;
    use std::cell::Cell;

    fn features(length: f64) -> FeatureRecord {
        FeatureRecord {
            curve_type: CurveType::Arch,
            average_residual: 2.5,
            frame_number: 3,
            length,
            tangent_in: Point::new(1.0, 0.0),
            tangent_out: Point::new(0.0, 1.0),
            intersections: None,
            proportion_inside_loop: 1.0,
            bezier: [Point::default(); 4],
        }
    }

    fn definitions() -> Vec<GestureDefinition> {
        vec![
            GestureDefinition {
                curve_type: Some(CurveType::Arch),
                length: Some([10, 100]),
                ..Default::default()
            },
            GestureDefinition::default(),
        ]
    }

    /// Accepts rows whose `length` is below a threshold learned from data.
    #[derive(Debug)]
    struct LengthModel {
        column: Option<usize>,
        max_positive: Option<f64>,
    }

    impl TrainedModel for LengthModel {
        fn classify(&self, row: &[FeatureValue]) -> Classification {
            match (self.column, self.max_positive) {
                (Some(col), Some(max)) => match row[col] {
                    FeatureValue::Number(v) => Classification::Label(v <= max),
                    FeatureValue::Category(_) => Classification::Label(false),
                },
                _ => Classification::Untrained,
            }
        }
    }

    struct LengthClassifier;

    impl Classifier for LengthClassifier {
        fn train(&self, dataset: &TrainingDataset<'_>) -> anyhow::Result<Box<dyn TrainedModel>> {
            let column = dataset.column_of(FeatureName::Length);
            let max_positive = column.and_then(|col| {
                dataset
                    .samples
                    .iter()
                    .filter(|s| s.matches)
                    .filter_map(|s| match s.values[col] {
                        FeatureValue::Number(v) => Some(v),
                        FeatureValue::Category(_) => None,
                    })
                    .reduce(f64::max)
            });
            Ok(Box::new(LengthModel {
                column,
                max_positive,
            }))
        }
    }

    /// Fails on the n-th gesture it is asked to train.
    struct FailingClassifier {
        fail_at: usize,
        calls: Cell<usize>,
    }

    impl Classifier for FailingClassifier {
        fn train(&self, _dataset: &TrainingDataset<'_>) -> anyhow::Result<Box<dyn TrainedModel>> {
            let call = self.calls.get();
            self.calls.set(call + 1);
            if call == self.fail_at {
                Err(anyhow!("not enough distinct samples"))
            } else {
                Ok(Box::new(LengthModel {
                    column: None,
                    max_positive: None,
                }))
            }
        }
    }

    #[test]
    fn test_configure_reduces_features_per_gesture() {
        let mut store = GestureSampleStore::new();
        assert!(store.configure(&definitions()));
        assert_eq!(store.gesture_count(), 2);
        assert_eq!(store.sample_set(0).unwrap().features().len(), 5);
        assert_eq!(store.sample_set(1).unwrap().features().len(), 7);
        let reduced = store.sample_set(0).unwrap().features();
        assert!(!reduced.contains(&FeatureName::Length));
    }

    #[test]
    fn test_configure_same_base_keeps_samples() {
        let mut store = GestureSampleStore::new();
        store.configure(&definitions());
        store.add_trial(&features(50.0), 1, true).unwrap();

        assert!(!store.configure(&definitions()));
        assert_eq!(store.sample_set(1).unwrap().samples().len(), 1);

        assert!(store.configure(&definitions()[..1]));
        assert_eq!(store.gesture_count(), 1);
        assert!(store.sample_set(0).unwrap().samples().is_empty());
    }

    #[test]
    fn test_add_trial_records_reduced_row() {
        let mut store = GestureSampleStore::new();
        store.configure(&definitions());
        store.add_trial(&features(42.0), 0, false).unwrap();

        let sample = &store.sample_set(0).unwrap().samples()[0];
        assert!(!sample.matches);
        // averageResidual, frameNumber, angleIn, angleOut, proportionInsideLoop
        assert_eq!(
            sample.values,
            vec![
                FeatureValue::Number(2.5),
                FeatureValue::Number(3.0),
                FeatureValue::Number(0.0),
                FeatureValue::Number(90.0),
                FeatureValue::Number(1.0),
            ]
        );

        assert!(matches!(
            store.add_trial(&features(1.0), 5, true),
            Err(GestureError::UnknownGesture {
                index: 5,
                configured: 2,
            })
        ));
    }

    #[test]
    fn test_verify_before_retrain_is_an_error() {
        let mut store = GestureSampleStore::new();
        store.configure(&definitions());
        assert!(matches!(
            store.verify(&features(50.0), 0),
            Err(GestureError::UntrainedModel { gesture_index: 0 })
        ));
    }

    #[test]
    fn test_untrained_sentinel_accepts_anything() {
        let mut store = GestureSampleStore::new();
        store.configure(&definitions());
        store.retrain(&LengthClassifier).unwrap();

        // No samples: the model answers Untrained for any row.
        assert!(store.verify(&features(1.0), 1).unwrap());
        assert!(store.verify(&features(1e9), 1).unwrap());
    }

    #[test]
    fn test_retrained_model_vetoes() {
        let mut store = GestureSampleStore::new();
        store.configure(&definitions());
        store.add_trial(&features(30.0), 1, true).unwrap();
        store.add_trial(&features(60.0), 1, true).unwrap();
        store.add_trial(&features(400.0), 1, false).unwrap();
        store.retrain(&LengthClassifier).unwrap();

        assert!(store.verify(&features(55.0), 1).unwrap());
        assert!(!store.verify(&features(300.0), 1).unwrap());
    }

    #[test]
    fn test_failed_retrain_keeps_previous_model() {
        let mut store = GestureSampleStore::new();
        store.configure(&definitions());
        store.add_trial(&features(30.0), 1, true).unwrap();
        store.retrain(&LengthClassifier).unwrap();
        assert!(!store.verify(&features(300.0), 1).unwrap());

        let failing = FailingClassifier {
            fail_at: 1,
            calls: Cell::new(0),
        };
        let err = store.retrain(&failing).unwrap_err();
        assert!(matches!(
            err,
            GestureError::Training {
                gesture_index: 1,
                ..
            }
        ));

        // Gesture 2 still answers with the model trained before.
        assert!(!store.verify(&features(300.0), 1).unwrap());
    }

    #[test]
    fn test_reset_samples_clears_samples_and_models() {
        let mut store = GestureSampleStore::new();
        store.configure(&definitions());
        store.add_trial(&features(30.0), 0, true).unwrap();
        store.retrain(&LengthClassifier).unwrap();

        store.reset_samples();
        assert_eq!(store.gesture_count(), 2);
        assert!(store.sample_set(0).unwrap().samples().is_empty());
        assert!(!store.sample_set(0).unwrap().is_trained());
    }

    #[test]
    fn test_export_import_reproduces_samples() {
        let mut store = GestureSampleStore::new();
        store.configure(&definitions());
        store.add_trial(&features(30.0), 0, true).unwrap();
        store.add_trial(&features(70.0), 1, false).unwrap();
        store.add_trial(&features(90.0), 1, true).unwrap();
        let json = store.export_json().unwrap();
        let exported = store.export_samples();

        let mut other = GestureSampleStore::new();
        other.configure(&definitions());
        other.add_trial(&features(5.0), 0, false).unwrap();
        other.import_json(&json, true).unwrap();
        assert_eq!(other.export_samples(), exported);

        other.import_json(&json, false).unwrap();
        assert_eq!(other.sample_set(1).unwrap().samples().len(), 4);
    }

    #[test]
    fn test_sample_rows_serialize_flat() {
        let sample = TrainingSample {
            values: vec![
                FeatureValue::Category(CurveType::Loop),
                FeatureValue::Number(12.5),
            ],
            matches: true,
        };
        let json = serde_json::to_string(&sample).unwrap();
        assert_eq!(json, r#"["loop",12.5,true]"#);
        assert_eq!(
            serde_json::from_str::<TrainingSample>(&json).unwrap(),
            sample
        );

        assert!(serde_json::from_str::<TrainingSample>("[1.0, 2.0]").is_err());
        assert!(serde_json::from_str::<TrainingSample>("[true, 2.0, false]").is_err());
    }

    #[test]
    fn test_import_rejects_mismatched_shape() {
        let mut store = GestureSampleStore::new();
        store.configure(&definitions());
        store.add_trial(&features(30.0), 0, true).unwrap();

        assert!(matches!(
            store.import_json("[[]]", true),
            Err(GestureError::SampleShape(_))
        ));
        assert!(matches!(
            store.import_json("[[[1.0, true]], []]", true),
            Err(GestureError::SampleShape(_))
        ));
        // Nothing was touched.
        assert_eq!(store.sample_set(0).unwrap().samples().len(), 1);
    }
}
