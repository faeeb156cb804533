// src/training/check.rs

use super::store::SharedSampleStore;
use crate::matching::{AdditionalCheck, FeatureRecord};
use tracing::{error, info};

/// Veto backed by the shared sample store's trained models.
#[derive(Clone)]
pub struct SampleStoreCheck {
    store: SharedSampleStore,
}

impl SampleStoreCheck {
    pub fn new(store: SharedSampleStore) -> Self {
        Self { store }
    }
}

impl AdditionalCheck for SampleStoreCheck {
    fn verify(&self, features: &FeatureRecord, gesture_index: usize) -> bool {
        match self.store.read().verify(features, gesture_index) {
            Ok(true) => {
                info!("🌳 Decision tree ACCEPTED gesture {}", gesture_index + 1);
                true
            }
            Ok(false) => {
                info!("🌳 Decision tree REJECTED gesture {}", gesture_index + 1);
                false
            }
            Err(e) => {
                error!("Additional check failed: {}", e);
                false
            }
        }
    }
}
