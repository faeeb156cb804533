// src/main.rs

use anyhow::Result;
use gesture_fit::geometry::{CurveGeometry, KurboGeometry};
use gesture_fit::matching::{default_definitions, load_definitions, GestureDefinition};
use gesture_fit::pipeline::{GestureEvent, GestureMetrics, MetricsSummary};
use gesture_fit::recording::{find_recording_files, load_recording};
use gesture_fit::strategy::{build_strategy, StrategyContext};
use gesture_fit::training::{Classifier, GestureSampleStore, SharedSampleStore, TreeClassifier};
use gesture_fit::types::Config;
use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = env::args()
        .nth(1)
        .or_else(|| env::var("GESTURE_FIT_CONFIG").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("gesture_fit={}", config.logging.level)));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("✋ Gesture fitting starting");
    info!("✓ Configuration loaded from {}", config_path);
    info!(
        "Fitting: frame_size={}, gesture_span={}, strategy={}",
        config.fitting.frame_size,
        config.fitting.gesture_span,
        config.strategy.kind.as_str()
    );

    let definitions = match &config.gestures.definitions_path {
        Some(path) => load_definitions(path)?,
        None => {
            info!("No definitions file configured, using built-in examples");
            default_definitions()
        }
    };

    let store = GestureSampleStore::shared();
    store.write().configure(&definitions);

    if let Some(path) = &config.training.import_path {
        let json = fs::read_to_string(path)?;
        store
            .write()
            .import_json(&json, config.training.reset_on_import)?;
        info!("✓ Training samples imported from {}", path);
    }

    let recordings = find_recording_files(&config.recordings.input_dir)?;
    if recordings.is_empty() {
        error!("No recordings found in {}", config.recordings.input_dir);
        return Ok(());
    }

    let geometry: Arc<dyn CurveGeometry> = Arc::new(KurboGeometry::new());
    let classifier = TreeClassifier::new();

    for (idx, path) in recordings.iter().enumerate() {
        info!("========================================");
        info!(
            "Replaying recording {}/{}: {}",
            idx + 1,
            recordings.len(),
            path.display()
        );

        let outcome = replay(
            path,
            &config,
            &definitions,
            &store,
            geometry.clone(),
            &classifier,
        )
        .await;
        match outcome {
            Ok(summary) => log_summary(&summary),
            Err(e) => error!("Failed to replay {}: {:#}", path.display(), e),
        }
    }

    if let Some(path) = &config.training.export_path {
        let json = store.read().export_json()?;
        fs::write(path, json)?;
        info!("✓ Training samples exported to {}", path);
    }

    Ok(())
}

async fn replay(
    path: &Path,
    config: &Config,
    definitions: &[GestureDefinition],
    store: &SharedSampleStore,
    geometry: Arc<dyn CurveGeometry>,
    classifier: &dyn Classifier,
) -> Result<MetricsSummary> {
    let events = load_recording(path)?;
    let metrics = GestureMetrics::new();

    let mut strategy = build_strategy(
        config.strategy.kind,
        StrategyContext {
            fitting: config.fitting,
            definitions,
            store: store.clone(),
            metrics: metrics.clone(),
            geometry,
            classifier: Some(classifier),
        },
    )?;

    let mut ticker = (config.recordings.tick_interval_ms > 0)
        .then(|| tokio::time::interval(Duration::from_millis(config.recordings.tick_interval_ms)));

    for event in &events {
        if let Some(ticker) = ticker.as_mut() {
            ticker.tick().await;
        }
        strategy.handle(event);
        for gesture_event in strategy.drain_events() {
            log_event(&gesture_event);
        }
    }

    Ok(metrics.summary())
}

fn log_event(event: &GestureEvent) {
    match event {
        GestureEvent::FrameAdvanced => {}
        GestureEvent::WindowFitted { frame_number, .. } => {
            debug!("Window fitted (frame {})", frame_number)
        }
        GestureEvent::GestureMatched { index, description } => {
            info!("✅ Gesture {} recognized ({})", index + 1, description)
        }
        GestureEvent::TrialMarked { index, matches } => {
            info!("📝 Trial for gesture {} marked match={}", index + 1, matches)
        }
        GestureEvent::NoGesture => debug!("No gesture"),
    }
}

fn log_summary(summary: &MetricsSummary) {
    info!("✓ Recording replayed");
    info!("  Points: {} ({} frames)", summary.points, summary.frames);
    info!(
        "  Windows fitted: {} (skipped: {})",
        summary.windows_fitted, summary.windows_skipped
    );
    info!("  Gestures matched: {}", summary.gestures_matched);
    if summary.gestures_vetoed > 0 {
        info!("  🌳 Vetoed by classifier: {}", summary.gestures_vetoed);
    }
    info!("  Trials marked: {}", summary.trials_marked);
    match serde_json::to_string(summary) {
        Ok(json) => debug!("Summary: {}", json),
        Err(e) => error!("Could not serialize summary: {}", e),
    }
}
