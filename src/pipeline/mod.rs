// src/pipeline/mod.rs

pub mod event_bus;
pub mod metrics;

pub use event_bus::{EventBus, GestureEvent, DEFAULT_MAX_PENDING};
pub use metrics::{GestureMetrics, MetricsSummary};
