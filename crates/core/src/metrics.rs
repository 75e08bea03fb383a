//! Prometheus metrics for the build pipeline.
//!
//! This module provides metrics for:
//! - Dispatch (stage dispatches, in-flight work)
//! - Outcomes (built and failed media, discarded sources, skipped augmentation)
//! - Batches (submissions and time to resolution)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Dispatch Metrics
// =============================================================================

/// Stage dispatches total by stage.
pub static STAGE_DISPATCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "playbuild_stage_dispatches_total",
            "Total stage dispatches to the worker pool",
        ),
        &["stage"], // "primary", "secondary"
    )
    .unwrap()
});

/// Stages dispatched but not yet completed.
pub static IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "playbuild_in_flight",
        "Stages currently dispatched and not yet completed",
    )
    .unwrap()
});

// =============================================================================
// Outcome Metrics
// =============================================================================

/// Jobs finalized total by outcome.
pub static JOBS_FINALIZED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("playbuild_jobs_finalized_total", "Total jobs finalized"),
        &["outcome"], // "built", "failed"
    )
    .unwrap()
});

/// Supplementary sources discarded after failed validation.
pub static SOURCES_DISCARDED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "playbuild_sources_discarded_total",
            "Total candidate sources discarded by validation",
        ),
        &["reason"], // "invalid", "error"
    )
    .unwrap()
});

/// Sources attached during augmentation.
pub static SOURCES_ATTACHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "playbuild_sources_attached_total",
            "Total sources attached to media items",
        ),
        &["stage"],
    )
    .unwrap()
});

/// Augmentation skipped total by reason.
pub static AUGMENTATION_SKIPPED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "playbuild_augmentation_skipped_total",
            "Total items whose augmentation was skipped",
        ),
        &["reason"], // "disabled", "no_lookup", "unavailable", "error", "empty"
    )
    .unwrap()
});

// =============================================================================
// Batch Metrics
// =============================================================================

/// Batches submitted total.
pub static BATCHES_SUBMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("playbuild_batches_submitted_total", "Total batches submitted"),
        &[],
    )
    .unwrap()
});

/// Time from submission to resolution.
pub static BATCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "playbuild_batch_duration_seconds",
            "Duration from batch submission to resolution",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Dispatch
        Box::new(STAGE_DISPATCHES.clone()),
        Box::new(IN_FLIGHT.clone()),
        // Outcomes
        Box::new(JOBS_FINALIZED.clone()),
        Box::new(SOURCES_DISCARDED.clone()),
        Box::new(SOURCES_ATTACHED.clone()),
        Box::new(AUGMENTATION_SKIPPED.clone()),
        // Batches
        Box::new(BATCHES_SUBMITTED.clone()),
        Box::new(BATCH_DURATION.clone()),
    ]
}
