// * Telemetry - JSON logging and run totals
// * Structured logging setup plus an in-process collector for diagnostics across runs.

use crate::refinery::RunDiagnostics;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Initializes the tracing subscriber with JSON formatting
///
/// # Example
/// ```ignore
/// use timetable_flow::ops::telemetry;
///
/// telemetry::init_tracing();
/// tracing::info!(message_id = "m-1", "Refining message");
/// ```
pub fn init_tracing() {
    init_tracing_with_level("info");
}

/// Initializes tracing with custom log level. `RUST_LOG` still wins when set.
pub fn init_tracing_with_level(level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    // * Logs go to stderr; stdout carries snapshot JSON
    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json().with_writer(std::io::stderr))
        .try_init();
    report_init(result);
}

/// Initializes tracing with pretty formatting (for development)
pub fn init_tracing_pretty() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("debug"));

    let result = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().pretty().with_writer(std::io::stderr))
        .try_init();
    report_init(result);
}

// * A second init (tests, embedding callers) keeps the subscriber already in place
fn report_init(result: Result<(), TryInitError>) {
    match result {
        Ok(()) => tracing::debug!("Tracing initialized"),
        Err(err) => tracing::debug!(error = %err, "Tracing subscriber already set"),
    }
}

/// Point-in-time copy of [`RunStatsCollector`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTotals {
    pub messages_refined: u64,
    pub messages_malformed: u64,
    pub rows_tokenized: u64,
    pub unparseable_rows: u64,
    pub partial_extractions: u64,
    pub filtered_out: u64,
    pub corrections_applied: u64,
    pub duplicates_removed: u64,
}

/// Totals across concurrent runs. Owned by the caller and shared via `Arc`.
#[derive(Debug, Default)]
pub struct RunStatsCollector {
    messages_refined: AtomicU64,
    messages_malformed: AtomicU64,
    rows_tokenized: AtomicU64,
    unparseable_rows: AtomicU64,
    partial_extractions: AtomicU64,
    filtered_out: AtomicU64,
    corrections_applied: AtomicU64,
    duplicates_removed: AtomicU64,
}

impl RunStatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_run(&self, diagnostics: &RunDiagnostics) {
        self.messages_refined.fetch_add(1, Ordering::Relaxed);
        self.rows_tokenized
            .fetch_add(diagnostics.rows_tokenized as u64, Ordering::Relaxed);
        self.unparseable_rows
            .fetch_add(diagnostics.unparseable_rows as u64, Ordering::Relaxed);
        self.partial_extractions
            .fetch_add(diagnostics.partial_extractions as u64, Ordering::Relaxed);
        self.filtered_out
            .fetch_add(diagnostics.filtered_out as u64, Ordering::Relaxed);
        self.corrections_applied
            .fetch_add(diagnostics.corrections_applied as u64, Ordering::Relaxed);
        self.duplicates_removed
            .fetch_add(diagnostics.duplicates_removed as u64, Ordering::Relaxed);
    }

    pub fn record_malformed(&self) {
        self.messages_malformed.fetch_add(1, Ordering::Relaxed);
    }

    /// Share of messages that produced a snapshot; 1.0 before any run
    pub fn get_success_rate(&self) -> f64 {
        let refined = self.messages_refined.load(Ordering::Relaxed) as f64;
        let malformed = self.messages_malformed.load(Ordering::Relaxed) as f64;
        let total = refined + malformed;
        if total > 0.0 {
            refined / total
        } else {
            1.0
        }
    }

    pub fn totals(&self) -> RunTotals {
        RunTotals {
            messages_refined: self.messages_refined.load(Ordering::Relaxed),
            messages_malformed: self.messages_malformed.load(Ordering::Relaxed),
            rows_tokenized: self.rows_tokenized.load(Ordering::Relaxed),
            unparseable_rows: self.unparseable_rows.load(Ordering::Relaxed),
            partial_extractions: self.partial_extractions.load(Ordering::Relaxed),
            filtered_out: self.filtered_out.load(Ordering::Relaxed),
            corrections_applied: self.corrections_applied.load(Ordering::Relaxed),
            duplicates_removed: self.duplicates_removed.load(Ordering::Relaxed),
        }
    }

    /// Emits the totals as one structured event
    pub fn log_totals(&self) {
        let totals = self.totals();
        tracing::info!(
            messages_refined = totals.messages_refined,
            messages_malformed = totals.messages_malformed,
            rows_tokenized = totals.rows_tokenized,
            unparseable_rows = totals.unparseable_rows,
            partial_extractions = totals.partial_extractions,
            filtered_out = totals.filtered_out,
            corrections_applied = totals.corrections_applied,
            duplicates_removed = totals.duplicates_removed,
            success_rate = self.get_success_rate(),
            "Run totals"
        );
    }
}
