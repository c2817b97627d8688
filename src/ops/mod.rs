// * Operations: structured logging and run totals

pub mod telemetry;

// * Re-exports for convenient access
pub use telemetry::{
    init_tracing, init_tracing_pretty, init_tracing_with_level, RunStatsCollector, RunTotals,
};
