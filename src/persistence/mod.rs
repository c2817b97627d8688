// * Persistence: the schedule data model and snapshot assembly
// * Storage itself lives outside this crate; this module defines what gets stored.

pub mod assembler;
pub mod schema;

// * Re-exports for convenient access
pub use assembler::{assemble, start_minutes, summarize, DedupResult, RecordAssembler};
pub use schema::{
    is_present, ClassRecord, Field, RawEmailMessage, ScheduleSnapshot, ScheduleSummary,
};
