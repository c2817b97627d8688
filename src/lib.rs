// * Timetable-Flow: class schedule extraction from timetable emails

pub mod config;
pub mod engine;
pub mod ops;
pub mod persistence;
pub mod refinery;

pub use config::{ScheduleConfig, ScheduleSettings};
pub use persistence::schema::{ClassRecord, RawEmailMessage, ScheduleSnapshot};
pub use refinery::{refine_message, Refinery, RefineryError, RefineryOutcome, RunDiagnostics};
