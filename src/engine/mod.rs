// * Engine: semester filtering, field correction and target-day resolution

pub mod calendar;
pub mod correction;
pub mod semester;

pub use calendar::{resolve_target, TargetDay};
pub use correction::{AppliedCorrection, CorrectionEngine, CorrectionSource, REPAIR_PLAN};
pub use semester::{normalize_semester, SemesterFilter};
