// * Configuration: policy constants, run settings and the correction table

pub mod constants;
pub mod corrections;
pub mod settings;

pub use corrections::{CorrectionRule, CorrectionTable};
pub use settings::{ConfigError, KnownCampus, ScheduleConfig, ScheduleSettings};
