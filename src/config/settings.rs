// * Run configuration
// * ScheduleSettings is the serde-facing document (file + env overrides).
// * ScheduleConfig is the validated, immutable form shared across invocations.

use crate::config::constants::{
    EmptyFilterPolicy, TbdRoomPolicy, DEFAULT_CAMPUS, DEFAULT_NEXT_DAY_AVAILABLE_HOUR,
    DEFAULT_SEMESTER_PATTERN, DEFAULT_UTC_OFFSET_MINUTES, EMPTY_FILTER_POLICY, TBD_ROOM_POLICY,
};
use crate::config::corrections::{builtin_rules, CorrectionRule, CorrectionTable};
use crate::engine::semester::SemesterFilter;
use chrono::FixedOffset;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

// * Environment variables that take precedence over the settings file
pub const ENV_ALLOWED_SEMESTERS: &str = "ALLOWED_SEMESTERS";
pub const ENV_DEFAULT_CAMPUS: &str = "DEFAULT_CAMPUS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("next_day_available_hour must be 0-23, got {0}")]
    InvalidHour(u32),

    #[error("utc_offset_minutes out of range: {0}")]
    InvalidOffset(i32),
}

/// Serde-facing settings document. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    pub allowed_semesters: Vec<String>,
    pub course_corrections: BTreeMap<String, CorrectionRule>,
    pub default_campus: String,
    pub known_campuses: Vec<String>,
    pub department_names: BTreeMap<String, String>,
    pub semester_pattern: String,
    pub next_day_available_hour: u32,
    pub utc_offset_minutes: i32,
    pub empty_filter_policy: EmptyFilterPolicy,
    pub tbd_room_policy: TbdRoomPolicy,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            allowed_semesters: Vec::new(),
            course_corrections: builtin_rules(),
            default_campus: DEFAULT_CAMPUS.to_string(),
            known_campuses: vec![
                "SZABIST University Campus H-8/4 ISB".to_string(),
                "SZABIST University Campus".to_string(),
                "SZABIST HMB".to_string(),
            ],
            department_names: default_department_names(),
            semester_pattern: DEFAULT_SEMESTER_PATTERN.to_string(),
            next_day_available_hour: DEFAULT_NEXT_DAY_AVAILABLE_HOUR,
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            empty_filter_policy: EMPTY_FILTER_POLICY,
            tbd_room_policy: TBD_ROOM_POLICY,
        }
    }
}

fn default_department_names() -> BTreeMap<String, String> {
    [
        ("CS", "Computer Science"),
        ("CSC", "Computer Science"),
        ("SE", "Software Engineering"),
        ("AI", "Artificial Intelligence"),
        ("MATH", "Mathematics"),
        ("ENG", "English"),
        ("PHY", "Physics"),
        ("CHEM", "Chemistry"),
        ("BBA", "Business Administration"),
        ("MBA", "Master of Business Administration"),
        ("PSY", "Psychology"),
        ("MD", "Media Studies"),
    ]
    .into_iter()
    .map(|(code, name)| (code.to_string(), name.to_string()))
    .collect()
}

impl ScheduleSettings {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded settings file");
        Self::from_json_str(&raw)
    }

    /// Applies ALLOWED_SEMESTERS / DEFAULT_CAMPUS from the process environment
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from an arbitrary key lookup
    pub fn with_overrides_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_ALLOWED_SEMESTERS) {
            self.allowed_semesters = parse_semester_list(&raw);
        }
        if let Some(campus) = lookup(ENV_DEFAULT_CAMPUS) {
            let campus = campus.trim();
            if !campus.is_empty() {
                self.default_campus = campus.to_string();
            }
        }
        self
    }

    /// Validates the settings and freezes them into a shareable config
    pub fn compile(self) -> Result<ScheduleConfig, ConfigError> {
        if self.next_day_available_hour > 23 {
            return Err(ConfigError::InvalidHour(self.next_day_available_hour));
        }
        let utc_offset = FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .ok_or(ConfigError::InvalidOffset(self.utc_offset_minutes))?;

        let semester_pattern =
            Regex::new(&self.semester_pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: self.semester_pattern.clone(),
                source,
            })?;

        let mut known_campuses = Vec::with_capacity(self.known_campuses.len());
        for name in &self.known_campuses {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            known_campuses.push(KnownCampus::new(name)?);
        }
        // * Longest name first so "Campus H-8/4 ISB" beats "Campus"
        known_campuses.sort_by(|a, b| b.name.len().cmp(&a.name.len()));

        let semester_filter =
            SemesterFilter::new(&self.allowed_semesters, self.empty_filter_policy);
        let corrections = CorrectionTable::new(self.course_corrections);

        info!(
            allowed_semesters = semester_filter.len(),
            corrections = corrections.len(),
            corrections_version = corrections.version(),
            "Schedule configuration compiled"
        );

        Ok(ScheduleConfig {
            semester_filter,
            corrections,
            default_campus: self.default_campus,
            known_campuses,
            department_names: self.department_names,
            semester_pattern,
            next_day_available_hour: self.next_day_available_hour,
            utc_offset,
            tbd_room_policy: self.tbd_room_policy,
        })
    }
}

/// Splits a comma-separated semester list, e.g. "BS (SE) - 5C, BS (CS) - 7A"
pub fn parse_semester_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// A configured campus name with its whitespace-tolerant matcher
#[derive(Debug, Clone)]
pub struct KnownCampus {
    pub name: String,
    pub pattern: Regex,
}

impl KnownCampus {
    fn new(name: &str) -> Result<Self, ConfigError> {
        let words: Vec<String> = name.split_whitespace().map(regex::escape).collect();
        let pattern = format!(r"(?i)\b{}", words.join(r"\s+"));
        let pattern = Regex::new(&pattern).map_err(|source| ConfigError::InvalidPattern {
            pattern: pattern.clone(),
            source,
        })?;
        Ok(Self {
            name: name.to_string(),
            pattern,
        })
    }
}

/// Validated, immutable configuration. Shared read-only across concurrent runs.
#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub semester_filter: SemesterFilter,
    pub corrections: CorrectionTable,
    pub default_campus: String,
    pub known_campuses: Vec<KnownCampus>,
    pub department_names: BTreeMap<String, String>,
    pub semester_pattern: Regex,
    pub next_day_available_hour: u32,
    pub utc_offset: FixedOffset,
    pub tbd_room_policy: TbdRoomPolicy,
}

impl ScheduleConfig {
    /// Default settings with the given allow-list
    pub fn for_semesters<S: AsRef<str>>(semesters: &[S]) -> Result<Self, ConfigError> {
        ScheduleSettings {
            allowed_semesters: semesters.iter().map(|s| s.as_ref().to_string()).collect(),
            ..Default::default()
        }
        .compile()
    }
}
