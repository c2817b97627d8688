// * Course correction table
// * Static, per-course partial overrides for known-bad upstream formatting.
// * Loaded once, fingerprinted, and never mutated while a run is in flight.

use crate::persistence::schema::Field;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use xxhash_rust::xxh64::xxh64;

/// Partial field overrides for a single course code
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorrectionRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub faculty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campus: Option<String>,
}

impl CorrectionRule {
    pub fn value(&self, field: Field) -> Option<&str> {
        match field {
            Field::CourseTitle => self.course_title.as_deref(),
            Field::Time => self.time.as_deref(),
            Field::Room => self.room.as_deref(),
            Field::Faculty => self.faculty.as_deref(),
            Field::Campus => self.campus.as_deref(),
            Field::Course | Field::Semester => None,
        }
    }
}

/// Immutable, versioned lookup from course code to [`CorrectionRule`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrectionTable {
    version: u64,
    rules: BTreeMap<String, CorrectionRule>,
}

impl CorrectionTable {
    pub fn new(rules: BTreeMap<String, CorrectionRule>) -> Self {
        let rules: BTreeMap<String, CorrectionRule> = rules
            .into_iter()
            .map(|(code, rule)| (code.trim().to_string(), rule))
            .collect();

        // * BTreeMap iteration order makes the serialized form canonical
        let canonical = serde_json::to_string(&rules).unwrap_or_default();
        Self {
            version: xxh64(canonical.as_bytes(), 0),
            rules,
        }
    }

    /// Fingerprint of the table contents; equal tables share a version
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn lookup(&self, course: &str) -> Option<&CorrectionRule> {
        self.rules.get(course.trim())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Overrides shipped with the crate for courses whose rows are known to arrive broken
pub fn builtin_rules() -> BTreeMap<String, CorrectionRule> {
    let mut rules = BTreeMap::new();
    rules.insert(
        "CSCL 2205".to_string(),
        CorrectionRule {
            course_title: Some("Lab: Operating Systems".to_string()),
            time: Some("02:00 PM - 05:00 PM".to_string()),
            room: Some("-".to_string()),
            campus: Some("SZABIST University Campus H-8/4 ISB".to_string()),
            ..Default::default()
        },
    );
    rules.insert(
        "PSY 8139".to_string(),
        CorrectionRule {
            course_title: Some("Psychotherapy and Counseling-I".to_string()),
            faculty: Some("Dr. Abdur Rashid".to_string()),
            room: Some("Psychology Lab".to_string()),
            time: Some("09:00 AM - 12:00 PM".to_string()),
            campus: Some("SZABIST University Campus".to_string()),
        },
    );
    rules.insert(
        "MD 3523".to_string(),
        CorrectionRule {
            course_title: Some("Production Practices-II".to_string()),
            faculty: Some("Azfar Hussain Jaffari".to_string()),
            room: Some("TV Studio".to_string()),
            time: Some("02:20 PM - 05:20 PM".to_string()),
            ..Default::default()
        },
    );
    rules.insert(
        "MD 2424".to_string(),
        CorrectionRule {
            course_title: Some("Media Psychology".to_string()),
            faculty: Some("Muhammad Arslan Saeed".to_string()),
            room: Some("Media Lab".to_string()),
            time: Some("08:00 AM - 11:00 AM".to_string()),
            ..Default::default()
        },
    );
    rules
}
