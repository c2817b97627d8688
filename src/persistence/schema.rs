// * Schedule data model
// * Defines the input message, the per-class record and the snapshot handed to storage/UI

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Raw message delivered by the mail retrieval layer. Read-only input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEmailMessage {
    pub message_id: String,
    #[serde(default)]
    pub subject: String,
    pub received_at: DateTime<FixedOffset>,
    pub body: String,
    #[serde(default)]
    pub body_is_html: bool,
}

/// Addressable fields of a [`ClassRecord`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Course,
    CourseTitle,
    Time,
    Room,
    Faculty,
    Campus,
    Semester,
}

impl Field {
    /// Fields the correction engine is allowed to fill
    pub const REPAIRABLE: [Field; 5] = [
        Field::CourseTitle,
        Field::Time,
        Field::Room,
        Field::Faculty,
        Field::Campus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Course => "course",
            Field::CourseTitle => "course_title",
            Field::Time => "time",
            Field::Room => "room",
            Field::Faculty => "faculty",
            Field::Campus => "campus",
            Field::Semester => "semester",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns true when a value carries data.
///
/// Trimmed, non-empty, and not the literals "null" / "undefined".
/// The sentinel "-" is present: it means "confirmed none".
pub fn is_present(value: Option<&str>) -> bool {
    match value.map(str::trim) {
        None | Some("") => false,
        Some(v) => !v.eq_ignore_ascii_case("null") && !v.eq_ignore_ascii_case("undefined"),
    }
}

/// One normalized schedule entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub course: String,
    pub course_title: Option<String>,
    pub time: Option<String>,
    pub room: Option<String>,
    pub faculty: Option<String>,
    pub campus: Option<String>,
    pub semester: Option<String>,
    // * Only kept until correction finishes; never leaves the engine
    #[serde(skip)]
    pub source_row: Option<String>,
}

impl ClassRecord {
    pub fn new(course: impl Into<String>) -> Self {
        Self {
            course: course.into(),
            ..Default::default()
        }
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        match field {
            Field::Course => Some(self.course.as_str()),
            Field::CourseTitle => self.course_title.as_deref(),
            Field::Time => self.time.as_deref(),
            Field::Room => self.room.as_deref(),
            Field::Faculty => self.faculty.as_deref(),
            Field::Campus => self.campus.as_deref(),
            Field::Semester => self.semester.as_deref(),
        }
    }

    pub fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Course => self.course = value,
            Field::CourseTitle => self.course_title = Some(value),
            Field::Time => self.time = Some(value),
            Field::Room => self.room = Some(value),
            Field::Faculty => self.faculty = Some(value),
            Field::Campus => self.campus = Some(value),
            Field::Semester => self.semester = Some(value),
        }
    }

    pub fn has(&self, field: Field) -> bool {
        is_present(self.get(field))
    }

    /// Repairable fields that still carry no data
    pub fn missing_fields(&self) -> Vec<Field> {
        Field::REPAIRABLE
            .iter()
            .copied()
            .filter(|f| !self.has(*f))
            .collect()
    }

    /// Identity used when collapsing re-sent rows
    pub fn dedup_key(&self) -> (&str, Option<&str>, Option<&str>, Option<&str>) {
        (
            self.course.as_str(),
            self.time.as_deref(),
            self.room.as_deref(),
            self.semester.as_deref(),
        )
    }
}

/// Aggregates computed over the final item list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub total_items: usize,
    pub unique_courses: usize,
    pub unique_faculty: usize,
    pub semester_breakdown: BTreeMap<String, usize>,
}

/// Terminal output handed to persistence and UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSnapshot {
    pub for_day: String,
    pub for_date: NaiveDate,
    pub message_id: Option<String>,
    pub items: Vec<ClassRecord>,
    pub summary: ScheduleSummary,
}

impl ScheduleSnapshot {
    /// Converts the snapshot to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Converts the snapshot to pretty JSON string
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }
}
