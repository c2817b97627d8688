// * Record assembly
// * Collapses re-sent rows, orders the day's classes and computes the snapshot summary.

use crate::config::constants::{SENTINEL_NONE, SENTINEL_TBD};
use crate::engine::semester::normalize_semester;
use crate::persistence::schema::{is_present, ClassRecord, ScheduleSnapshot, ScheduleSummary};
use chrono::NaiveDate;
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

static START_TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2}):(\d{2})\s*([AP])M\b").expect("Invalid start time regex")
});

type DedupKey = (String, Option<String>, Option<String>, Option<String>);

fn owned_key(record: &ClassRecord) -> DedupKey {
    let (course, time, room, semester) = record.dedup_key();
    (
        course.to_string(),
        time.map(str::to_string),
        room.map(str::to_string),
        semester.map(str::to_string),
    )
}

/// Result of offering a record to the assembler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupResult {
    /// First occurrence, kept
    Unique,
    /// Same (course, time, room, semester) as the item at `original_index`
    Duplicate { original_index: usize },
}

impl DedupResult {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DedupResult::Duplicate { .. })
    }

    pub fn is_unique(&self) -> bool {
        matches!(self, DedupResult::Unique)
    }
}

/// Accumulates corrected records for one message
#[derive(Debug, Default)]
pub struct RecordAssembler {
    seen: HashMap<DedupKey, usize>,
    items: Vec<ClassRecord>,
    duplicates: usize,
}

impl RecordAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the record unless an identical key was already pushed
    pub fn push(&mut self, record: ClassRecord) -> DedupResult {
        let key = owned_key(&record);
        if let Some(&original_index) = self.seen.get(&key) {
            self.duplicates += 1;
            tracing::debug!(
                course = %record.course,
                original_index = original_index,
                "Duplicate class row collapsed"
            );
            return DedupResult::Duplicate { original_index };
        }
        self.seen.insert(key, self.items.len());
        self.items.push(record);
        DedupResult::Unique
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn duplicates_removed(&self) -> usize {
        self.duplicates
    }

    /// Sorts the kept items and builds the snapshot
    pub fn finish(
        self,
        for_day: impl Into<String>,
        for_date: NaiveDate,
        message_id: Option<String>,
    ) -> ScheduleSnapshot {
        let mut items = self.items;
        sort_items(&mut items);
        let summary = summarize(&items);
        ScheduleSnapshot {
            for_day: for_day.into(),
            for_date,
            message_id,
            items,
            summary,
        }
    }
}

/// One-shot assembly. Returns the snapshot and how many duplicates were dropped.
pub fn assemble<I>(
    for_day: impl Into<String>,
    for_date: NaiveDate,
    message_id: Option<String>,
    records: I,
) -> (ScheduleSnapshot, usize)
where
    I: IntoIterator<Item = ClassRecord>,
{
    let mut assembler = RecordAssembler::new();
    for record in records {
        assembler.push(record);
    }
    let duplicates = assembler.duplicates_removed();
    (assembler.finish(for_day, for_date, message_id), duplicates)
}

/// Minutes since midnight of the first clock time in `time`; 0 when unparseable
pub fn start_minutes(time: Option<&str>) -> u32 {
    let Some(caps) = time.and_then(|t| START_TIME_PATTERN.captures(t)) else {
        return 0;
    };
    let hour: u32 = caps[1].parse().unwrap_or(0);
    let minute: u32 = caps[2].parse().unwrap_or(0);
    if hour > 12 || minute > 59 {
        return 0;
    }
    let pm = caps[3].eq_ignore_ascii_case("p");
    let hour = match (hour % 12, pm) {
        (h, true) => h + 12,
        (h, false) => h,
    };
    hour * 60 + minute
}

// * Semester (normalized), then start time, then course
fn sort_items(items: &mut [ClassRecord]) {
    items.sort_by_cached_key(|record| {
        (
            record
                .semester
                .as_deref()
                .map(normalize_semester)
                .unwrap_or_default(),
            start_minutes(record.time.as_deref()),
            record.course.clone(),
        )
    });
}

fn is_named_faculty(value: &str) -> bool {
    let value = value.trim();
    is_present(Some(value))
        && !value.eq_ignore_ascii_case(SENTINEL_TBD)
        && value != SENTINEL_NONE
}

/// Summary over the final item list
pub fn summarize(items: &[ClassRecord]) -> ScheduleSummary {
    let unique_courses: HashSet<&str> = items.iter().map(|r| r.course.as_str()).collect();
    let unique_faculty: HashSet<String> = items
        .iter()
        .filter_map(|r| r.faculty.as_deref())
        .filter(|f| is_named_faculty(f))
        .map(|f| f.trim().to_lowercase())
        .collect();

    let mut semester_breakdown = BTreeMap::new();
    for semester in items.iter().filter_map(|r| r.semester.as_deref()) {
        *semester_breakdown.entry(semester.to_string()).or_insert(0) += 1;
    }

    ScheduleSummary {
        total_items: items.len(),
        unique_courses: unique_courses.len(),
        unique_faculty: unique_faculty.len(),
        semester_breakdown,
    }
}
