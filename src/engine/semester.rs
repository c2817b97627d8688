// * Semester matching
// * Normalizes semester/section labels and filters records against the allow-list.
// *
// * Normalization (applied identically to BOTH sides of every comparison):
// * 1. Lowercase.
// * 2. Remove every whitespace character.
// * 3. Remove every hyphen/dash character.

use crate::config::constants::EmptyFilterPolicy;
use crate::persistence::schema::{is_present, ClassRecord};

// * ASCII hyphen-minus plus the Unicode hyphen and dash family
fn is_hyphen(c: char) -> bool {
    matches!(
        c,
        '-' | '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2212}'
    )
}

/// Canonical comparison form of a semester label.
///
/// `"BS (SE) - 5C"`, `"bs(se)-5c"` and `"BS(SE) – 5C"` all become `"bs(se)5c"`.
pub fn normalize_semester(label: &str) -> String {
    label
        .chars()
        .filter(|c| !c.is_whitespace() && !is_hyphen(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AllowedSemester {
    label: String,
    normalized: String,
}

/// The configured allow-list, normalized once at load time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemesterFilter {
    entries: Vec<AllowedSemester>,
    policy: EmptyFilterPolicy,
}

impl SemesterFilter {
    pub fn new<S: AsRef<str>>(labels: &[S], policy: EmptyFilterPolicy) -> Self {
        let mut entries: Vec<AllowedSemester> = Vec::with_capacity(labels.len());
        for label in labels {
            let label = label.as_ref().trim();
            let normalized = normalize_semester(label);
            if normalized.is_empty() || entries.iter().any(|e| e.normalized == normalized) {
                continue;
            }
            entries.push(AllowedSemester {
                label: label.to_string(),
                normalized,
            });
        }
        Self { entries, policy }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn policy(&self) -> EmptyFilterPolicy {
        self.policy
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    /// Returns the allow-list entry a semester label matches, if any.
    ///
    /// Combined labels ("EMBA - 1 / PMBA - 1") match when any slash-separated part does.
    pub fn matching_label(&self, semester: &str) -> Option<&str> {
        let whole = normalize_semester(semester);
        if let Some(entry) = self.entries.iter().find(|e| e.normalized == whole) {
            return Some(entry.label.as_str());
        }

        if semester.contains('/') {
            for part in semester.split('/') {
                let part = normalize_semester(part);
                if let Some(entry) = self.entries.iter().find(|e| e.normalized == part) {
                    return Some(entry.label.as_str());
                }
            }
        }

        None
    }

    /// Decides whether a record survives the filter
    pub fn matches(&self, record: &ClassRecord) -> bool {
        if self.entries.is_empty() {
            return self.policy == EmptyFilterPolicy::ShowEverything;
        }
        match record.semester.as_deref() {
            Some(semester) if is_present(Some(semester)) => {
                self.matching_label(semester).is_some()
            }
            _ => false,
        }
    }

    /// Filters a record and rewrites its semester to the allow-list spelling
    pub fn admit(&self, mut record: ClassRecord) -> Option<ClassRecord> {
        if !self.matches(&record) {
            return None;
        }
        let label = record
            .semester
            .as_deref()
            .and_then(|s| self.matching_label(s))
            .map(str::to_string);
        if let Some(label) = label {
            record.semester = Some(label);
        }
        Some(record)
    }
}

/// `matches(record, allowList) -> bool`
pub fn matches(record: &ClassRecord, filter: &SemesterFilter) -> bool {
    filter.matches(record)
}
