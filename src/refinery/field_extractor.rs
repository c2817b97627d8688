// * Field extraction
// * Derives course, time, room, campus, semester, title and faculty from one buffered row.
// * First matching pattern wins per field; each claimed span is removed from the pool
// * so later fields never double-claim the same text.

use crate::config::constants::{CELL_DELIMITER, SENTINEL_NONE, SENTINEL_TBD};
use crate::config::settings::{KnownCampus, ScheduleConfig};
use crate::persistence::schema::ClassRecord;
use regex::{Captures, Regex};
use std::sync::LazyLock;

// * Precompiled regex patterns

/// 2-6 uppercase letters, optional space, 3-4 digits, anchored at the row start
pub static COURSE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,6} ?\d{3,4}\b").expect("Invalid course regex"));

static TIME_RANGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2}:\d{2})\s*([AP]M)\s*(?:-|–|—|to)\s*(\d{1,2}:\d{2})\s*([AP]M)\b")
        .expect("Invalid time range regex")
});

static CREDITS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\(\s*\d+(?:\.\d+)?\s*,\s*\d+(?:\.\d+)?\s*\)").expect("Invalid credits regex")
});

/// Kind of room value a candidate pattern recognises
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomKind {
    LabNumber,
    DigitalLab,
    ComputerLab,
    RoomNumber,
    Hall,
    BuildingCode,
    BareNumber,
    Tbd,
    Online,
    Cancelled,
}

/// One entry in the ordered room candidate list
#[derive(Debug)]
pub struct RoomCandidate {
    pub kind: RoomKind,
    pub pattern: Regex,
}

impl RoomCandidate {
    fn new(kind: RoomKind, pattern: &str) -> Self {
        Self {
            kind,
            pattern: Regex::new(pattern).expect("Invalid room regex"),
        }
    }

    // * Literal TBD is normalized to the sentinel spelling
    fn value_of(&self, matched: &str) -> String {
        match self.kind {
            RoomKind::Tbd => SENTINEL_TBD.to_string(),
            _ => collapse_whitespace(matched),
        }
    }
}

// ! Order is precedence: the first candidate that matches wins.
pub static ROOM_CANDIDATES: LazyLock<Vec<RoomCandidate>> = LazyLock::new(|| {
    vec![
        RoomCandidate::new(RoomKind::LabNumber, r"(?i)\bLab\s*\d{1,3}\b"),
        RoomCandidate::new(RoomKind::DigitalLab, r"(?i)\bDigital\s+Lab\b"),
        RoomCandidate::new(RoomKind::ComputerLab, r"(?i)\bComputer\s+Lab\b"),
        RoomCandidate::new(RoomKind::RoomNumber, r"(?i)\bRoom\s*\d{1,4}\b"),
        RoomCandidate::new(RoomKind::Hall, r"(?i)\bHall\s*\d{1,3}(?:\s?[A-Z]\b)?"),
        RoomCandidate::new(RoomKind::BuildingCode, r"\b[A-Z]{2,3}(?:-\s?|\s)?\d{2,4}\b"),
        RoomCandidate::new(RoomKind::BareNumber, r"\b\d{3}\b"),
        RoomCandidate::new(RoomKind::Tbd, r"(?i)\bTBD\b"),
        RoomCandidate::new(RoomKind::Online, r"(?i)\b(?:Online|Virtual)\b"),
        RoomCandidate::new(RoomKind::Cancelled, r"(?i)\bCancell?ed\b"),
    ]
});

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn format_time_range(caps: &Captures) -> String {
    format!(
        "{} {} - {} {}",
        &caps[1],
        caps[2].to_uppercase(),
        &caps[3],
        caps[4].to_uppercase()
    )
}

/// Finds a time range anywhere in `text`, normalized to "HH:MM AM - HH:MM PM"
pub fn find_time(text: &str) -> Option<String> {
    TIME_RANGE_PATTERN
        .captures(text)
        .map(|caps| format_time_range(&caps))
}

/// Runs the ordered room candidates over `text`. Time ranges are never rooms.
pub fn find_room(text: &str) -> Option<String> {
    let text = TIME_RANGE_PATTERN.replace_all(text, ClaimPool::MARKER);
    ROOM_CANDIDATES.iter().find_map(|candidate| {
        candidate
            .pattern
            .find(&text)
            .map(|m| candidate.value_of(m.as_str()))
    })
}

/// True when a delimited row holds a cell that is exactly the "-" sentinel
fn has_none_cell(row: &str) -> bool {
    row.contains(CELL_DELIMITER)
        && row
            .split(CELL_DELIMITER)
            .any(|cell| cell.trim() == SENTINEL_NONE)
}

// * Punctuation left behind at fragment edges once neighbours are claimed
fn is_edge_noise(c: char) -> bool {
    c.is_whitespace() || matches!(c, '-' | '–' | '—' | ',' | ';' | ':' | '/' | '|')
}

/// Row text with claimed spans blanked out
struct ClaimPool {
    text: String,
}

impl ClaimPool {
    const MARKER: &'static str = " | ";

    fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }

    fn claim(&mut self, pattern: &Regex) -> Option<String> {
        let found = pattern.find(&self.text)?;
        let (range, value) = (found.range(), found.as_str().to_string());
        self.text.replace_range(range, Self::MARKER);
        Some(value)
    }

    fn claim_with<F>(&mut self, pattern: &Regex, render: F) -> Option<String>
    where
        F: Fn(&Captures) -> String,
    {
        let (range, value) = {
            let caps = pattern.captures(&self.text)?;
            let whole = caps.get(0)?;
            (whole.range(), render(&caps))
        };
        self.text.replace_range(range, Self::MARKER);
        Some(value)
    }

    fn claim_room(&mut self) -> Option<String> {
        for candidate in ROOM_CANDIDATES.iter() {
            if let Some(found) = candidate.pattern.find(&self.text) {
                let (range, value) = (found.range(), candidate.value_of(found.as_str()));
                self.text.replace_range(range, Self::MARKER);
                return Some(value);
            }
        }
        None
    }

    fn claim_campus(&mut self, campuses: &[KnownCampus]) -> Option<String> {
        for campus in campuses {
            if let Some(found) = campus.pattern.find(&self.text) {
                let range = found.range();
                self.text.replace_range(range, Self::MARKER);
                return Some(campus.name.clone());
            }
        }
        None
    }

    /// Claims "<title> (n,n)": the unclaimed fragment right before a credits marker
    fn claim_title(&mut self) -> Option<String> {
        let credits = CREDITS_PATTERN.find(&self.text)?;
        let (start, end) = (credits.start(), credits.end());
        let fragment_start = self.text[..start]
            .rfind(CELL_DELIMITER)
            .map(|i| i + CELL_DELIMITER.len_utf8())
            .unwrap_or(0);

        let title = self.text[fragment_start..start]
            .trim_matches(is_edge_noise)
            .to_string();
        self.text.replace_range(fragment_start..end, Self::MARKER);

        if title.is_empty() {
            None
        } else {
            Some(collapse_whitespace(&title))
        }
    }

    /// Everything nobody claimed, as one trimmed span
    fn remainder(&self) -> Option<String> {
        let fragments: Vec<&str> = self
            .text
            .split(CELL_DELIMITER)
            .map(|f| f.trim_matches(is_edge_noise))
            .filter(|f| !f.is_empty())
            .collect();
        if fragments.is_empty() {
            None
        } else {
            Some(collapse_whitespace(&fragments.join(" ")))
        }
    }
}

/// Extracts a [`ClassRecord`] from one buffered row
pub struct FieldExtractor<'a> {
    campuses: &'a [KnownCampus],
    semester_pattern: &'a Regex,
}

impl<'a> FieldExtractor<'a> {
    pub fn new(config: &'a ScheduleConfig) -> Self {
        Self {
            campuses: &config.known_campuses,
            semester_pattern: &config.semester_pattern,
        }
    }

    /// Returns `None` when the row has no course code at its start.
    ///
    /// Every other field is best-effort and may stay absent.
    pub fn extract(&self, row: &str) -> Option<ClassRecord> {
        let row = row.trim();
        let mut pool = ClaimPool::new(row);

        // * 1. course (required)
        let course = pool.claim(&COURSE_PATTERN)?;
        let mut record = ClassRecord::new(course);

        // * 2. time
        record.time = pool.claim_with(&TIME_RANGE_PATTERN, format_time_range);

        // * 3. room; a bare "-" cell is a confirmed "no room"
        record.room = pool
            .claim_room()
            .or_else(|| has_none_cell(row).then(|| SENTINEL_NONE.to_string()));

        // * 4. campus
        record.campus = pool.claim_campus(self.campuses);

        // * 5. semester
        record.semester = pool
            .claim(self.semester_pattern)
            .map(|s| collapse_whitespace(&s));

        // * 6. title, only when a credits marker anchors it
        record.course_title = pool.claim_title();

        // * 7. faculty: whatever is left, kept whole
        record.faculty = pool.remainder();

        record.source_row = Some(row.to_string());
        Some(record)
    }
}
