// * Configuration Constants
// * Central location for every policy decision and sentinel the pipeline relies on

use serde::{Deserialize, Serialize};

// * In-line delimiter that replaces HTML cell boundaries
pub const CELL_DELIMITER: char = '|';

// * Confirmed absence (e.g. a class that has no room)
pub const SENTINEL_NONE: &str = "-";

// * Value not known yet
pub const SENTINEL_TBD: &str = "TBD";

// * Room value produced when the TBD room policy converts
pub const ONLINE_ROOM: &str = "Online";

// * Campus applied when nothing in the row names one
pub const DEFAULT_CAMPUS: &str = "SZABIST University Campus";

// * Hour (local, 24h) after which the next day's timetable is published
pub const DEFAULT_NEXT_DAY_AVAILABLE_HOUR: u32 = 17;

// * Local offset of the timetable office (Asia/Karachi, UTC+05:00)
pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = 300;

// * Program code, parenthesised specialisation, dash, numeric+letter section.
// * Matches BS(AI)-3A, BS (SE) - 5C, MS( CS)-  1B, bs(cs)-5b
pub const DEFAULT_SEMESTER_PATTERN: &str =
    r"(?i)\b[A-Z]{2,4}\s*\(\s*[A-Z]{2,4}\s*\)\s*-\s*\d{1,2}\s*[A-Z]\b";

/// What an empty semester allow-list means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyFilterPolicy {
    /// Empty filter excludes every record.
    ShowNothing,
    /// Empty filter keeps every record. Opt-in only.
    ShowEverything,
}

// ! CRITICAL: "show everything" was the historically reported failure mode.
// ! Never make it the default.
pub const EMPTY_FILTER_POLICY: EmptyFilterPolicy = EmptyFilterPolicy::ShowNothing;

/// Whether a room of "TBD" is rewritten to "Online" during correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TbdRoomPolicy {
    Keep,
    ConvertToOnline,
}

pub const TBD_ROOM_POLICY: TbdRoomPolicy = TbdRoomPolicy::Keep;
