// * Correction engine
// * Fills fields extraction left absent or invalid. Never overwrites a valid value.
// *
// * Precedence is data: REPAIR_PLAN is walked in order and a field filled by an
// * earlier step is skipped by every later one.

use crate::config::constants::{TbdRoomPolicy, ONLINE_ROOM, SENTINEL_TBD};
use crate::config::settings::ScheduleConfig;
use crate::persistence::schema::{is_present, ClassRecord, Field};
use crate::refinery::field_extractor::{find_room, find_time};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Fallback value a [`RepairStep::Default`] produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultKind {
    /// "<Department> Course <n>" or "<Department> Lab <n>"
    DepartmentTitle,
    /// The configured default campus
    ConfiguredCampus,
    /// The "TBD" sentinel
    Tbd,
}

/// One source of repaired values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStep {
    /// Per-course override table
    ExactOverride,
    /// Re-run a field pattern over the flattened source row
    RawRescan(Field),
    /// Heuristic fallback
    Default(Field, DefaultKind),
}

pub const REPAIR_PLAN: &[RepairStep] = &[
    RepairStep::ExactOverride,
    RepairStep::RawRescan(Field::Time),
    RepairStep::RawRescan(Field::Room),
    RepairStep::Default(Field::CourseTitle, DefaultKind::DepartmentTitle),
    RepairStep::Default(Field::Faculty, DefaultKind::Tbd),
    RepairStep::Default(Field::Campus, DefaultKind::ConfiguredCampus),
    RepairStep::Default(Field::Time, DefaultKind::Tbd),
    RepairStep::Default(Field::Room, DefaultKind::Tbd),
];

/// Where a corrected value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionSource {
    Override,
    Rescan,
    Default,
    RoomPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCorrection {
    pub field: Field,
    pub source: CorrectionSource,
}

/// Applies [`REPAIR_PLAN`] against an immutable [`ScheduleConfig`]
pub struct CorrectionEngine<'a> {
    config: &'a ScheduleConfig,
}

impl<'a> CorrectionEngine<'a> {
    pub fn new(config: &'a ScheduleConfig) -> Self {
        Self { config }
    }

    /// Repairs a record and reports what changed.
    ///
    /// Running it again on its own output changes nothing.
    pub fn correct(&self, mut record: ClassRecord) -> (ClassRecord, Vec<AppliedCorrection>) {
        let mut applied = Vec::new();

        for step in REPAIR_PLAN {
            self.apply_step(*step, &mut record, &mut applied);
        }

        if self.config.tbd_room_policy == TbdRoomPolicy::ConvertToOnline
            && record.room.as_deref().map(str::trim) == Some(SENTINEL_TBD)
        {
            record.room = Some(ONLINE_ROOM.to_string());
            applied.push(AppliedCorrection {
                field: Field::Room,
                source: CorrectionSource::RoomPolicy,
            });
        }

        record.source_row = None;
        (record, applied)
    }

    /// Runs a single step. Only absent or invalid fields are touched.
    pub fn apply_step(
        &self,
        step: RepairStep,
        record: &mut ClassRecord,
        applied: &mut Vec<AppliedCorrection>,
    ) {
        match step {
            RepairStep::ExactOverride => {
                let Some(rule) = self.config.corrections.lookup(&record.course) else {
                    return;
                };
                for field in Field::REPAIRABLE {
                    let value = rule.value(field);
                    if !record.has(field) && is_present(value) {
                        if let Some(value) = value {
                            record.set(field, value.trim().to_string());
                            applied.push(AppliedCorrection {
                                field,
                                source: CorrectionSource::Override,
                            });
                        }
                    }
                }
            }
            RepairStep::RawRescan(field) => {
                if record.has(field) {
                    return;
                }
                let Some(source) = record.source_row.as_deref() else {
                    return;
                };
                let flattened = flatten_source_row(source, &record.course);
                let found = match field {
                    Field::Time => find_time(&flattened),
                    Field::Room => find_room(&flattened),
                    _ => None,
                };
                if let Some(value) = found {
                    record.set(field, value);
                    applied.push(AppliedCorrection {
                        field,
                        source: CorrectionSource::Rescan,
                    });
                }
            }
            RepairStep::Default(field, kind) => {
                if record.has(field) {
                    return;
                }
                let value = match kind {
                    DefaultKind::DepartmentTitle => {
                        department_title(&record.course, &self.config.department_names)
                    }
                    DefaultKind::ConfiguredCampus => self.config.default_campus.clone(),
                    DefaultKind::Tbd => SENTINEL_TBD.to_string(),
                };
                record.set(field, value);
                applied.push(AppliedCorrection {
                    field,
                    source: CorrectionSource::Default,
                });
            }
        }
    }
}

/// Source row without the course code, cell delimiters or repeated whitespace
pub fn flatten_source_row(source: &str, course: &str) -> String {
    let without_course = if course.is_empty() {
        source.to_string()
    } else {
        source.replacen(course, " ", 1)
    };
    without_course
        .replace('|', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Generated title for a course code with no better source.
///
/// `CSCL 2205` with `CSC -> Computer Science` becomes "Computer Science Lab 2205";
/// `MATH 101` becomes "Mathematics Course 101".
pub fn department_title(course: &str, departments: &BTreeMap<String, String>) -> String {
    let code: String = course
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    let number = course[code.len()..].trim();

    if let Some(base) = code.strip_suffix('L') {
        if let Some(name) = departments.get(base) {
            return format!("{} Lab {}", name, number);
        }
    }

    let name = departments.get(&code).map(String::as_str).unwrap_or(&code);
    format!("{} Course {}", name, number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::constants::SENTINEL_NONE;
    use crate::config::corrections::CorrectionRule;
    use crate::config::settings::ScheduleSettings;

    fn config() -> ScheduleConfig {
        ScheduleSettings::default().compile().unwrap()
    }

    fn config_with(rules: &[(&str, CorrectionRule)], policy: TbdRoomPolicy) -> ScheduleConfig {
        ScheduleSettings {
            course_corrections: rules
                .iter()
                .map(|(code, rule)| (code.to_string(), rule.clone()))
                .collect(),
            tbd_room_policy: policy,
            ..Default::default()
        }
        .compile()
        .unwrap()
    }

    fn complete_record() -> ClassRecord {
        let mut record = ClassRecord::new("CSC 2123");
        record.course_title = Some("Graph Theory".to_string());
        record.time = Some("02:00 PM - 03:30 PM".to_string());
        record.room = Some("Lab 05".to_string());
        record.faculty = Some("Dr. Aqeel Ahmed".to_string());
        record.campus = Some("SZABIST HMB".to_string());
        record.semester = Some("BS(CS)-5B".to_string());
        record
    }

    #[test]
    fn test_valid_fields_never_overwritten() {
        let config = config();
        let engine = CorrectionEngine::new(&config);
        let (corrected, applied) = engine.correct(complete_record());
        assert_eq!(corrected, complete_record());
        assert!(applied.is_empty());
    }

    #[test]
    fn test_idempotent() {
        let config = config();
        let engine = CorrectionEngine::new(&config);
        let mut record = ClassRecord::new("CSCL 2205");
        record.source_row = Some("CSCL 2205 Lab 02".to_string());

        let (once, _) = engine.correct(record);
        let (twice, applied) = engine.correct(once.clone());
        assert_eq!(once, twice);
        assert!(applied.is_empty());
    }

    #[test]
    fn test_dash_room_is_kept_and_tbd_room_is_kept() {
        let config = config();
        let engine = CorrectionEngine::new(&config);

        let mut dash = complete_record();
        dash.room = Some(SENTINEL_NONE.to_string());
        assert_eq!(engine.correct(dash).0.room.as_deref(), Some("-"));

        let mut tbd = complete_record();
        tbd.room = Some(SENTINEL_TBD.to_string());
        assert_eq!(engine.correct(tbd).0.room.as_deref(), Some("TBD"));
    }

    #[test]
    fn test_override_precedes_rescan_and_defaults() {
        let config = config();
        let engine = CorrectionEngine::new(&config);
        let mut record = ClassRecord::new("CSCL 2205");
        record.source_row = Some("CSCL 2205 Lab 02 09:00 AM - 10:00 AM".to_string());

        let (corrected, applied) = engine.correct(record);
        assert_eq!(corrected.time.as_deref(), Some("02:00 PM - 05:00 PM"));
        assert_eq!(corrected.room.as_deref(), Some("-"));
        assert_eq!(corrected.course_title.as_deref(), Some("Lab: Operating Systems"));
        assert_eq!(corrected.faculty.as_deref(), Some("TBD"));
        assert!(applied.contains(&AppliedCorrection {
            field: Field::Time,
            source: CorrectionSource::Override
        }));
        assert!(corrected.source_row.is_none());
    }

    #[test]
    fn test_override_value_must_be_present() {
        let config = config_with(
            &[(
                "CSC 2123",
                CorrectionRule {
                    room: Some("null".to_string()),
                    faculty: Some("Dr. Aqeel Ahmed".to_string()),
                    ..Default::default()
                },
            )],
            TbdRoomPolicy::Keep,
        );
        let engine = CorrectionEngine::new(&config);

        let (corrected, _) = engine.correct(ClassRecord::new("CSC 2123"));
        assert_eq!(corrected.room.as_deref(), Some("TBD"));
        assert_eq!(corrected.faculty.as_deref(), Some("Dr. Aqeel Ahmed"));
    }

    #[test]
    fn test_invalid_extracted_value_is_repaired() {
        let config = config();
        let engine = CorrectionEngine::new(&config);
        let mut record = complete_record();
        record.faculty = Some("undefined".to_string());
        let (corrected, _) = engine.correct(record);
        assert_eq!(corrected.faculty.as_deref(), Some("TBD"));
    }

    #[test]
    fn test_rescan_finds_time_split_across_cells() {
        let config = config();
        let engine = CorrectionEngine::new(&config);
        let mut record = ClassRecord::new("CSC 2123");
        record.source_row = Some("CSC 2123 | 02:00 PM | - 03:30 PM | Lab 05".to_string());

        let mut applied = Vec::new();
        engine.apply_step(RepairStep::RawRescan(Field::Time), &mut record, &mut applied);
        assert_eq!(record.time.as_deref(), Some("02:00 PM - 03:30 PM"));
        assert_eq!(applied[0].source, CorrectionSource::Rescan);
    }

    #[test]
    fn test_rescan_ignores_course_digits() {
        let config = config();
        let engine = CorrectionEngine::new(&config);
        let mut record = ClassRecord::new("CSC 212");
        record.source_row = Some("CSC 212 Sarwat Nadeem".to_string());

        let mut applied = Vec::new();
        engine.apply_step(RepairStep::RawRescan(Field::Room), &mut record, &mut applied);
        assert_eq!(record.room, None);
        assert!(applied.is_empty());
    }

    #[test]
    fn test_defaults() {
        let config = config();
        let engine = CorrectionEngine::new(&config);
        let (corrected, _) = engine.correct(ClassRecord::new("MATH 101"));

        assert_eq!(corrected.course_title.as_deref(), Some("Mathematics Course 101"));
        assert_eq!(corrected.faculty.as_deref(), Some("TBD"));
        assert_eq!(corrected.campus.as_deref(), Some("SZABIST University Campus"));
        assert_eq!(corrected.time.as_deref(), Some("TBD"));
        assert_eq!(corrected.room.as_deref(), Some("TBD"));
        assert_eq!(corrected.semester, None);
    }

    #[test]
    fn test_department_title() {
        let departments = config().department_names;
        assert_eq!(department_title("CSCL 3105", &departments), "Computer Science Lab 3105");
        assert_eq!(department_title("CSC2123", &departments), "Computer Science Course 2123");
        assert_eq!(department_title("XYZ 100", &departments), "XYZ Course 100");
    }

    #[test]
    fn test_tbd_room_policy_convert() {
        let config = config_with(&[], TbdRoomPolicy::ConvertToOnline);
        let engine = CorrectionEngine::new(&config);

        let (corrected, applied) = engine.correct(ClassRecord::new("CSC 2123"));
        assert_eq!(corrected.room.as_deref(), Some("Online"));
        assert_eq!(applied.last().unwrap().source, CorrectionSource::RoomPolicy);

        let mut dash = complete_record();
        dash.room = Some(SENTINEL_NONE.to_string());
        assert_eq!(engine.correct(dash).0.room.as_deref(), Some("-"));
    }

    #[test]
    fn test_plan_order() {
        assert_eq!(REPAIR_PLAN[0], RepairStep::ExactOverride);
        let rescans = REPAIR_PLAN
            .iter()
            .position(|s| matches!(s, RepairStep::RawRescan(_)))
            .unwrap();
        let defaults = REPAIR_PLAN
            .iter()
            .position(|s| matches!(s, RepairStep::Default(..)))
            .unwrap();
        assert!(rescans < defaults);
    }
}
