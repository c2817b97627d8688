use chrono::{DateTime, NaiveDate};
use std::sync::Arc;
use timetable_flow::engine::semester::normalize_semester;
use timetable_flow::refinery::{refine_message, Refinery, RefineryError};
use timetable_flow::{RawEmailMessage, ScheduleConfig, ScheduleSettings};

// * Test Suite for the end-to-end schedule pipeline

fn message(body: &str, is_html: bool) -> RawEmailMessage {
    RawEmailMessage {
        message_id: "msg-001".to_string(),
        subject: "Class Schedule".to_string(),
        // * Sunday morning in Karachi
        received_at: DateTime::parse_from_rfc3339("2025-10-19T09:15:00+05:00").unwrap(),
        body: body.to_string(),
        body_is_html: is_html,
    }
}

fn config_for(semesters: &[&str]) -> Arc<ScheduleConfig> {
    Arc::new(ScheduleConfig::for_semesters(semesters).unwrap())
}

#[test]
fn test_scenario_a_single_row() {
    let body = "CSCL 3105 08:00 AM - 11:00 AM Lab 05 Sarwat Nadeem BS(AI)-3A";
    let outcome = refine_message(&message(body, false), &config_for(&["BS(AI)-3A"])).unwrap();

    assert_eq!(outcome.snapshot.items.len(), 1);
    let item = &outcome.snapshot.items[0];
    assert_eq!(item.course, "CSCL 3105");
    assert_eq!(item.time.as_deref(), Some("08:00 AM - 11:00 AM"));
    assert_eq!(item.room.as_deref(), Some("Lab 05"));
    assert_eq!(item.faculty.as_deref(), Some("Sarwat Nadeem"));
    assert_eq!(item.semester.as_deref(), Some("BS(AI)-3A"));

    // * Absent fields were filled by correction defaults
    assert_eq!(item.campus.as_deref(), Some("SZABIST University Campus"));
    assert_eq!(item.course_title.as_deref(), Some("Computer Science Lab 3105"));
}

#[test]
fn test_scenario_b_wrapped_time() {
    let body = "CSC 2123 Lab 05 BS(CS)-5B\n02:00 PM - 03:30 PM";
    let outcome = refine_message(&message(body, false), &config_for(&["BS(CS)-5B"])).unwrap();

    assert_eq!(outcome.snapshot.items.len(), 1);
    assert_eq!(
        outcome.snapshot.items[0].time.as_deref(),
        Some("02:00 PM - 03:30 PM")
    );
}

const SEMESTERS: [&str; 6] = [
    "BS(SE)-5C",
    "BS (CS) - 7A",
    "BS(AI)-3A",
    "BS(SE)-5B",
    "BS(CS)-5C",
    "MS(CS)-1A",
];

fn twenty_rows() -> String {
    (0..20)
        .map(|i| {
            format!(
                "CSC {} 09:30 AM - 11:00 AM Room {} Ali Raza {}",
                2100 + i,
                i + 1,
                SEMESTERS[i % SEMESTERS.len()]
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_scenario_c_allow_list_filters_exactly() {
    let allowed = ["BS(SE)-5C", "BS(CS)-7A"];
    let allowed_normalized: Vec<String> = allowed.iter().map(|s| normalize_semester(s)).collect();
    let expected = (0..20)
        .filter(|i| allowed_normalized.contains(&normalize_semester(SEMESTERS[i % 6])))
        .count();
    assert_eq!(expected, 8);

    let outcome = refine_message(&message(&twenty_rows(), false), &config_for(&allowed)).unwrap();

    assert_eq!(outcome.snapshot.items.len(), expected);
    assert_eq!(outcome.snapshot.summary.total_items, expected);
    assert_eq!(outcome.diagnostics.filtered_out, 20 - expected);
    assert_eq!(outcome.snapshot.summary.semester_breakdown.len(), 2);
    assert_eq!(outcome.snapshot.summary.semester_breakdown.get("BS(CS)-7A"), Some(&4));
}

#[test]
fn test_scenario_d_empty_allow_list_shows_nothing() {
    let outcome = refine_message(&message(&twenty_rows(), false), &config_for(&[])).unwrap();

    assert!(outcome.snapshot.items.is_empty());
    assert_eq!(outcome.snapshot.summary.total_items, 0);
    assert_eq!(outcome.diagnostics.rows_tokenized, 20);
    assert_eq!(outcome.diagnostics.filtered_out, 20);
}

#[test]
fn test_show_everything_is_explicit_opt_in() {
    let settings = ScheduleSettings::from_json_str(r#"{"empty_filter_policy": "show_everything"}"#)
        .unwrap();
    let config = Arc::new(settings.compile().unwrap());
    let outcome = refine_message(&message(&twenty_rows(), false), &config).unwrap();
    assert_eq!(outcome.snapshot.items.len(), 20);
}

#[test]
fn test_html_email() {
    let body = r#"
        <html>
        <head><style>td { border: 1px solid; }</style></head>
        <body>
            <p>Dear Students,</p>
            <p>Please find below the schedule for tomorrow.</p>
            <table>
                <tr><th>Course</th><th>Title</th><th>Faculty</th><th>Room</th><th>Time</th><th>Section</th></tr>
                <tr><td>CSC 2123</td><td>Graph Theory (3,0)</td><td>Dr. Aqeel Ahmed</td><td>Lab 05</td><td>02:00 PM -<br>03:30 PM</td><td>BS (CS) - 5B</td></tr>
                <tr><td>CSC 3109</td><td>Software Engineering (3,0)</td><td>Awais Nawaz</td><td>301</td><td>09:30 AM - 11:00 AM</td><td>BS(SE)-5C</td></tr>
                <tr><td>MATH 101</td><td>Calculus (3,0)</td><td>Ali Raza</td><td>302</td><td>08:00 AM - 09:30 AM</td><td>BS(AI)-3A</td></tr>
            </table>
            <p>Regards,<br>Academic Office</p>
        </body>
        </html>
    "#;

    let outcome =
        refine_message(&message(body, true), &config_for(&["BS(CS)-5B", "BS(SE)-5C"])).unwrap();
    let items = &outcome.snapshot.items;
    assert_eq!(items.len(), 2);

    // * Sorted by normalized semester: bs(cs)5b before bs(se)5c
    assert_eq!(items[0].course, "CSC 2123");
    assert_eq!(items[0].course_title.as_deref(), Some("Graph Theory"));
    assert_eq!(items[0].faculty.as_deref(), Some("Dr. Aqeel Ahmed"));
    assert_eq!(items[0].room.as_deref(), Some("Lab 05"));
    assert_eq!(items[0].time.as_deref(), Some("02:00 PM - 03:30 PM"));

    assert_eq!(items[1].course, "CSC 3109");
    assert_eq!(items[1].room.as_deref(), Some("301"));

    assert_eq!(outcome.diagnostics.rows_tokenized, 3);
    assert_eq!(outcome.diagnostics.filtered_out, 1);
    assert!(outcome.diagnostics.skipped_blocks >= 2);
}

#[test]
fn test_malformed_html_is_an_error_not_an_empty_day() {
    let body = "<html><head><script>var schedule = [];</script></head><body></body></html>";
    let err = refine_message(&message(body, true), &config_for(&["BS(CS)-5B"])).unwrap_err();
    assert!(matches!(err, RefineryError::MalformedMessageBody { .. }));
    assert!(err.to_string().contains("msg-001"));
}

#[test]
fn test_boilerplate_only_is_an_empty_day() {
    let body = "Dear Students,\nNo classes are scheduled.\nRegards";
    let outcome = refine_message(&message(body, false), &config_for(&["BS(CS)-5B"])).unwrap();
    assert!(outcome.snapshot.items.is_empty());
    assert_eq!(outcome.diagnostics.skipped_blocks, 1);
}

#[test]
fn test_resent_rows_collapse() {
    let body = "CSC 2123 02:00 PM - 03:30 PM Lab 05 Sarwat Nadeem BS(CS)-5B\n\
                CSC 2123 02:00 PM - 03:30 PM Lab 05 SARWAT NADEEM BS(CS)-5B";
    let outcome = refine_message(&message(body, false), &config_for(&["BS(CS)-5B"])).unwrap();
    assert_eq!(outcome.snapshot.items.len(), 1);
    assert_eq!(outcome.diagnostics.duplicates_removed, 1);
    assert_eq!(outcome.snapshot.summary.unique_faculty, 1);
}

#[test]
fn test_override_table_repairs_known_course() {
    let body = "CSCL 2205 BS(CS)-5B";
    let outcome = refine_message(&message(body, false), &config_for(&["BS(CS)-5B"])).unwrap();
    let item = &outcome.snapshot.items[0];
    assert_eq!(item.time.as_deref(), Some("02:00 PM - 05:00 PM"));
    assert_eq!(item.room.as_deref(), Some("-"));
    assert_eq!(item.faculty.as_deref(), Some("TBD"));
}

#[test]
fn test_target_day_from_arrival_time() {
    let mut evening = message("CSC 2123 Lab 05 BS(CS)-5B", false);
    evening.received_at = DateTime::parse_from_rfc3339("2025-10-19T18:00:00+05:00").unwrap();

    let refinery = Refinery::new(config_for(&["BS(CS)-5B"]));
    let snapshot = refinery.process(&evening).unwrap().snapshot;
    assert_eq!(snapshot.for_day, "Monday");
    assert_eq!(snapshot.for_date, NaiveDate::from_ymd_opt(2025, 10, 20).unwrap());
    assert_eq!(snapshot.message_id.as_deref(), Some("msg-001"));
}

#[test]
fn test_snapshot_json_shape() {
    let body = "CSCL 3105 08:00 AM - 11:00 AM Lab 05 Sarwat Nadeem BS(AI)-3A";
    let outcome = refine_message(&message(body, false), &config_for(&["BS(AI)-3A"])).unwrap();
    let value: serde_json::Value = serde_json::from_str(&outcome.snapshot.to_json()).unwrap();

    assert_eq!(value["for_date"], "2025-10-19");
    assert_eq!(value["items"][0]["course"], "CSCL 3105");
    assert_eq!(value["summary"]["total_items"], 1);
    assert_eq!(value["summary"]["semester_breakdown"]["BS(AI)-3A"], 1);
    assert!(value["items"][0].get("source_row").is_none());
}

#[test]
fn test_dash_room_cell_survives_correction() {
    let config = config_for(&["BS(CS)-5B"]);

    let html = "<table><tr><td>CSC 2123</td><td>02:00 PM - 03:30 PM</td><td>-</td>\
                <td>Ali Raza</td><td>BS(CS)-5B</td></tr></table>";
    let outcome = refine_message(&message(html, true), &config).unwrap();
    assert_eq!(outcome.snapshot.items.len(), 1);
    assert_eq!(outcome.snapshot.items[0].room.as_deref(), Some("-"));
    assert_eq!(outcome.snapshot.items[0].faculty.as_deref(), Some("Ali Raza"));

    let text = "CSC 2123 | 02:00 PM - 03:30 PM | - | Ali Raza | BS(CS)-5B";
    let outcome = refine_message(&message(text, false), &config).unwrap();
    assert_eq!(outcome.snapshot.items[0].room.as_deref(), Some("-"));
}

#[test]
fn test_lowercase_semester_label_is_admitted() {
    let body = "CSC 2123 Lab 05 Ali Raza bs(cs)-5b";
    let outcome = refine_message(&message(body, false), &config_for(&["BS(CS)-5B"])).unwrap();

    assert_eq!(outcome.snapshot.items.len(), 1);
    assert_eq!(outcome.snapshot.items[0].semester.as_deref(), Some("BS(CS)-5B"));
    assert_eq!(outcome.diagnostics.filtered_out, 0);
}

#[test]
fn test_spaced_building_code_is_the_room() {
    let body = "CSC 2123 02:00 PM - 03:30 PM NB 206 Ali Raza BS(CS)-5B";
    let outcome = refine_message(&message(body, false), &config_for(&["BS(CS)-5B"])).unwrap();

    let item = &outcome.snapshot.items[0];
    assert_eq!(item.room.as_deref(), Some("NB 206"));
    assert_eq!(item.faculty.as_deref(), Some("Ali Raza"));
}

#[test]
fn test_blank_line_ends_row_before_wrapped_time() {
    // * A blank line closes the row, so a time after it is not joined
    let body = "CSC 2123 Lab 05 BS(CS)-5B\n\n02:00 PM - 03:30 PM";
    let outcome = refine_message(&message(body, false), &config_for(&["BS(CS)-5B"])).unwrap();

    assert_eq!(outcome.snapshot.items.len(), 1);
    assert_eq!(outcome.snapshot.items[0].time.as_deref(), Some("TBD"));
    assert_eq!(outcome.diagnostics.unparseable_rows, 1);
}
