mod test_support;

use serde_json::json;
use test_support::{error_code, request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn create_replace_update_delete_roundtrip() {
    let workspace = temp_dir("timetabled-roundtrip");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let class_id = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "classes.create",
        json!({ "name": "8C" }),
    )["classId"]
        .as_str()
        .expect("classId")
        .to_string();
    let teacher_id = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "users.create",
        json!({ "name": "Petro Shevchenko", "role": "teacher" }),
    )["userId"]
        .as_str()
        .expect("userId")
        .to_string();

    // Submitted out of order; reads must come back sorted by start time.
    let created = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "timetable.create",
        json!({
            "classId": class_id,
            "dayOfWeek": 3,
            "week": 5,
            "semester": 1,
            "year": 2025,
            "periods": [
                { "startTime": "10:00", "endTime": "10:45", "subject": "History", "teacherId": teacher_id, "room": "204" },
                { "startTime": "8:00", "endTime": "8:45", "subject": "Mathematics", "teacherId": teacher_id }
            ]
        }),
    );
    let entry_id = created["entryId"].as_str().expect("entryId").to_string();
    assert_eq!(created["replaced"].as_bool(), Some(false));

    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "timetable.open",
        json!({ "entryId": entry_id }),
    );
    let entry = opened.get("entry").cloned().expect("entry");
    assert_eq!(entry["className"].as_str(), Some("8C"));
    let periods = entry["periods"].as_array().cloned().expect("periods");
    assert_eq!(periods.len(), 2);
    // Single-digit input hour was normalized to zero-padded HH:mm.
    assert_eq!(periods[0]["startTime"].as_str(), Some("08:00"));
    assert_eq!(periods[0]["subject"].as_str(), Some("Mathematics"));
    assert_eq!(periods[1]["startTime"].as_str(), Some("10:00"));
    assert_eq!(periods[1]["room"].as_str(), Some("204"));

    // Same natural key again: wholesale replacement, not a second entry.
    let replaced = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "timetable.create",
        json!({
            "classId": class_id,
            "dayOfWeek": 3,
            "week": 5,
            "semester": 1,
            "year": 2025,
            "periods": [
                { "startTime": "09:00", "endTime": "09:45", "subject": "Geography", "teacherId": teacher_id }
            ]
        }),
    );
    assert_eq!(replaced["replaced"].as_bool(), Some(true));
    assert_eq!(replaced["entryId"].as_str(), Some(entry_id.as_str()));

    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "timetable.listByClass",
        json!({ "classId": class_id, "week": 5, "semester": 1, "year": 2025 }),
    );
    let entries = listed["entries"].as_array().cloned().expect("entries");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["periods"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(
        entries[0]["periods"][0]["subject"].as_str(),
        Some("Geography")
    );

    // Update replaces the periods array as a batch.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "timetable.update",
        json!({
            "entryId": entry_id,
            "periods": [
                { "startTime": "11:00", "endTime": "11:45", "subject": "Literature", "teacherId": teacher_id },
                { "startTime": "12:00", "endTime": "12:45", "subject": "Chemistry", "teacherId": teacher_id }
            ]
        }),
    );
    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "timetable.open",
        json!({ "entryId": entry_id }),
    );
    assert_eq!(
        opened["entry"]["periods"].as_array().map(|a| a.len()),
        Some(2)
    );

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "timetable.delete",
        json!({ "entryId": entry_id }),
    );
    let error = request_err(
        &mut stdin,
        &mut reader,
        "11",
        "timetable.open",
        json!({ "entryId": entry_id }),
    );
    assert_eq!(error_code(&error), "not_found");
}
