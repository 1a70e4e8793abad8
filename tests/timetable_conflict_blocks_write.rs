mod test_support;

use serde_json::json;
use test_support::{error_code, request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn overlapping_teacher_blocks_second_class_write() {
    let workspace = temp_dir("timetabled-conflict-write");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let c1 = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "classes.create",
        json!({ "name": "9A" }),
    );
    let c1_id = c1.get("classId").and_then(|v| v.as_str()).expect("classId").to_string();
    let c2 = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "classes.create",
        json!({ "name": "9B" }),
    );
    let c2_id = c2.get("classId").and_then(|v| v.as_str()).expect("classId").to_string();

    let t1 = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "users.create",
        json!({ "name": "Maria Petrova", "role": "teacher" }),
    );
    let t1_id = t1.get("userId").and_then(|v| v.as_str()).expect("userId").to_string();

    // Monday of week 3, semester 1, year 2025.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "timetable.create",
        json!({
            "classId": c1_id,
            "dayOfWeek": 1,
            "week": 3,
            "semester": 1,
            "year": 2025,
            "periods": [
                { "startTime": "08:00", "endTime": "08:45", "subject": "Mathematics", "teacherId": t1_id }
            ]
        }),
    );

    // Same teacher, overlapping time, different class: rejected whole.
    let error = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "timetable.create",
        json!({
            "classId": c2_id,
            "dayOfWeek": 1,
            "week": 3,
            "semester": 1,
            "year": 2025,
            "periods": [
                { "startTime": "08:30", "endTime": "09:15", "subject": "Physics", "teacherId": t1_id }
            ]
        }),
    );
    assert_eq!(error_code(&error), "conflict");
    let conflicts = error
        .get("details")
        .and_then(|d| d.get("conflicts"))
        .and_then(|v| v.as_array())
        .cloned()
        .expect("conflict list");
    assert_eq!(conflicts.len(), 1);
    assert_eq!(
        conflicts[0].get("type").and_then(|v| v.as_str()),
        Some("teacher_conflict")
    );
    assert_eq!(
        conflicts[0].get("time").and_then(|v| v.as_str()),
        Some("08:30-08:45")
    );
    assert_eq!(
        conflicts[0].get("conflictSubject").and_then(|v| v.as_str()),
        Some("Mathematics")
    );
    assert_eq!(
        conflicts[0].get("teacher").and_then(|v| v.as_str()),
        Some("Maria Petrova")
    );
    assert_eq!(
        conflicts[0].get("conflictClass").and_then(|v| v.as_str()),
        Some("9A")
    );

    // Nothing was committed for 9B.
    let listed = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "timetable.listByClass",
        json!({ "classId": c2_id }),
    );
    assert_eq!(
        listed
            .get("entries")
            .and_then(|v| v.as_array())
            .map(|a| a.len()),
        Some(0)
    );

    // A touching range (08:45 start) is not an overlap and commits fine.
    let created = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "timetable.create",
        json!({
            "classId": c2_id,
            "dayOfWeek": 1,
            "week": 3,
            "semester": 1,
            "year": 2025,
            "periods": [
                { "startTime": "08:45", "endTime": "09:30", "subject": "Physics", "teacherId": t1_id }
            ]
        }),
    );
    assert_eq!(created.get("replaced").and_then(|v| v.as_bool()), Some(false));
}
