mod test_support;

use serde_json::json;
use test_support::{error_code, request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn unknown_users_and_admins_are_rejected() {
    let workspace = temp_dir("timetabled-daily-errors");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let error = request_err(
        &mut stdin,
        &mut reader,
        "2",
        "schedule.forDate",
        json!({ "userId": "no-such-user", "date": "2025-09-15" }),
    );
    assert_eq!(error_code(&error), "not_found");

    let admin_id = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "users.create",
        json!({ "name": "Halyna Polishchuk", "role": "admin" }),
    )["userId"]
        .as_str()
        .expect("userId")
        .to_string();
    let error = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "schedule.forDate",
        json!({ "userId": admin_id, "date": "2025-09-15" }),
    );
    assert_eq!(error_code(&error), "bad_params");

    let error = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "schedule.forDate",
        json!({ "userId": admin_id, "date": "15.09.2025" }),
    );
    assert_eq!(error_code(&error), "bad_params");
}
