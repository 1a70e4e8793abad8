mod test_support;

use serde_json::json;
use test_support::{request_ok, spawn_sidecar, temp_dir};

#[test]
fn exported_bundle_restores_into_a_fresh_workspace() {
    let workspace = temp_dir("timetabled-backup-src");
    let restore_workspace = temp_dir("timetabled-backup-dst");
    let bundle_path = workspace.join("out").join("school.ttbundle");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "classes.create",
        json!({ "name": "3A" }),
    );

    let exported = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "backup.export",
        json!({ "outPath": bundle_path.to_string_lossy() }),
    );
    assert_eq!(
        exported["bundleFormat"].as_str(),
        Some("timetable-workspace-v1")
    );
    assert_eq!(
        exported["dbSha256"].as_str().map(|s| s.len()),
        Some(64),
        "manifest records the database digest"
    );
    assert!(bundle_path.is_file());

    let imported = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "backup.import",
        json!({
            "inPath": bundle_path.to_string_lossy(),
            "workspacePath": restore_workspace.to_string_lossy(),
        }),
    );
    assert_eq!(
        imported["bundleFormatDetected"].as_str(),
        Some("timetable-workspace-v1")
    );

    // The session now points at the restored workspace with the same data.
    let health = request_ok(&mut stdin, &mut reader, "5", "health", json!({}));
    assert_eq!(
        health["workspacePath"].as_str(),
        Some(restore_workspace.to_string_lossy().as_ref())
    );
    let listed = request_ok(&mut stdin, &mut reader, "6", "classes.list", json!({}));
    let classes = listed["classes"].as_array().cloned().expect("classes");
    assert_eq!(classes.len(), 1);
    assert_eq!(classes[0]["name"].as_str(), Some("3A"));
}
