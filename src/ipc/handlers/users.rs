use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{db_conn, ensure_class_exists, opt_str, required_str};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use uuid::Uuid;

const ROLES: [&str; 3] = ["student", "teacher", "admin"];

fn handle_users_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let role = match required_str(req, "role") {
        Ok(v) => v.to_ascii_lowercase(),
        Err(e) => return e,
    };
    if !ROLES.contains(&role.as_str()) {
        return err(
            &req.id,
            "bad_params",
            "role must be one of: student, teacher, admin",
            None,
        );
    }
    let class_id = match opt_str(req, "classId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    // Only students carry a home class.
    if class_id.is_some() && role != "student" {
        return err(
            &req.id,
            "bad_params",
            "only students can be assigned a classId",
            None,
        );
    }
    if let Some(class_id) = &class_id {
        if let Err(e) = ensure_class_exists(conn, req, class_id) {
            return e;
        }
    }

    let user_id = Uuid::new_v4().to_string();
    if let Err(e) = conn.execute(
        "INSERT INTO users(id, name, role, class_id) VALUES(?, ?, ?, ?)",
        (&user_id, &name, &role, &class_id),
    ) {
        return err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "users" })),
        );
    }

    ok(
        &req.id,
        json!({ "userId": user_id, "name": name, "role": role, "classId": class_id }),
    )
}

fn handle_users_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let role = match opt_str(req, "role") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let class_id = match opt_str(req, "classId") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let mut sql = String::from("SELECT id, name, role, class_id FROM users WHERE 1=1");
    let mut args: Vec<String> = Vec::new();
    if let Some(role) = role {
        sql.push_str(" AND role = ?");
        args.push(role);
    }
    if let Some(class_id) = class_id {
        sql.push_str(" AND class_id = ?");
        args.push(class_id);
    }
    sql.push_str(" ORDER BY name, id");

    let mut stmt = match conn.prepare(&sql) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let rows = stmt
        .query_map(rusqlite::params_from_iter(args.iter()), |r| {
            Ok(json!({
                "id": r.get::<_, String>(0)?,
                "name": r.get::<_, String>(1)?,
                "role": r.get::<_, String>(2)?,
                "classId": r.get::<_, Option<String>>(3)?,
            }))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>());

    match rows {
        Ok(users) => ok(&req.id, json!({ "users": users })),
        Err(e) => err(&req.id, "db_query_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "users.create" => Some(handle_users_create(state, req)),
        "users.list" => Some(handle_users_list(state, req)),
        _ => None,
    }
}
