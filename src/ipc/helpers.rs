use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};

use crate::academic::Semester;
use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};

pub fn db_conn<'a>(state: &'a AppState, req: &Request) -> Result<&'a Connection, serde_json::Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn opt_str(req: &Request, key: &str) -> Result<Option<String>, serde_json::Value> {
    match req.params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => {
            let s = v
                .as_str()
                .ok_or_else(|| {
                    err(
                        &req.id,
                        "bad_params",
                        format!("{} must be string or null", key),
                        None,
                    )
                })?
                .trim()
                .to_string();
            Ok(if s.is_empty() { None } else { Some(s) })
        }
    }
}

pub fn required_i64(req: &Request, key: &str) -> Result<i64, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn opt_i64(req: &Request, key: &str) -> Result<Option<i64>, serde_json::Value> {
    match req.params.get(key) {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) => v.as_i64().map(Some).ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("{} must be integer or null", key),
                None,
            )
        }),
    }
}

pub fn opt_bool(req: &Request, key: &str, default: bool) -> Result<bool, serde_json::Value> {
    match req.params.get(key) {
        None => Ok(default),
        Some(v) if v.is_null() => Ok(default),
        Some(v) => v.as_bool().ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("{} must be boolean", key),
                None,
            )
        }),
    }
}

pub fn parse_iso_date(req: &Request, key: &str, raw: &str) -> Result<NaiveDate, serde_json::Value> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        err(
            &req.id,
            "bad_params",
            format!("{} must be YYYY-MM-DD", key),
            None,
        )
    })
}

pub fn required_date(req: &Request, key: &str) -> Result<NaiveDate, serde_json::Value> {
    let raw = required_str(req, key)?;
    parse_iso_date(req, key, &raw)
}

/// Calendar-style day index, 0 = Sunday.
pub fn required_day_of_week(req: &Request) -> Result<i64, serde_json::Value> {
    let day = required_i64(req, "dayOfWeek")?;
    if !(0..=6).contains(&day) {
        return Err(err(
            &req.id,
            "bad_params",
            "dayOfWeek must be between 0 (Sunday) and 6",
            None,
        ));
    }
    Ok(day)
}

pub fn required_week(req: &Request, max: i64) -> Result<i64, serde_json::Value> {
    let week = required_i64(req, "week")?;
    if !(1..=max).contains(&week) {
        return Err(err(
            &req.id,
            "bad_params",
            format!("week must be between 1 and {}", max),
            None,
        ));
    }
    Ok(week)
}

pub fn required_semester(req: &Request) -> Result<Semester, serde_json::Value> {
    let n = required_i64(req, "semester")?;
    Semester::from_number(n)
        .ok_or_else(|| err(&req.id, "bad_params", "semester must be 1 or 2", None))
}

pub fn ensure_class_exists(
    conn: &Connection,
    req: &Request,
    class_id: &str,
) -> Result<(), serde_json::Value> {
    let exists = conn
        .query_row("SELECT 1 FROM classes WHERE id = ?", [class_id], |r| {
            r.get::<_, i64>(0)
        })
        .optional()
        .map_err(|e| err(&req.id, "db_query_failed", e.to_string(), None))?;
    if exists.is_none() {
        return Err(err(&req.id, "not_found", "class not found", None));
    }
    Ok(())
}

/// The referenced user must exist and hold the teacher role.
pub fn ensure_teacher(
    conn: &Connection,
    req: &Request,
    teacher_id: &str,
) -> Result<(), serde_json::Value> {
    let role: Option<String> = conn
        .query_row("SELECT role FROM users WHERE id = ?", [teacher_id], |r| {
            r.get(0)
        })
        .optional()
        .map_err(|e| err(&req.id, "db_query_failed", e.to_string(), None))?;
    match role.as_deref() {
        None => Err(err(
            &req.id,
            "not_found",
            format!("teacher {} not found", teacher_id),
            None,
        )),
        Some("teacher") => Ok(()),
        Some(other) => Err(err(
            &req.id,
            "bad_params",
            format!("teacherId must reference a teacher, got role {}", other),
            None,
        )),
    }
}

pub fn class_name(conn: &Connection, class_id: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row("SELECT name FROM classes WHERE id = ?", [class_id], |r| {
        r.get(0)
    })
    .optional()
}

pub fn user_name(conn: &Connection, user_id: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row("SELECT name FROM users WHERE id = ?", [user_id], |r| {
        r.get(0)
    })
    .optional()
}

/// Explicit-`today` param with a system-clock fallback, so every
/// date-dependent method stays testable without mocking time.
pub fn today_or_now(req: &Request) -> Result<NaiveDate, serde_json::Value> {
    match opt_str(req, "today")? {
        Some(raw) => parse_iso_date(req, "today", &raw),
        None => Ok(chrono::Local::now().date_naive()),
    }
}
