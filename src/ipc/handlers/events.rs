use crate::event::{
    CalendarEvent, EventDetail, EventScope, ShortenedSchedule, DEFAULT_BREAK_MINUTES,
    DEFAULT_LESSON_MINUTES,
};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{class_name, db_conn, opt_bool, opt_str, required_date, required_str};
use crate::ipc::types::{AppState, Request};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

struct HandlerErr {
    code: &'static str,
    message: String,
}

impl HandlerErr {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        HandlerErr {
            code,
            message: message.into(),
        }
    }

    fn db(e: impl std::fmt::Display) -> Self {
        HandlerErr::new("db_query_failed", e.to_string())
    }

    fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, None)
    }
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn detail_from_type(
    type_name: &str,
    lesson_minutes: Option<i64>,
    break_minutes: Option<i64>,
) -> Result<EventDetail, HandlerErr> {
    match type_name {
        "vacation" => Ok(EventDetail::Vacation),
        "holiday" => Ok(EventDetail::Holiday),
        "class_exception" => Ok(EventDetail::ClassException),
        "shortened_day" => Ok(EventDetail::ShortenedDay(ShortenedSchedule {
            lesson_minutes: lesson_minutes.unwrap_or(DEFAULT_LESSON_MINUTES),
            break_minutes: break_minutes.unwrap_or(DEFAULT_BREAK_MINUTES),
        })),
        other => Err(HandlerErr::new(
            "bad_params",
            format!(
                "type must be one of: vacation, holiday, shortened_day, class_exception (got {})",
                other
            ),
        )),
    }
}

/// Decode a stored row without re-running construction-time validation:
/// rows were validated on write, and partial updates may legitimately hold
/// states `CalendarEvent::new` would reject today.
fn row_to_event(
    id: String,
    type_name: String,
    name: String,
    start_date: String,
    end_date: String,
    affects_all_school: bool,
    class_id: Option<String>,
    lesson_minutes: Option<i64>,
    break_minutes: Option<i64>,
) -> Option<CalendarEvent> {
    let start_date = NaiveDate::parse_from_str(&start_date, "%Y-%m-%d").ok()?;
    let end_date = NaiveDate::parse_from_str(&end_date, "%Y-%m-%d").ok()?;
    let scope = if affects_all_school {
        EventScope::AllSchool
    } else {
        EventScope::Class(class_id?)
    };
    let detail = detail_from_type(&type_name, lesson_minutes, break_minutes).ok()?;
    Some(CalendarEvent {
        id,
        name,
        start_date,
        end_date,
        scope,
        detail,
    })
}

const EVENT_COLUMNS: &str =
    "id, type, name, start_date, end_date, affects_all_school, class_id, lesson_minutes, break_minutes";

fn load_all_events(conn: &Connection) -> Result<Vec<CalendarEvent>, HandlerErr> {
    let sql = format!(
        "SELECT {} FROM calendar_events ORDER BY start_date, id",
        EVENT_COLUMNS
    );
    let mut stmt = conn.prepare(&sql).map_err(HandlerErr::db)?;
    let rows = stmt
        .query_map([], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, String>(3)?,
                r.get::<_, String>(4)?,
                r.get::<_, i64>(5)? != 0,
                r.get::<_, Option<String>>(6)?,
                r.get::<_, Option<i64>>(7)?,
                r.get::<_, Option<i64>>(8)?,
            ))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(HandlerErr::db)?;

    // Undecodable rows (e.g. a class row whose class was deleted by hand)
    // are skipped rather than failing the whole read.
    Ok(rows
        .into_iter()
        .filter_map(
            |(id, ty, name, start, end, all_school, class_id, lesson, brk)| {
                row_to_event(id, ty, name, start, end, all_school, class_id, lesson, brk)
            },
        )
        .collect())
}

/// All events whose inclusive date range contains `date`. Shared with the
/// effective-schedule resolver.
pub fn load_events_on_date(
    conn: &Connection,
    date: NaiveDate,
) -> Result<Vec<CalendarEvent>, String> {
    let events = load_all_events(conn).map_err(|e| e.message)?;
    Ok(events.into_iter().filter(|ev| ev.contains(date)).collect())
}

fn event_json(conn: &Connection, ev: &CalendarEvent) -> serde_json::Value {
    let class_id = ev.scope.class_id().map(|s| s.to_string());
    let class_label = class_id
        .as_deref()
        .and_then(|id| class_name(conn, id).ok().flatten());
    let mut out = json!({
        "id": ev.id,
        "type": ev.detail.type_name(),
        "name": ev.name,
        "startDate": iso(ev.start_date),
        "endDate": iso(ev.end_date),
        "affectsAllSchool": ev.scope.is_all_school(),
        "classId": class_id,
        "className": class_label,
    });
    if let EventDetail::ShortenedDay(sched) = &ev.detail {
        out["shortenedSchedule"] = json!({
            "lessonDuration": sched.lesson_minutes,
            "breakDuration": sched.break_minutes,
        });
    }
    out
}

fn shortened_params(req: &Request) -> Result<(Option<i64>, Option<i64>), serde_json::Value> {
    let Some(raw) = req.params.get("shortenedSchedule") else {
        return Ok((None, None));
    };
    if raw.is_null() {
        return Ok((None, None));
    }
    let obj = raw.as_object().ok_or_else(|| {
        err(
            &req.id,
            "bad_params",
            "shortenedSchedule must be an object",
            None,
        )
    })?;
    let field = |key: &str| -> Result<Option<i64>, serde_json::Value> {
        match obj.get(key) {
            None => Ok(None),
            Some(v) if v.is_null() => Ok(None),
            Some(v) => v.as_i64().map(Some).ok_or_else(|| {
                err(
                    &req.id,
                    "bad_params",
                    format!("shortenedSchedule.{} must be integer", key),
                    None,
                )
            }),
        }
    };
    Ok((field("lessonDuration")?, field("breakDuration")?))
}

fn handle_events_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let type_name = match required_str(req, "type") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let name = match required_str(req, "name") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let start_date = match required_date(req, "startDate") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let end_date = match required_date(req, "endDate") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let affects_all_school = match opt_bool(req, "affectsAllSchool", true) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let class_id = match opt_str(req, "classId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (lesson_minutes, break_minutes) = match shortened_params(req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    // School-wide events never carry a class; class-scoped events must.
    let scope = match (affects_all_school, class_id) {
        (true, Some(_)) => {
            return err(
                &req.id,
                "bad_params",
                "an affectsAllSchool event must not carry a classId",
                None,
            )
        }
        (true, None) => EventScope::AllSchool,
        (false, None) => {
            return err(
                &req.id,
                "bad_params",
                "classId is required when affectsAllSchool is false",
                None,
            )
        }
        (false, Some(class_id)) => {
            let exists: Option<i64> = match conn
                .query_row("SELECT 1 FROM classes WHERE id = ?", [&class_id], |r| {
                    r.get(0)
                })
                .optional()
            {
                Ok(v) => v,
                Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
            };
            if exists.is_none() {
                return err(&req.id, "not_found", "class not found", None);
            }
            EventScope::Class(class_id)
        }
    };

    let detail = match detail_from_type(&type_name, lesson_minutes, break_minutes) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };

    let event = match CalendarEvent::new(
        Uuid::new_v4().to_string(),
        name,
        start_date,
        end_date,
        scope,
        detail,
    ) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "bad_params", m, None),
    };

    // Overlaps of the same type and scope are allowed; flag them for the
    // operator instead of rejecting.
    let overlapping: Result<i64, _> = conn.query_row(
        "SELECT COUNT(*) FROM calendar_events
         WHERE type = ? AND affects_all_school = ?
           AND COALESCE(class_id, '') = COALESCE(?, '')
           AND start_date <= ? AND end_date >= ?",
        (
            event.detail.type_name(),
            event.scope.is_all_school() as i64,
            event.scope.class_id(),
            iso(event.end_date),
            iso(event.start_date),
        ),
        |r| r.get(0),
    );
    match overlapping {
        Ok(n) if n > 0 => {
            warn!(
                event = %event.name,
                kind = event.detail.type_name(),
                overlapping = n,
                "creating event that overlaps existing events of the same type and scope"
            );
        }
        Ok(_) => {}
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    }

    let (lesson_col, break_col) = match &event.detail {
        EventDetail::ShortenedDay(s) => (Some(s.lesson_minutes), Some(s.break_minutes)),
        _ => (None, None),
    };
    if let Err(e) = conn.execute(
        "INSERT INTO calendar_events(
            id, type, name, start_date, end_date,
            affects_all_school, class_id, lesson_minutes, break_minutes, created_at
         ) VALUES(?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            &event.id,
            event.detail.type_name(),
            &event.name,
            iso(event.start_date),
            iso(event.end_date),
            event.scope.is_all_school() as i64,
            event.scope.class_id(),
            lesson_col,
            break_col,
            chrono::Utc::now().to_rfc3339(),
        ),
    ) {
        return err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "calendar_events" })),
        );
    }

    ok(&req.id, json!({ "event": event_json(conn, &event) }))
}

fn handle_events_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    match load_all_events(conn) {
        Ok(events) => {
            let out: Vec<serde_json::Value> =
                events.iter().map(|ev| event_json(conn, ev)).collect();
            ok(&req.id, json!({ "events": out }))
        }
        Err(e) => e.response(&req.id),
    }
}

fn handle_events_on_date(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let date = match required_date(req, "date") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match load_events_on_date(conn, date) {
        Ok(events) => {
            let out: Vec<serde_json::Value> =
                events.iter().map(|ev| event_json(conn, ev)).collect();
            ok(&req.id, json!({ "events": out }))
        }
        Err(m) => err(&req.id, "db_query_failed", m, None),
    }
}

fn handle_events_in_range(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let range_start = match required_date(req, "startDate") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let range_end = match required_date(req, "endDate") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if range_start > range_end {
        return err(
            &req.id,
            "bad_params",
            "startDate must not be after endDate",
            None,
        );
    }
    // Whole-day ranges overlap inclusively on both ends.
    match load_all_events(conn) {
        Ok(events) => {
            let out: Vec<serde_json::Value> = events
                .iter()
                .filter(|ev| ev.overlaps(range_start, range_end))
                .map(|ev| event_json(conn, ev))
                .collect();
            ok(&req.id, json!({ "events": out }))
        }
        Err(e) => e.response(&req.id),
    }
}

fn handle_events_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let event_id = match required_str(req, "eventId") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let row: Option<(String, String, String, String, bool, Option<String>, Option<i64>, Option<i64>)> =
        match conn
            .query_row(
                "SELECT type, name, start_date, end_date, affects_all_school,
                        class_id, lesson_minutes, break_minutes
                 FROM calendar_events WHERE id = ?",
                [&event_id],
                |r| {
                    Ok((
                        r.get(0)?,
                        r.get(1)?,
                        r.get(2)?,
                        r.get(3)?,
                        r.get::<_, i64>(4)? != 0,
                        r.get(5)?,
                        r.get(6)?,
                        r.get(7)?,
                    ))
                },
            )
            .optional()
        {
            Ok(v) => v,
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        };
    let Some((
        mut type_name,
        mut name,
        mut start_date,
        mut end_date,
        mut affects_all_school,
        mut class_id,
        mut lesson_minutes,
        mut break_minutes,
    )) = row
    else {
        return err(&req.id, "not_found", "event not found", None);
    };

    // Partial merge. Date order is only re-validated when the patch carries
    // both dates.
    let patch_start = match opt_str(req, "startDate") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let patch_end = match opt_str(req, "endDate") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if let (Some(s), Some(e_)) = (&patch_start, &patch_end) {
        let parsed_start = NaiveDate::parse_from_str(s, "%Y-%m-%d");
        let parsed_end = NaiveDate::parse_from_str(e_, "%Y-%m-%d");
        match (parsed_start, parsed_end) {
            (Ok(ps), Ok(pe)) if ps <= pe => {}
            (Ok(_), Ok(_)) => {
                return err(
                    &req.id,
                    "bad_params",
                    "startDate must not be after endDate",
                    None,
                )
            }
            _ => return err(&req.id, "bad_params", "dates must be YYYY-MM-DD", None),
        }
    }
    for (patch, target, key) in [
        (&patch_start, &mut start_date, "startDate"),
        (&patch_end, &mut end_date, "endDate"),
    ] {
        if let Some(raw) = patch {
            if NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_err() {
                return err(
                    &req.id,
                    "bad_params",
                    format!("{} must be YYYY-MM-DD", key),
                    None,
                );
            }
            *target = raw.clone();
        }
    }

    match opt_str(req, "name") {
        Ok(Some(v)) => name = v,
        Ok(None) => {}
        Err(e) => return e,
    }
    match opt_str(req, "type") {
        Ok(Some(v)) => {
            if let Err(e) = detail_from_type(&v, None, None) {
                return e.response(&req.id);
            }
            type_name = v;
        }
        Ok(None) => {}
        Err(e) => return e,
    }
    if req.params.get("affectsAllSchool").is_some() {
        affects_all_school = match opt_bool(req, "affectsAllSchool", affects_all_school) {
            Ok(v) => v,
            Err(e) => return e,
        };
    }
    if req.params.get("classId").is_some() {
        class_id = match opt_str(req, "classId") {
            Ok(v) => v,
            Err(e) => return e,
        };
    }
    match shortened_params(req) {
        Ok((Some(l), b)) => {
            lesson_minutes = Some(l);
            if let Some(b) = b {
                break_minutes = Some(b);
            }
        }
        Ok((None, Some(b))) => break_minutes = Some(b),
        Ok((None, None)) => {}
        Err(e) => return e,
    }

    // Re-check the scope/type structure on the merged record.
    if affects_all_school && class_id.is_some() {
        return err(
            &req.id,
            "bad_params",
            "an affectsAllSchool event must not carry a classId",
            None,
        );
    }
    if !affects_all_school {
        let Some(class_id) = &class_id else {
            return err(
                &req.id,
                "bad_params",
                "classId is required when affectsAllSchool is false",
                None,
            );
        };
        let exists: Option<i64> = match conn
            .query_row("SELECT 1 FROM classes WHERE id = ?", [class_id], |r| {
                r.get(0)
            })
            .optional()
        {
            Ok(v) => v,
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        };
        if exists.is_none() {
            return err(&req.id, "not_found", "class not found", None);
        }
    }
    if type_name == "class_exception" && affects_all_school {
        return err(
            &req.id,
            "bad_params",
            "class_exception events require a classId",
            None,
        );
    }
    if type_name != "shortened_day" {
        lesson_minutes = None;
        break_minutes = None;
    }

    if let Err(e) = conn.execute(
        "UPDATE calendar_events SET
            type = ?, name = ?, start_date = ?, end_date = ?,
            affects_all_school = ?, class_id = ?, lesson_minutes = ?, break_minutes = ?
         WHERE id = ?",
        (
            &type_name,
            &name,
            &start_date,
            &end_date,
            affects_all_school as i64,
            &class_id,
            lesson_minutes,
            break_minutes,
            &event_id,
        ),
    ) {
        return err(
            &req.id,
            "db_update_failed",
            e.to_string(),
            Some(json!({ "table": "calendar_events" })),
        );
    }

    let updated = row_to_event(
        event_id.clone(),
        type_name,
        name,
        start_date,
        end_date,
        affects_all_school,
        class_id,
        lesson_minutes,
        break_minutes,
    );
    match updated {
        Some(ev) => ok(&req.id, json!({ "event": event_json(conn, &ev) })),
        None => ok(&req.id, json!({ "eventId": event_id })),
    }
}

fn handle_events_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let event_id = match required_str(req, "eventId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let affected = match conn.execute("DELETE FROM calendar_events WHERE id = ?", [&event_id]) {
        Ok(n) => n,
        Err(e) => return err(&req.id, "db_delete_failed", e.to_string(), None),
    };
    if affected == 0 {
        return err(&req.id, "not_found", "event not found", None);
    }
    ok(&req.id, json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "events.create" => Some(handle_events_create(state, req)),
        "events.list" => Some(handle_events_list(state, req)),
        "events.onDate" => Some(handle_events_on_date(state, req)),
        "events.inRange" => Some(handle_events_in_range(state, req)),
        "events.update" => Some(handle_events_update(state, req)),
        "events.delete" => Some(handle_events_delete(state, req)),
        _ => None,
    }
}
