use crate::conflict::{detect_conflicts, Conflict, ConflictKind, StoredEntry};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{
    class_name, db_conn, ensure_class_exists, ensure_teacher, opt_i64, opt_str,
    required_day_of_week, required_i64, required_semester, required_str, required_week, user_name,
};
use crate::ipc::types::{AppState, Request};
use crate::schedule::{normalize_periods, sort_by_start, Period};
use rusqlite::{Connection, OptionalExtension};
use serde_json::json;
use uuid::Uuid;

/// Timetable rows carry the data-model bound (weeks within a semester as
/// stored), not the 16-week teaching-window bound the calculator uses.
const MAX_STORED_WEEK: i64 = 52;

struct HandlerErr {
    code: &'static str,
    message: String,
    details: Option<serde_json::Value>,
}

impl HandlerErr {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        HandlerErr {
            code,
            message: message.into(),
            details: None,
        }
    }

    fn db(e: impl std::fmt::Display) -> Self {
        HandlerErr::new("db_query_failed", e.to_string())
    }

    fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

/// The natural key of a timetable entry.
struct Slot {
    class_id: String,
    day_of_week: i64,
    week: i64,
    semester: i64,
    year: i64,
}

fn parse_slot(req: &Request) -> Result<Slot, serde_json::Value> {
    Ok(Slot {
        class_id: required_str(req, "classId")?,
        day_of_week: required_day_of_week(req)?,
        week: required_week(req, MAX_STORED_WEEK)?,
        semester: required_semester(req)?.number(),
        year: required_i64(req, "year")?,
    })
}

fn parse_periods(req: &Request) -> Result<Vec<Period>, serde_json::Value> {
    let raw = req
        .params
        .get("periods")
        .cloned()
        .ok_or_else(|| err(&req.id, "bad_params", "missing periods", None))?;
    let mut periods: Vec<Period> = serde_json::from_value(raw)
        .map_err(|e| err(&req.id, "bad_params", format!("periods: {}", e), None))?;
    normalize_periods(&mut periods).map_err(|m| err(&req.id, "bad_params", m, None))?;
    Ok(periods)
}

fn check_teachers(
    conn: &Connection,
    req: &Request,
    periods: &[Period],
) -> Result<(), serde_json::Value> {
    let mut seen: Vec<&str> = Vec::new();
    for period in periods {
        if seen.contains(&period.teacher_id.as_str()) {
            continue;
        }
        ensure_teacher(conn, req, &period.teacher_id)?;
        seen.push(&period.teacher_id);
    }
    Ok(())
}

fn load_periods(conn: &Connection, entry_id: &str) -> Result<Vec<Period>, HandlerErr> {
    let mut stmt = conn
        .prepare(
            "SELECT start_time, end_time, subject, teacher_id, room
             FROM periods
             WHERE entry_id = ?
             ORDER BY idx",
        )
        .map_err(HandlerErr::db)?;
    stmt.query_map([entry_id], |r| {
        Ok(Period {
            start_time: r.get(0)?,
            end_time: r.get(1)?,
            subject: r.get(2)?,
            teacher_id: r.get(3)?,
            room: r.get(4)?,
        })
    })
    .and_then(|it| it.collect::<Result<Vec<_>, _>>())
    .map_err(HandlerErr::db)
}

/// Every stored entry occupying the same (dayOfWeek, week, semester, year)
/// slot, across all classes, minus the entry being replaced.
fn load_slot_entries(
    conn: &Connection,
    slot: &Slot,
    exclude_entry_id: Option<&str>,
) -> Result<Vec<StoredEntry>, HandlerErr> {
    let mut stmt = conn
        .prepare(
            "SELECT id, class_id FROM timetable_entries
             WHERE day_of_week = ? AND week = ? AND semester = ? AND year = ?
             ORDER BY id",
        )
        .map_err(HandlerErr::db)?;
    let heads = stmt
        .query_map(
            (slot.day_of_week, slot.week, slot.semester, slot.year),
            |r| Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?)),
        )
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(HandlerErr::db)?;

    let mut entries = Vec::with_capacity(heads.len());
    for (entry_id, class_id) in heads {
        if exclude_entry_id == Some(entry_id.as_str()) {
            continue;
        }
        let periods = load_periods(conn, &entry_id)?;
        entries.push(StoredEntry {
            entry_id,
            class_id,
            periods,
        });
    }
    Ok(entries)
}

/// Attach human-readable names to a raw conflict for the wire report.
/// Dangling references degrade to the raw id instead of failing the report.
fn annotate_conflicts(conn: &Connection, conflicts: &[Conflict]) -> Vec<serde_json::Value> {
    let lookup_user = |id: &str| user_name(conn, id).ok().flatten().unwrap_or_else(|| id.to_string());
    let lookup_class = |id: &str| class_name(conn, id).ok().flatten().unwrap_or_else(|| id.to_string());

    conflicts
        .iter()
        .map(|c| match c.kind {
            ConflictKind::TeacherConflict => {
                let teacher = lookup_user(&c.candidate.teacher_id);
                let conflict_class = lookup_class(&c.existing_class_id);
                json!({
                    "type": c.kind.as_str(),
                    "message": format!(
                        "Teacher {} is already booked {} in {}",
                        teacher, c.time, conflict_class
                    ),
                    "time": c.time,
                    "teacher": teacher,
                    "conflictClass": conflict_class,
                    "conflictSubject": c.existing.subject,
                    "candidate": c.candidate,
                    "existing": c.existing,
                    "existingEntryId": c.existing_entry_id,
                })
            }
            ConflictKind::ClassConflict => {
                let class = lookup_class(&c.existing_class_id);
                let conflict_teacher = lookup_user(&c.existing.teacher_id);
                json!({
                    "type": c.kind.as_str(),
                    "message": format!(
                        "Class {} already has {} at {}",
                        class, c.existing.subject, c.time
                    ),
                    "time": c.time,
                    "class": class,
                    "conflictTeacher": conflict_teacher,
                    "conflictSubject": c.existing.subject,
                    "candidate": c.candidate,
                    "existing": c.existing,
                    "existingEntryId": c.existing_entry_id,
                })
            }
        })
        .collect()
}

fn entry_json(
    conn: &Connection,
    entry_id: &str,
    class_id: &str,
    day_of_week: i64,
    week: i64,
    semester: i64,
    year: i64,
) -> Result<serde_json::Value, HandlerErr> {
    let mut periods = load_periods(conn, entry_id)?;
    sort_by_start(&mut periods);
    let class_name = class_name(conn, class_id).map_err(HandlerErr::db)?;
    Ok(json!({
        "id": entry_id,
        "classId": class_id,
        "className": class_name,
        "dayOfWeek": day_of_week,
        "week": week,
        "semester": semester,
        "year": year,
        "periods": periods,
    }))
}

fn now_ts() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Create-or-replace by natural key. Conflict detection and the write run
/// in one transaction so two callers cannot both pass the check and commit.
fn timetable_create(
    conn: &Connection,
    slot: Slot,
    periods: Vec<Period>,
) -> Result<serde_json::Value, HandlerErr> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| HandlerErr::new("db_tx_failed", e.to_string()))?;

    let replaced_id: Option<String> = tx
        .query_row(
            "SELECT id FROM timetable_entries
             WHERE class_id = ? AND day_of_week = ? AND week = ? AND semester = ? AND year = ?",
            (
                &slot.class_id,
                slot.day_of_week,
                slot.week,
                slot.semester,
                slot.year,
            ),
            |r| r.get(0),
        )
        .optional()
        .map_err(HandlerErr::db)?;

    let existing = load_slot_entries(&tx, &slot, replaced_id.as_deref())?;
    let conflicts = detect_conflicts(&slot.class_id, &periods, &existing);
    if !conflicts.is_empty() {
        let annotated = annotate_conflicts(&tx, &conflicts);
        let _ = tx.rollback();
        return Err(HandlerErr {
            code: "conflict",
            message: format!("{} schedule conflict(s) detected", annotated.len()),
            details: Some(json!({ "conflicts": annotated })),
        });
    }

    let entry_id = match &replaced_id {
        Some(id) => {
            tx.execute("DELETE FROM periods WHERE entry_id = ?", [id])
                .map_err(|e| HandlerErr::new("db_delete_failed", e.to_string()))?;
            tx.execute(
                "UPDATE timetable_entries SET updated_at = ? WHERE id = ?",
                (&now_ts(), id),
            )
            .map_err(|e| HandlerErr::new("db_update_failed", e.to_string()))?;
            id.clone()
        }
        None => {
            let id = Uuid::new_v4().to_string();
            tx.execute(
                "INSERT INTO timetable_entries(id, class_id, day_of_week, week, semester, year, updated_at)
                 VALUES(?, ?, ?, ?, ?, ?, ?)",
                (
                    &id,
                    &slot.class_id,
                    slot.day_of_week,
                    slot.week,
                    slot.semester,
                    slot.year,
                    &now_ts(),
                ),
            )
            .map_err(|e| HandlerErr::new("db_insert_failed", e.to_string()))?;
            id
        }
    };

    insert_periods(&tx, &entry_id, &periods)?;

    tx.commit()
        .map_err(|e| HandlerErr::new("db_commit_failed", e.to_string()))?;

    Ok(json!({ "entryId": entry_id, "replaced": replaced_id.is_some() }))
}

fn insert_periods(
    conn: &Connection,
    entry_id: &str,
    periods: &[Period],
) -> Result<(), HandlerErr> {
    for (idx, period) in periods.iter().enumerate() {
        conn.execute(
            "INSERT INTO periods(entry_id, idx, start_time, end_time, subject, teacher_id, room)
             VALUES(?, ?, ?, ?, ?, ?, ?)",
            (
                entry_id,
                idx as i64,
                &period.start_time,
                &period.end_time,
                &period.subject,
                &period.teacher_id,
                &period.room,
            ),
        )
        .map_err(|e| HandlerErr::new("db_insert_failed", e.to_string()))?;
    }
    Ok(())
}

/// Full periods replacement by entry id, re-validated against every other
/// entry in the same slot.
fn timetable_update(
    conn: &Connection,
    entry_id: &str,
    periods: Vec<Period>,
) -> Result<serde_json::Value, HandlerErr> {
    let head: Option<(String, i64, i64, i64, i64)> = conn
        .query_row(
            "SELECT class_id, day_of_week, week, semester, year
             FROM timetable_entries WHERE id = ?",
            [entry_id],
            |r| {
                Ok((
                    r.get(0)?,
                    r.get(1)?,
                    r.get(2)?,
                    r.get(3)?,
                    r.get(4)?,
                ))
            },
        )
        .optional()
        .map_err(HandlerErr::db)?;
    let Some((class_id, day_of_week, week, semester, year)) = head else {
        return Err(HandlerErr::new("not_found", "timetable entry not found"));
    };
    let slot = Slot {
        class_id,
        day_of_week,
        week,
        semester,
        year,
    };

    let tx = conn
        .unchecked_transaction()
        .map_err(|e| HandlerErr::new("db_tx_failed", e.to_string()))?;

    let existing = load_slot_entries(&tx, &slot, Some(entry_id))?;
    let conflicts = detect_conflicts(&slot.class_id, &periods, &existing);
    if !conflicts.is_empty() {
        let annotated = annotate_conflicts(&tx, &conflicts);
        let _ = tx.rollback();
        return Err(HandlerErr {
            code: "conflict",
            message: format!("{} schedule conflict(s) detected", annotated.len()),
            details: Some(json!({ "conflicts": annotated })),
        });
    }

    tx.execute("DELETE FROM periods WHERE entry_id = ?", [entry_id])
        .map_err(|e| HandlerErr::new("db_delete_failed", e.to_string()))?;
    insert_periods(&tx, entry_id, &periods)?;
    tx.execute(
        "UPDATE timetable_entries SET updated_at = ? WHERE id = ?",
        (&now_ts(), entry_id),
    )
    .map_err(|e| HandlerErr::new("db_update_failed", e.to_string()))?;

    tx.commit()
        .map_err(|e| HandlerErr::new("db_commit_failed", e.to_string()))?;

    Ok(json!({ "entryId": entry_id }))
}

fn handle_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let slot = match parse_slot(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let periods = match parse_periods(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    if let Err(e) = ensure_class_exists(conn, req, &slot.class_id) {
        return e;
    }
    if let Err(e) = check_teachers(conn, req, &periods) {
        return e;
    }
    match timetable_create(conn, slot, periods) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let entry_id = match required_str(req, "entryId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let periods = match parse_periods(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    if let Err(e) = check_teachers(conn, req, &periods) {
        return e;
    }
    match timetable_update(conn, &entry_id, periods) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let entry_id = match required_str(req, "entryId") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let exists: Option<i64> = match conn
        .query_row(
            "SELECT 1 FROM timetable_entries WHERE id = ?",
            [&entry_id],
            |r| r.get(0),
        )
        .optional()
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if exists.is_none() {
        return err(&req.id, "not_found", "timetable entry not found", None);
    }

    let tx = match conn.unchecked_transaction() {
        Ok(t) => t,
        Err(e) => return err(&req.id, "db_tx_failed", e.to_string(), None),
    };
    if let Err(e) = tx.execute("DELETE FROM periods WHERE entry_id = ?", [&entry_id]) {
        let _ = tx.rollback();
        return err(&req.id, "db_delete_failed", e.to_string(), None);
    }
    if let Err(e) = tx.execute("DELETE FROM timetable_entries WHERE id = ?", [&entry_id]) {
        let _ = tx.rollback();
        return err(&req.id, "db_delete_failed", e.to_string(), None);
    }
    if let Err(e) = tx.commit() {
        return err(&req.id, "db_commit_failed", e.to_string(), None);
    }

    ok(&req.id, json!({ "ok": true }))
}

fn handle_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let entry_id = match required_str(req, "entryId") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let head: Option<(String, i64, i64, i64, i64)> = match conn
        .query_row(
            "SELECT class_id, day_of_week, week, semester, year
             FROM timetable_entries WHERE id = ?",
            [&entry_id],
            |r| {
                Ok((
                    r.get(0)?,
                    r.get(1)?,
                    r.get(2)?,
                    r.get(3)?,
                    r.get(4)?,
                ))
            },
        )
        .optional()
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let Some((class_id, day_of_week, week, semester, year)) = head else {
        return err(&req.id, "not_found", "timetable entry not found", None);
    };

    match entry_json(conn, &entry_id, &class_id, day_of_week, week, semester, year) {
        Ok(entry) => ok(&req.id, json!({ "entry": entry })),
        Err(error) => error.response(&req.id),
    }
}

/// Optional week/semester/year narrowing shared by the list reads.
fn slot_filters(req: &Request) -> Result<(Option<i64>, Option<i64>, Option<i64>), serde_json::Value> {
    let week = opt_i64(req, "week")?;
    let semester = opt_i64(req, "semester")?;
    let year = opt_i64(req, "year")?;
    if let Some(s) = semester {
        if crate::academic::Semester::from_number(s).is_none() {
            return Err(err(&req.id, "bad_params", "semester must be 1 or 2", None));
        }
    }
    if let Some(w) = week {
        if !(1..=MAX_STORED_WEEK).contains(&w) {
            return Err(err(
                &req.id,
                "bad_params",
                format!("week must be between 1 and {}", MAX_STORED_WEEK),
                None,
            ));
        }
    }
    Ok((week, semester, year))
}

fn list_entries(
    conn: &Connection,
    req: &Request,
    where_clause: &str,
    args: Vec<i64>,
    text_arg: Option<&str>,
) -> Result<Vec<serde_json::Value>, serde_json::Value> {
    let sql = format!(
        "SELECT id, class_id, day_of_week, week, semester, year
         FROM timetable_entries
         WHERE {}
         ORDER BY year, semester, week, day_of_week, class_id",
        where_clause
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| err(&req.id, "db_query_failed", e.to_string(), None))?;

    let mut params: Vec<rusqlite::types::Value> = Vec::new();
    if let Some(t) = text_arg {
        params.push(rusqlite::types::Value::Text(t.to_string()));
    }
    for a in args {
        params.push(rusqlite::types::Value::Integer(a));
    }

    let heads = stmt
        .query_map(rusqlite::params_from_iter(params), |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, i64>(2)?,
                r.get::<_, i64>(3)?,
                r.get::<_, i64>(4)?,
                r.get::<_, i64>(5)?,
            ))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(|e| err(&req.id, "db_query_failed", e.to_string(), None))?;

    let mut out = Vec::with_capacity(heads.len());
    for (id, class_id, day_of_week, week, semester, year) in heads {
        let entry = entry_json(conn, &id, &class_id, day_of_week, week, semester, year)
            .map_err(|e| e.response(&req.id))?;
        out.push(entry);
    }
    Ok(out)
}

fn filter_sql(base: &str, week: Option<i64>, semester: Option<i64>, year: Option<i64>) -> (String, Vec<i64>) {
    let mut clause = base.to_string();
    let mut args = Vec::new();
    if let Some(w) = week {
        clause.push_str(" AND week = ?");
        args.push(w);
    }
    if let Some(s) = semester {
        clause.push_str(" AND semester = ?");
        args.push(s);
    }
    if let Some(y) = year {
        clause.push_str(" AND year = ?");
        args.push(y);
    }
    (clause, args)
}

fn handle_list_by_class(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let class_id = match required_str(req, "classId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if let Err(e) = ensure_class_exists(conn, req, &class_id) {
        return e;
    }
    let (week, semester, year) = match slot_filters(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (clause, args) = filter_sql("class_id = ?", week, semester, year);
    match list_entries(conn, req, &clause, args, Some(&class_id)) {
        Ok(entries) => ok(&req.id, json!({ "entries": entries })),
        Err(e) => e,
    }
}

fn handle_list_by_day(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let day = match required_day_of_week(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (week, semester, year) = match slot_filters(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let (clause, mut args) = filter_sql("day_of_week = ?", week, semester, year);
    args.insert(0, day);
    match list_entries(conn, req, &clause, args, None) {
        Ok(entries) => ok(&req.id, json!({ "entries": entries })),
        Err(e) => e,
    }
}

fn handle_list_by_teacher(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let teacher_id = match required_str(req, "teacherId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let known: Option<i64> = match conn
        .query_row("SELECT 1 FROM users WHERE id = ?", [&teacher_id], |r| {
            r.get(0)
        })
        .optional()
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    if known.is_none() {
        return err(&req.id, "not_found", "teacher not found", None);
    }
    let (week, semester, year) = match slot_filters(req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let (clause, args) = filter_sql(
        "EXISTS (SELECT 1 FROM periods p WHERE p.entry_id = timetable_entries.id AND p.teacher_id = ?)",
        week,
        semester,
        year,
    );
    let sql = format!(
        "SELECT id, class_id, day_of_week, week, semester, year
         FROM timetable_entries
         WHERE {}
         ORDER BY year, semester, week, day_of_week, class_id",
        clause
    );
    let mut stmt = match conn.prepare(&sql) {
        Ok(s) => s,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let mut params: Vec<rusqlite::types::Value> =
        vec![rusqlite::types::Value::Text(teacher_id.clone())];
    for a in args {
        params.push(rusqlite::types::Value::Integer(a));
    }
    let heads = match stmt
        .query_map(rusqlite::params_from_iter(params), |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, i64>(2)?,
                r.get::<_, i64>(3)?,
                r.get::<_, i64>(4)?,
                r.get::<_, i64>(5)?,
            ))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };

    // Only the teacher's own periods are surfaced, annotated with the class.
    let mut entries = Vec::with_capacity(heads.len());
    for (id, class_id, day_of_week, week, semester, year) in heads {
        let mut periods = match load_periods(conn, &id) {
            Ok(p) => p,
            Err(e) => return e.response(&req.id),
        };
        periods.retain(|p| p.teacher_id == teacher_id);
        sort_by_start(&mut periods);
        let class_name = match class_name(conn, &class_id) {
            Ok(v) => v,
            Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
        };
        entries.push(json!({
            "id": id,
            "classId": class_id,
            "className": class_name,
            "dayOfWeek": day_of_week,
            "week": week,
            "semester": semester,
            "year": year,
            "periods": periods,
        }));
    }

    ok(&req.id, json!({ "entries": entries }))
}

/// Advisory dry-run: same detection as a write, nothing committed.
fn handle_check_conflicts(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let slot = match parse_slot(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let periods = match parse_periods(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let exclude = match opt_str(req, "excludeEntryId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    if let Err(e) = ensure_class_exists(conn, req, &slot.class_id) {
        return e;
    }

    let existing = match load_slot_entries(conn, &slot, exclude.as_deref()) {
        Ok(v) => v,
        Err(e) => return e.response(&req.id),
    };
    let conflicts = detect_conflicts(&slot.class_id, &periods, &existing);
    let annotated = annotate_conflicts(conn, &conflicts);
    ok(
        &req.id,
        json!({ "conflicts": annotated, "count": annotated.len() }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "timetable.create" => Some(handle_create(state, req)),
        "timetable.update" => Some(handle_update(state, req)),
        "timetable.delete" => Some(handle_delete(state, req)),
        "timetable.open" => Some(handle_open(state, req)),
        "timetable.listByClass" => Some(handle_list_by_class(state, req)),
        "timetable.listByDay" => Some(handle_list_by_day(state, req)),
        "timetable.listByTeacher" => Some(handle_list_by_teacher(state, req)),
        "timetable.checkConflicts" => Some(handle_check_conflicts(state, req)),
        _ => None,
    }
}
