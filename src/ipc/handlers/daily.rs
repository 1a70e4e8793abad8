use crate::academic::position_for;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::events::load_events_on_date;
use crate::ipc::helpers::{db_conn, required_date, required_str, user_name};
use crate::ipc::types::{AppState, Request};
use crate::resolve::{resolve_student_day, resolve_teacher_day, DayResolution, Lesson, LessonStatus};
use chrono::Datelike;
use rusqlite::{Connection, OptionalExtension};
use serde_json::json;
use std::collections::HashMap;

fn load_lessons_for_entry(
    conn: &Connection,
    entry_id: &str,
    class_id: &str,
    class_name: Option<String>,
    teacher_filter: Option<&str>,
) -> Result<Vec<Lesson>, String> {
    let mut stmt = conn
        .prepare(
            "SELECT start_time, end_time, subject, teacher_id, room
             FROM periods
             WHERE entry_id = ?
             ORDER BY start_time, idx",
        )
        .map_err(|e| e.to_string())?;
    let rows = stmt
        .query_map([entry_id], |r| {
            Ok(Lesson {
                start_time: r.get(0)?,
                end_time: r.get(1)?,
                subject: r.get(2)?,
                teacher_id: r.get(3)?,
                room: r.get(4)?,
                status: LessonStatus::Normal,
                class_id: class_id.to_string(),
                class_name: class_name.clone(),
            })
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(|e| e.to_string())?;
    Ok(match teacher_filter {
        Some(teacher_id) => rows
            .into_iter()
            .filter(|l| l.teacher_id == teacher_id)
            .collect(),
        None => rows,
    })
}

fn student_base_lessons(
    conn: &Connection,
    class_id: &str,
    day_of_week: i64,
    week: i64,
    semester: i64,
    year: i64,
) -> Result<Vec<Lesson>, String> {
    let entry_id: Option<String> = conn
        .query_row(
            "SELECT id FROM timetable_entries
             WHERE class_id = ? AND day_of_week = ? AND week = ? AND semester = ? AND year = ?",
            (class_id, day_of_week, week, semester, year),
            |r| r.get(0),
        )
        .optional()
        .map_err(|e| e.to_string())?;
    match entry_id {
        Some(entry_id) => load_lessons_for_entry(conn, &entry_id, class_id, None, None),
        None => Ok(Vec::new()),
    }
}

fn teacher_base_lessons(
    conn: &Connection,
    teacher_id: &str,
    day_of_week: i64,
    week: i64,
    semester: i64,
    year: i64,
) -> Result<Vec<Lesson>, String> {
    let mut stmt = conn
        .prepare(
            "SELECT t.id, t.class_id, c.name
             FROM timetable_entries t
             LEFT JOIN classes c ON c.id = t.class_id
             WHERE t.day_of_week = ? AND t.week = ? AND t.semester = ? AND t.year = ?
             ORDER BY t.class_id",
        )
        .map_err(|e| e.to_string())?;
    let heads = stmt
        .query_map((day_of_week, week, semester, year), |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, Option<String>>(2)?,
            ))
        })
        .and_then(|it| it.collect::<Result<Vec<_>, _>>())
        .map_err(|e| e.to_string())?;

    let mut lessons = Vec::new();
    for (entry_id, class_id, class_name) in heads {
        lessons.extend(load_lessons_for_entry(
            conn,
            &entry_id,
            &class_id,
            class_name,
            Some(teacher_id),
        )?);
    }
    // One chronological day across all classes.
    lessons.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.class_id.cmp(&b.class_id))
    });
    Ok(lessons)
}

fn lessons_json(
    conn: &Connection,
    resolution: &DayResolution,
    teacher_view: bool,
) -> Vec<serde_json::Value> {
    let mut names: HashMap<String, String> = HashMap::new();
    resolution
        .lessons
        .iter()
        .map(|lesson| {
            let teacher = names
                .entry(lesson.teacher_id.clone())
                .or_insert_with(|| {
                    user_name(conn, &lesson.teacher_id)
                        .ok()
                        .flatten()
                        .unwrap_or_else(|| lesson.teacher_id.clone())
                })
                .clone();
            let mut out = json!({
                "subject": lesson.subject,
                "teacherId": lesson.teacher_id,
                "teacher": teacher,
                "startTime": lesson.start_time,
                "endTime": lesson.end_time,
                "room": lesson.room,
                "status": lesson.status.as_str(),
            });
            if teacher_view {
                out["className"] = json!(lesson
                    .class_name
                    .clone()
                    .unwrap_or_else(|| lesson.class_id.clone()));
            }
            out
        })
        .collect()
}

fn handle_for_date(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let user_id = match required_str(req, "userId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let date = match required_date(req, "date") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let user: Option<(String, Option<String>)> = match conn
        .query_row(
            "SELECT role, class_id FROM users WHERE id = ?",
            [&user_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()
    {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let Some((role, home_class)) = user else {
        return err(&req.id, "not_found", "user not found", None);
    };

    let position = position_for(date);
    let day_of_week = date.weekday().num_days_from_sunday() as i64;
    let week = position.week as i64;
    let semester = position.semester.number();
    let year = position.academic_year as i64;

    let events = match load_events_on_date(conn, date) {
        Ok(v) => v,
        Err(m) => return err(&req.id, "db_query_failed", m, None),
    };

    let (resolution, teacher_view) = match role.as_str() {
        "student" => {
            let base = match &home_class {
                Some(class_id) => {
                    match student_base_lessons(conn, class_id, day_of_week, week, semester, year) {
                        Ok(v) => v,
                        Err(m) => return err(&req.id, "db_query_failed", m, None),
                    }
                }
                // A student without a class has nothing to resolve against.
                None => Vec::new(),
            };
            (
                resolve_student_day(home_class.as_deref(), base, &events),
                false,
            )
        }
        "teacher" => {
            let base =
                match teacher_base_lessons(conn, &user_id, day_of_week, week, semester, year) {
                    Ok(v) => v,
                    Err(m) => return err(&req.id, "db_query_failed", m, None),
                };
            (resolve_teacher_day(base, &events), true)
        }
        _ => {
            return err(
                &req.id,
                "bad_params",
                "schedule view requires a student or teacher",
                None,
            )
        }
    };

    let lessons = lessons_json(conn, &resolution, teacher_view);
    ok(
        &req.id,
        json!({
            "date": date.format("%Y-%m-%d").to_string(),
            "dayOfWeek": day_of_week,
            "academicYear": year,
            "semester": semester,
            "week": week,
            "eventType": resolution.event_type,
            "eventName": resolution.event_name,
            "lessons": lessons,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "schedule.forDate" => Some(handle_for_date(state, req)),
        _ => None,
    }
}
