use crate::academic::{
    position_for, week_dates, year_config, Semester, DAY_KEYS, WEEKS_PER_SEMESTER,
};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{required_semester, required_week, today_or_now};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

fn iso(date: chrono::NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn handle_current_info(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let today = match today_or_now(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let position = position_for(today);
    let config = year_config(position.academic_year);

    ok(
        &req.id,
        json!({
            "academicYear": config.academic_year,
            "academicYearLabel": format!("{}-{}", config.academic_year, config.academic_year + 1),
            "currentSemester": position.semester.number(),
            "currentWeek": position.week,
            "isVacation": position.is_vacation,
            "weeksPerSemester": WEEKS_PER_SEMESTER,
            "semester1": {
                "start": iso(config.semester1.start),
                "end": iso(config.semester1.end),
            },
            "semester2": {
                "start": iso(config.semester2.start),
                "end": iso(config.semester2.end),
            },
        }),
    )
}

fn handle_week_dates(_state: &mut AppState, req: &Request) -> serde_json::Value {
    let semester: Semester = match required_semester(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let week = match required_week(req, WEEKS_PER_SEMESTER as i64) {
        Ok(v) => v as u32,
        Err(e) => return e,
    };
    let today = match today_or_now(req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let config = year_config(crate::academic::academic_year_for(today));
    let dates = week_dates(&config, semester, week);

    let mut by_day = serde_json::Map::new();
    for (key, date) in DAY_KEYS.iter().zip(dates.iter()) {
        by_day.insert(key.to_string(), json!(iso(*date)));
    }

    ok(
        &req.id,
        json!({
            "semester": semester.number(),
            "week": week,
            "weekStartDate": iso(dates[0]),
            "dates": by_day,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "academic.currentInfo" => Some(handle_current_info(state, req)),
        "academic.weekDates" => Some(handle_week_dates(state, req)),
        _ => None,
    }
}
