use crate::event::{CalendarEvent, EventDetail, ShortenedSchedule};
use crate::schedule::format_hhmm;

/// Shortened days re-time lessons sequentially from this instant.
const DAY_START_MINUTES: u16 = 8 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonStatus {
    Normal,
    Cancelled,
}

impl LessonStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LessonStatus::Normal => "normal",
            LessonStatus::Cancelled => "cancelled",
        }
    }
}

/// One line of a resolved day. `class_id`/`class_name` identify the owning
/// class (surfaced only in the teacher view).
#[derive(Debug, Clone, PartialEq)]
pub struct Lesson {
    pub subject: String,
    pub teacher_id: String,
    pub start_time: String,
    pub end_time: String,
    pub room: String,
    pub status: LessonStatus,
    pub class_id: String,
    pub class_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayResolution {
    /// normal | vacation | holiday | class_exception | shortened_day
    pub event_type: &'static str,
    pub event_name: Option<String>,
    pub lessons: Vec<Lesson>,
}

fn closure_event<'a>(
    events: &'a [CalendarEvent],
    class_id: Option<&str>,
) -> Option<&'a CalendarEvent> {
    let is_closure =
        |ev: &CalendarEvent| matches!(ev.detail, EventDetail::Vacation | EventDetail::Holiday);
    // School-wide closures outrank class-scoped ones.
    events
        .iter()
        .find(|ev| is_closure(ev) && ev.scope.is_all_school())
        .or_else(|| {
            let class_id = class_id?;
            events
                .iter()
                .find(|ev| is_closure(ev) && ev.scope.class_id() == Some(class_id))
        })
}

fn shortened_day(events: &[CalendarEvent]) -> Option<(&CalendarEvent, ShortenedSchedule)> {
    events.iter().find_map(|ev| match ev.detail {
        EventDetail::ShortenedDay(sched) if ev.scope.is_all_school() => Some((ev, sched)),
        _ => None,
    })
}

fn class_exceptions(events: &[CalendarEvent]) -> impl Iterator<Item = &CalendarEvent> {
    events
        .iter()
        .filter(|ev| matches!(ev.detail, EventDetail::ClassException))
}

/// Discard the stored times and re-time every lesson sequentially from
/// 08:00, preserving order: `lesson_minutes` each, `break_minutes` between.
fn apply_shortened(lessons: &mut [Lesson], sched: ShortenedSchedule) {
    let mut cursor = DAY_START_MINUTES as i64;
    for lesson in lessons.iter_mut() {
        let start = cursor;
        let end = start + sched.lesson_minutes;
        lesson.start_time = format_hhmm(start.clamp(0, 23 * 60 + 59) as u16);
        lesson.end_time = format_hhmm(end.clamp(0, 23 * 60 + 59) as u16);
        cursor = end + sched.break_minutes;
    }
}

/// Resolve a student's day. `class_id` is the student's home class (a
/// student without one has no timetable and resolves to an empty, normal
/// day). `base` must already be sorted by start time.
pub fn resolve_student_day(
    class_id: Option<&str>,
    mut base: Vec<Lesson>,
    events: &[CalendarEvent],
) -> DayResolution {
    if let Some(ev) = closure_event(events, class_id) {
        return DayResolution {
            event_type: ev.detail.type_name(),
            event_name: Some(ev.name.clone()),
            lessons: Vec::new(),
        };
    }

    if let Some(class_id) = class_id {
        if let Some(ev) = class_exceptions(events).find(|ev| ev.scope.class_id() == Some(class_id))
        {
            return DayResolution {
                event_type: "class_exception",
                event_name: Some(ev.name.clone()),
                lessons: Vec::new(),
            };
        }
    }

    if let Some((ev, sched)) = shortened_day(events) {
        apply_shortened(&mut base, sched);
        return DayResolution {
            event_type: "shortened_day",
            event_name: Some(ev.name.clone()),
            lessons: base,
        };
    }

    DayResolution {
        event_type: "normal",
        event_name: None,
        lessons: base,
    }
}

/// Resolve a teacher's day across all classes. Teachers have no home class:
/// only school-wide closures empty the day, and a class exception cancels
/// just the periods taught in the excepted class.
pub fn resolve_teacher_day(mut base: Vec<Lesson>, events: &[CalendarEvent]) -> DayResolution {
    if let Some(ev) = closure_event(events, None) {
        return DayResolution {
            event_type: ev.detail.type_name(),
            event_name: Some(ev.name.clone()),
            lessons: Vec::new(),
        };
    }

    let mut exception_name: Option<String> = None;
    for ev in class_exceptions(events) {
        let Some(excepted) = ev.scope.class_id() else {
            continue;
        };
        for lesson in base.iter_mut().filter(|l| l.class_id == excepted) {
            lesson.status = LessonStatus::Cancelled;
            if exception_name.is_none() {
                exception_name = Some(ev.name.clone());
            }
        }
    }

    let shortened = shortened_day(events);
    if let Some((_, sched)) = shortened {
        apply_shortened(&mut base, sched);
    }

    // Cancellations are the bigger deviation; they win the day label even
    // when the remaining periods were also re-timed.
    if let Some(name) = exception_name {
        return DayResolution {
            event_type: "class_exception",
            event_name: Some(name),
            lessons: base,
        };
    }
    if let Some((ev, _)) = shortened {
        return DayResolution {
            event_type: "shortened_day",
            event_name: Some(ev.name.clone()),
            lessons: base,
        };
    }
    DayResolution {
        event_type: "normal",
        event_name: None,
        lessons: base,
    }
}
