use chrono::NaiveDate;

pub const DEFAULT_LESSON_MINUTES: i64 = 45;
pub const DEFAULT_BREAK_MINUTES: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortenedSchedule {
    pub lesson_minutes: i64,
    pub break_minutes: i64,
}

/// The event's kind, with per-variant payload. Only a shortened day carries
/// timing; reading durations off a vacation is unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub enum EventDetail {
    Vacation,
    Holiday,
    ShortenedDay(ShortenedSchedule),
    ClassException,
}

impl EventDetail {
    pub fn type_name(&self) -> &'static str {
        match self {
            EventDetail::Vacation => "vacation",
            EventDetail::Holiday => "holiday",
            EventDetail::ShortenedDay(_) => "shortened_day",
            EventDetail::ClassException => "class_exception",
        }
    }
}

/// School-wide events never carry a class; class-scoped events always do.
#[derive(Debug, Clone, PartialEq)]
pub enum EventScope {
    AllSchool,
    Class(String),
}

impl EventScope {
    pub fn class_id(&self) -> Option<&str> {
        match self {
            EventScope::AllSchool => None,
            EventScope::Class(id) => Some(id.as_str()),
        }
    }

    pub fn is_all_school(&self) -> bool {
        matches!(self, EventScope::AllSchool)
    }
}

/// A date-range deviation from the base timetable. Inclusive on both ends.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    pub id: String,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub scope: EventScope,
    pub detail: EventDetail,
}

impl CalendarEvent {
    /// Structural validation at construction: date order, class_exception
    /// scoping, positive shortened-day durations.
    pub fn new(
        id: String,
        name: String,
        start_date: NaiveDate,
        end_date: NaiveDate,
        scope: EventScope,
        detail: EventDetail,
    ) -> Result<CalendarEvent, String> {
        if start_date > end_date {
            return Err("startDate must not be after endDate".to_string());
        }
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err("name must not be empty".to_string());
        }
        if matches!(detail, EventDetail::ClassException) && scope.is_all_school() {
            return Err("class_exception events require a classId".to_string());
        }
        if let EventDetail::ShortenedDay(sched) = &detail {
            if sched.lesson_minutes <= 0 || sched.break_minutes <= 0 {
                return Err("shortenedSchedule durations must be positive".to_string());
            }
        }
        Ok(CalendarEvent {
            id,
            name,
            start_date,
            end_date,
            scope,
            detail,
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// Whole-day ranges: overlap is inclusive on both ends.
    pub fn overlaps(&self, range_start: NaiveDate, range_end: NaiveDate) -> bool {
        self.start_date <= range_end && self.end_date >= range_start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).expect("test date")
    }

    fn vacation(start: NaiveDate, end: NaiveDate) -> Result<CalendarEvent, String> {
        CalendarEvent::new(
            "e1".to_string(),
            "Autumn break".to_string(),
            start,
            end,
            EventScope::AllSchool,
            EventDetail::Vacation,
        )
    }

    #[test]
    fn rejects_inverted_date_range() {
        assert!(vacation(d(2025, 11, 3), d(2025, 11, 1)).is_err());
        assert!(vacation(d(2025, 11, 1), d(2025, 11, 1)).is_ok());
    }

    #[test]
    fn class_exception_requires_class_scope() {
        let school_wide = CalendarEvent::new(
            "e1".to_string(),
            "9B field trip".to_string(),
            d(2025, 10, 1),
            d(2025, 10, 1),
            EventScope::AllSchool,
            EventDetail::ClassException,
        );
        assert!(school_wide.is_err());

        let scoped = CalendarEvent::new(
            "e1".to_string(),
            "9B field trip".to_string(),
            d(2025, 10, 1),
            d(2025, 10, 1),
            EventScope::Class("c1".to_string()),
            EventDetail::ClassException,
        );
        assert!(scoped.is_ok());
    }

    #[test]
    fn shortened_day_durations_must_be_positive() {
        let bad = CalendarEvent::new(
            "e1".to_string(),
            "Short day".to_string(),
            d(2025, 10, 1),
            d(2025, 10, 1),
            EventScope::AllSchool,
            EventDetail::ShortenedDay(ShortenedSchedule {
                lesson_minutes: 0,
                break_minutes: 10,
            }),
        );
        assert!(bad.is_err());
    }

    #[test]
    fn containment_and_overlap_are_inclusive() {
        let ev = vacation(d(2025, 11, 1), d(2025, 11, 7)).expect("event");
        assert!(ev.contains(d(2025, 11, 1)));
        assert!(ev.contains(d(2025, 11, 7)));
        assert!(!ev.contains(d(2025, 11, 8)));
        assert!(ev.overlaps(d(2025, 11, 7), d(2025, 11, 20)));
        assert!(!ev.overlaps(d(2025, 11, 8), d(2025, 11, 20)));
    }
}
