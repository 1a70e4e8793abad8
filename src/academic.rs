use chrono::{Datelike, Duration, NaiveDate};

/// Both semesters run a fixed 16 teaching weeks; the date spans below are
/// the enrollment windows, not the source of this number.
pub const WEEKS_PER_SEMESTER: u32 = 16;

pub const DAY_KEYS: [&str; 7] = [
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Semester {
    First,
    Second,
}

impl Semester {
    pub fn number(self) -> i64 {
        match self {
            Semester::First => 1,
            Semester::Second => 2,
        }
    }

    pub fn from_number(n: i64) -> Option<Semester> {
        match n {
            1 => Some(Semester::First),
            2 => Some(Semester::Second),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemesterWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcademicYearConfig {
    /// Starting calendar year of the school year (2025 means 2025-2026).
    pub academic_year: i32,
    pub semester1: SemesterWindow,
    pub semester2: SemesterWindow,
}

impl AcademicYearConfig {
    pub fn window(&self, semester: Semester) -> SemesterWindow {
        match semester {
            Semester::First => self.semester1,
            Semester::Second => self.semester2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcademicPosition {
    pub academic_year: i32,
    pub semester: Semester,
    pub week: u32,
    pub is_vacation: bool,
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    // All call sites pass fixed month/day constants from the school calendar.
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
}

/// School years start in September: Sep-Dec belong to the current calendar
/// year, Jan-Aug to the previous one.
pub fn academic_year_for(today: NaiveDate) -> i32 {
    if today.month() >= 9 {
        today.year()
    } else {
        today.year() - 1
    }
}

pub fn year_config(academic_year: i32) -> AcademicYearConfig {
    AcademicYearConfig {
        academic_year,
        semester1: SemesterWindow {
            start: ymd(academic_year, 9, 2),
            end: ymd(academic_year + 1, 1, 17),
        },
        semester2: SemesterWindow {
            start: ymd(academic_year + 1, 1, 27),
            end: ymd(academic_year + 1, 6, 20),
        },
    }
}

/// Map a date to (academic year, semester, week). Outside the semester
/// windows the nearest upcoming semester is reported with week 1 and
/// `is_vacation` set; no week arithmetic happens there.
pub fn position_for(today: NaiveDate) -> AcademicPosition {
    let config = year_config(academic_year_for(today));

    let in_window = |w: SemesterWindow| today >= w.start && today <= w.end;

    let (semester, window) = if in_window(config.semester1) {
        (Semester::First, config.semester1)
    } else if in_window(config.semester2) {
        (Semester::Second, config.semester2)
    } else if today < config.semester1.start {
        return AcademicPosition {
            academic_year: config.academic_year,
            semester: Semester::First,
            week: 1,
            is_vacation: true,
        };
    } else if today < config.semester2.start {
        // Winter break.
        return AcademicPosition {
            academic_year: config.academic_year,
            semester: Semester::Second,
            week: 1,
            is_vacation: true,
        };
    } else {
        // Summer break rolls into next year's first semester.
        return AcademicPosition {
            academic_year: config.academic_year + 1,
            semester: Semester::First,
            week: 1,
            is_vacation: true,
        };
    };

    let days_in = (today - window.start).num_days();
    let week = (days_in / 7 + 1).clamp(1, WEEKS_PER_SEMESTER as i64) as u32;

    AcademicPosition {
        academic_year: config.academic_year,
        semester,
        week,
        is_vacation: false,
    }
}

/// Monday of the given teaching week. The semester start rolls forward to
/// the next Monday (a Sunday start rolls one day, a Monday stays put).
///
/// `week` must already be validated to [1, WEEKS_PER_SEMESTER] by the
/// caller; this layer does not clamp.
pub fn week_start_date(config: &AcademicYearConfig, semester: Semester, week: u32) -> NaiveDate {
    let start = config.window(semester).start;
    let to_monday = (7 - start.weekday().num_days_from_monday()) % 7;
    start + Duration::days(to_monday as i64 + (week as i64 - 1) * 7)
}

/// The 7 consecutive dates of a teaching week, Monday first.
pub fn week_dates(config: &AcademicYearConfig, semester: Semester, week: u32) -> [NaiveDate; 7] {
    let monday = week_start_date(config, semester, week);
    std::array::from_fn(|i| monday + Duration::days(i as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).expect("test date")
    }

    #[test]
    fn academic_year_flips_in_september() {
        assert_eq!(academic_year_for(d(2025, 8, 31)), 2024);
        assert_eq!(academic_year_for(d(2025, 9, 1)), 2025);
        assert_eq!(academic_year_for(d(2026, 1, 10)), 2025);
    }

    #[test]
    fn semester_windows_are_fixed_dates() {
        let config = year_config(2025);
        assert_eq!(config.semester1.start, d(2025, 9, 2));
        assert_eq!(config.semester1.end, d(2026, 1, 17));
        assert_eq!(config.semester2.start, d(2026, 1, 27));
        assert_eq!(config.semester2.end, d(2026, 6, 20));
    }

    #[test]
    fn week_number_advances_every_seven_days() {
        // 2025-09-02 is a Tuesday; days 0-6 are week 1, days 7-13 week 2.
        let pos = position_for(d(2025, 9, 8));
        assert_eq!(pos.semester, Semester::First);
        assert_eq!(pos.week, 1);
        assert!(!pos.is_vacation);

        let pos = position_for(d(2025, 9, 15));
        assert_eq!(pos.week, 2);

        let pos = position_for(d(2026, 1, 17));
        assert_eq!(pos.semester, Semester::First);
        assert_eq!(pos.week, WEEKS_PER_SEMESTER);
    }

    #[test]
    fn out_of_window_dates_clamp_to_week_one_vacation() {
        // Far before the academic window: ~400 days ahead of 2024-09-02.
        let pos = position_for(d(2024, 7, 30));
        assert_eq!(pos.academic_year, 2024);
        assert_eq!(pos.semester, Semester::First);
        assert_eq!(pos.week, 1);
        assert!(pos.is_vacation);

        // Winter break sits between the windows.
        let pos = position_for(d(2026, 1, 20));
        assert_eq!(pos.academic_year, 2025);
        assert_eq!(pos.semester, Semester::Second);
        assert_eq!(pos.week, 1);
        assert!(pos.is_vacation);

        // Summer break reports next year's first semester.
        let pos = position_for(d(2026, 7, 1));
        assert_eq!(pos.academic_year, 2026);
        assert_eq!(pos.semester, Semester::First);
        assert_eq!(pos.week, 1);
        assert!(pos.is_vacation);
    }

    #[test]
    fn week_start_rolls_forward_to_monday() {
        let config = year_config(2025);
        // Sep 2 2025 is a Tuesday; the first teaching Monday is Sep 8.
        assert_eq!(week_start_date(&config, Semester::First, 1), d(2025, 9, 8));
        assert_eq!(week_start_date(&config, Semester::First, 3), d(2025, 9, 22));

        // 2029-09-02 is a Sunday: rolls forward exactly one day.
        let config = year_config(2029);
        assert_eq!(week_start_date(&config, Semester::First, 1), d(2029, 9, 3));

        // 2030-09-02 is a Monday: stays put.
        let config = year_config(2030);
        assert_eq!(week_start_date(&config, Semester::First, 1), d(2030, 9, 2));
    }

    #[test]
    fn week_dates_are_seven_consecutive_days_from_monday() {
        use chrono::Weekday;
        for year in [2024, 2025, 2026] {
            let config = year_config(year);
            for semester in [Semester::First, Semester::Second] {
                for week in 1..=WEEKS_PER_SEMESTER {
                    let dates = week_dates(&config, semester, week);
                    assert_eq!(dates[0].weekday(), Weekday::Mon);
                    for i in 1..7 {
                        assert_eq!(dates[i] - dates[i - 1], Duration::days(1));
                    }
                }
            }
        }
    }
}
