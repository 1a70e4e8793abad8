use serde::{Deserialize, Serialize};

/// One subject slot inside a timetable entry. Times are kept as zero-padded
/// 24-hour `HH:mm` strings; with that normalization lexical order equals
/// chronological order, which the conflict detector relies on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    pub start_time: String,
    pub end_time: String,
    pub subject: String,
    pub teacher_id: String,
    #[serde(default)]
    pub room: String,
}

/// Parse `HH:mm` (a single-digit hour is tolerated on input) into minutes
/// since midnight. Returns `None` for anything else.
pub fn parse_hhmm(raw: &str) -> Option<u16> {
    let (h, m) = raw.trim().split_once(':')?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return None;
    }
    if !h.bytes().all(|b| b.is_ascii_digit()) || !m.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: u16 = h.parse().ok()?;
    let minutes: u16 = m.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

pub fn format_hhmm(minutes_since_midnight: u16) -> String {
    format!(
        "{:02}:{:02}",
        minutes_since_midnight / 60,
        minutes_since_midnight % 60
    )
}

/// Validate one period in place: times parse, end is strictly after start,
/// subject and teacher are present. Times are re-emitted zero-padded.
pub fn normalize_period(period: &mut Period) -> Result<(), String> {
    let start = parse_hhmm(&period.start_time)
        .ok_or_else(|| format!("startTime must be HH:mm, got {:?}", period.start_time))?;
    let end = parse_hhmm(&period.end_time)
        .ok_or_else(|| format!("endTime must be HH:mm, got {:?}", period.end_time))?;
    if end <= start {
        return Err(format!(
            "endTime must be after startTime ({} >= {})",
            period.start_time, period.end_time
        ));
    }
    period.subject = period.subject.trim().to_string();
    if period.subject.is_empty() {
        return Err("subject must not be empty".to_string());
    }
    if period.teacher_id.trim().is_empty() {
        return Err("teacherId must not be empty".to_string());
    }
    period.start_time = format_hhmm(start);
    period.end_time = format_hhmm(end);
    period.room = period.room.trim().to_string();
    Ok(())
}

pub fn normalize_periods(periods: &mut [Period]) -> Result<(), String> {
    for (i, period) in periods.iter_mut().enumerate() {
        normalize_period(period).map_err(|m| format!("periods[{}]: {}", i, m))?;
    }
    Ok(())
}

/// Display contract: reads return periods ordered by start time. Normalized
/// strings sort lexically in chronological order.
pub fn sort_by_start(periods: &mut [Period]) {
    periods.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.end_time.cmp(&b.end_time))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(start: &str, end: &str) -> Period {
        Period {
            start_time: start.to_string(),
            end_time: end.to_string(),
            subject: "Mathematics".to_string(),
            teacher_id: "t1".to_string(),
            room: String::new(),
        }
    }

    #[test]
    fn parses_and_zero_pads() {
        assert_eq!(parse_hhmm("09:00"), Some(540));
        assert_eq!(parse_hhmm("9:05"), Some(545));
        assert_eq!(parse_hhmm("23:59"), Some(1439));
        assert_eq!(parse_hhmm("24:00"), None);
        assert_eq!(parse_hhmm("09:60"), None);
        assert_eq!(parse_hhmm("0900"), None);
        assert_eq!(parse_hhmm("09:0"), None);
        assert_eq!(format_hhmm(545), "09:05");
    }

    #[test]
    fn normalize_rejects_inverted_or_empty_ranges() {
        let mut p = period("10:00", "09:00");
        assert!(normalize_period(&mut p).is_err());
        let mut p = period("10:00", "10:00");
        assert!(normalize_period(&mut p).is_err());
        let mut p = period("9:00", "9:45");
        normalize_period(&mut p).expect("valid period");
        assert_eq!(p.start_time, "09:00");
        assert_eq!(p.end_time, "09:45");
    }

    #[test]
    fn sort_orders_by_start_time() {
        let mut periods = vec![period("12:00", "12:45"), period("08:00", "08:45")];
        sort_by_start(&mut periods);
        assert_eq!(periods[0].start_time, "08:00");
        assert_eq!(periods[1].start_time, "12:00");
    }
}
