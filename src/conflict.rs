use serde::Serialize;

use crate::schedule::{parse_hhmm, Period};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    TeacherConflict,
    ClassConflict,
}

impl ConflictKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ConflictKind::TeacherConflict => "teacher_conflict",
            ConflictKind::ClassConflict => "class_conflict",
        }
    }
}

/// A stored timetable entry loaded for comparison: the entry's identity plus
/// its periods as persisted.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub entry_id: String,
    pub class_id: String,
    pub periods: Vec<Period>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConflictSide {
    pub subject: String,
    pub teacher_id: String,
    pub start_time: String,
    pub end_time: String,
}

/// One detected double-booking. Computed transiently during validation and
/// returned to the caller; never persisted.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    #[serde(rename = "type")]
    pub kind: ConflictKind,
    /// Intersection of the two ranges, `HH:mm-HH:mm`.
    pub time: String,
    pub candidate: ConflictSide,
    pub existing: ConflictSide,
    pub existing_entry_id: String,
    pub existing_class_id: String,
}

/// Half-open overlap test on normalized times: [s1,e1) and [s2,e2) overlap
/// iff s1 < e2 and e1 > s2. Touching endpoints do not overlap.
fn overlap_window(a: &Period, b: &Period) -> Option<(u16, u16)> {
    let (s1, e1) = (parse_hhmm(&a.start_time)?, parse_hhmm(&a.end_time)?);
    let (s2, e2) = (parse_hhmm(&b.start_time)?, parse_hhmm(&b.end_time)?);
    if s1 < e2 && e1 > s2 {
        Some((s1.max(s2), e1.min(e2)))
    } else {
        None
    }
}

fn side(period: &Period) -> ConflictSide {
    ConflictSide {
        subject: period.subject.clone(),
        teacher_id: period.teacher_id.clone(),
        start_time: period.start_time.clone(),
        end_time: period.end_time.clone(),
    }
}

/// Compare candidate periods for `class_id` against every stored entry in
/// the same (dayOfWeek, week, semester, year) slot — the caller loads and
/// pre-filters `existing`, including dropping the entry being replaced.
///
/// Per overlapping pair both checks run independently: a shared teacher
/// emits a teacher_conflict regardless of class, and a shared class emits a
/// class_conflict regardless of teacher. Candidate periods are not compared
/// against each other.
///
/// An empty result means the candidate set is safe to commit.
pub fn detect_conflicts(
    class_id: &str,
    candidates: &[Period],
    existing: &[StoredEntry],
) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for candidate in candidates {
        for entry in existing {
            for stored in &entry.periods {
                let Some((from, to)) = overlap_window(candidate, stored) else {
                    continue;
                };
                let time = format!(
                    "{}-{}",
                    crate::schedule::format_hhmm(from),
                    crate::schedule::format_hhmm(to)
                );
                if candidate.teacher_id == stored.teacher_id {
                    conflicts.push(Conflict {
                        kind: ConflictKind::TeacherConflict,
                        time: time.clone(),
                        candidate: side(candidate),
                        existing: side(stored),
                        existing_entry_id: entry.entry_id.clone(),
                        existing_class_id: entry.class_id.clone(),
                    });
                }
                if entry.class_id == class_id {
                    conflicts.push(Conflict {
                        kind: ConflictKind::ClassConflict,
                        time,
                        candidate: side(candidate),
                        existing: side(stored),
                        existing_entry_id: entry.entry_id.clone(),
                        existing_class_id: entry.class_id.clone(),
                    });
                }
            }
        }
    }

    conflicts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(start: &str, end: &str, subject: &str, teacher: &str) -> Period {
        Period {
            start_time: start.to_string(),
            end_time: end.to_string(),
            subject: subject.to_string(),
            teacher_id: teacher.to_string(),
            room: String::new(),
        }
    }

    fn entry(entry_id: &str, class_id: &str, periods: Vec<Period>) -> StoredEntry {
        StoredEntry {
            entry_id: entry_id.to_string(),
            class_id: class_id.to_string(),
            periods,
        }
    }

    #[test]
    fn touching_endpoints_do_not_conflict() {
        let existing = vec![entry(
            "e1",
            "c1",
            vec![period("08:00", "08:45", "Mathematics", "t1")],
        )];
        let candidates = vec![period("08:45", "09:30", "Physics", "t1")];
        assert!(detect_conflicts("c2", &candidates, &existing).is_empty());
    }

    #[test]
    fn shared_teacher_across_classes_is_one_teacher_conflict() {
        let existing = vec![entry(
            "e1",
            "c1",
            vec![period("09:00", "09:45", "Mathematics", "t1")],
        )];
        let candidates = vec![period("09:30", "10:15", "Physics", "t1")];
        let conflicts = detect_conflicts("c2", &candidates, &existing);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::TeacherConflict);
        assert_eq!(conflicts[0].time, "09:30-09:45");
        assert_eq!(conflicts[0].existing.subject, "Mathematics");
    }

    #[test]
    fn shared_class_different_teacher_is_one_class_conflict() {
        let existing = vec![entry(
            "e1",
            "c1",
            vec![period("09:00", "09:45", "Mathematics", "t1")],
        )];
        let candidates = vec![period("09:15", "10:00", "Biology", "t2")];
        let conflicts = detect_conflicts("c1", &candidates, &existing);
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].kind, ConflictKind::ClassConflict);
        assert_eq!(conflicts[0].time, "09:15-09:45");
    }

    #[test]
    fn shared_teacher_and_class_emits_both() {
        let existing = vec![entry(
            "e1",
            "c1",
            vec![period("09:00", "09:45", "Mathematics", "t1")],
        )];
        let candidates = vec![period("09:00", "09:45", "Mathematics", "t1")];
        let conflicts = detect_conflicts("c1", &candidates, &existing);
        let kinds: Vec<ConflictKind> = conflicts.iter().map(|c| c.kind).collect();
        assert_eq!(conflicts.len(), 2);
        assert!(kinds.contains(&ConflictKind::TeacherConflict));
        assert!(kinds.contains(&ConflictKind::ClassConflict));
    }

    #[test]
    fn detection_is_idempotent() {
        let existing = vec![entry(
            "e1",
            "c1",
            vec![
                period("08:00", "08:45", "Mathematics", "t1"),
                period("09:00", "09:45", "History", "t2"),
            ],
        )];
        let candidates = vec![period("08:30", "09:15", "Physics", "t1")];
        let first = detect_conflicts("c2", &candidates, &existing);
        let second = detect_conflicts("c2", &candidates, &existing);
        let as_json = |v: &[Conflict]| serde_json::to_string(v).expect("serialize");
        assert_eq!(as_json(&first), as_json(&second));
    }

    #[test]
    fn entries_without_periods_are_harmless() {
        let existing = vec![entry("e1", "c1", Vec::new())];
        let candidates = vec![period("08:00", "08:45", "Mathematics", "t1")];
        assert!(detect_conflicts("c1", &candidates, &existing).is_empty());
    }
}
