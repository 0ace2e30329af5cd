use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use tracing::debug;
use uuid::Uuid;

use crate::classify::TierPolicy;
use crate::effective;
use crate::models::{
    AttendanceCounts, AttendanceRecord, CourseAttendanceSummary, Sprint, SprintSummary,
};

/// Raw counts for a set of records. Planned sessions are the records themselves.
pub fn count_records<'a, I>(records: I) -> AttendanceCounts
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    records
        .into_iter()
        .fold(AttendanceCounts::default(), |mut counts, record| {
            counts.record(record.status);
            counts
        })
}

pub fn records_for_student(
    records: &[AttendanceRecord],
    student_id: Uuid,
) -> Vec<&AttendanceRecord> {
    records
        .iter()
        .filter(|record| record.student_id == student_id)
        .collect()
}

/// First day of a trailing window of `since_days` days ending at `today`.
pub fn window_start(today: NaiveDate, since_days: i64) -> NaiveDate {
    today - Duration::days(since_days.max(1))
}

/// Earliest date whose records are needed so every sprint is summarized in full,
/// including sprints that began before `since`.
pub fn history_start(since: NaiveDate, sprints: &[Sprint]) -> NaiveDate {
    sprints
        .iter()
        .map(|sprint| sprint.start)
        .fold(since, Ord::min)
}

/// Records whose class date falls within `start..=end`.
pub fn in_window<'a, I>(records: I, start: NaiveDate, end: NaiveDate) -> Vec<&'a AttendanceRecord>
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    records
        .into_iter()
        .filter(|record| record.class_date >= start && record.class_date <= end)
        .collect()
}

/// Groups by course id. `BTreeMap` keeps the output independent of input order.
pub fn group_by_course<'a, I>(records: I) -> BTreeMap<&'a str, Vec<&'a AttendanceRecord>>
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    let mut groups: BTreeMap<&str, Vec<&AttendanceRecord>> = BTreeMap::new();

    for record in records {
        groups
            .entry(record.course_id.as_str())
            .or_default()
            .push(record);
    }

    groups
}

pub fn summarize_counts(
    course_id: &str,
    counts: AttendanceCounts,
    policy: TierPolicy,
) -> CourseAttendanceSummary {
    CourseAttendanceSummary {
        course_id: course_id.to_string(),
        counts,
        effective: effective::effective_attendance(&counts),
        percentage: effective::attendance_percentage(&counts),
        policy,
        tier_metric: policy.metric(&counts),
        tier: policy.classify(&counts),
    }
}

pub fn summarize_course<'a, I>(
    course_id: &str,
    records: I,
    policy: TierPolicy,
) -> CourseAttendanceSummary
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    summarize_counts(course_id, count_records(records), policy)
}

/// One summary per course, ordered by course id.
pub fn summarize_courses<'a, I>(records: I, policy: TierPolicy) -> Vec<CourseAttendanceSummary>
where
    I: IntoIterator<Item = &'a AttendanceRecord>,
{
    let summaries: Vec<CourseAttendanceSummary> = group_by_course(records)
        .into_iter()
        .map(|(course_id, course_records)| summarize_course(course_id, course_records, policy))
        .collect();

    debug!(courses = summaries.len(), policy = policy.name(), "summarized courses");
    summaries
}

/// Per-course summaries for each sprint, in the order the sprints were given.
pub fn summarize_sprints(
    records: &[AttendanceRecord],
    sprints: &[Sprint],
    policy: TierPolicy,
) -> Vec<SprintSummary> {
    sprints
        .iter()
        .map(|sprint| SprintSummary {
            sprint: sprint.clone(),
            courses: summarize_courses(in_window(records, sprint.start, sprint.end), policy),
        })
        .collect()
}
