use attendance_engine::aggregate::{count_records, summarize_course, summarize_courses};
use attendance_engine::alerts::generate_alerts;
use attendance_engine::classify::classify;
use attendance_engine::effective::{attendance_percentage, effective_attendance};
use attendance_engine::justification::{resolve_batch, within_deadline};
use attendance_engine::models::{
    AttendanceCounts, AttendanceRecord, AttendanceStatus, BatchStatusTier, DeadlineStatus,
    JustificationStatus, StatusTier,
};
use attendance_engine::{EngineError, TierPolicy};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

fn session(course: &str, day: u32, status: AttendanceStatus) -> AttendanceRecord {
    AttendanceRecord {
        student_id: Uuid::nil(),
        course_id: course.to_string(),
        class_date: NaiveDate::from_ymd_opt(2025, 4, day).unwrap(),
        class_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        status,
    }
}

fn mixed_term() -> Vec<AttendanceRecord> {
    use AttendanceStatus::*;
    let pattern = [Present, Late, Absent, Present, Justified, Present, Late, Present];
    let mut records = Vec::new();
    for (index, status) in pattern.iter().enumerate() {
        records.push(session("INF-101", index as u32 + 1, *status));
        let mat_status = if index % 3 == 0 { Absent } else { *status };
        records.push(session("MAT-200", index as u32 + 1, mat_status));
    }
    records
}

fn timestamp(value: &str) -> Option<NaiveDateTime> {
    Some(NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").unwrap())
}

#[test]
fn no_planned_sessions_is_always_no_data() {
    for percentage in [0.0, 50.0, 85.0, 100.0, f64::NAN] {
        assert_eq!(classify(0, percentage), StatusTier::NoData);
    }
}

#[test]
fn classifier_boundaries() {
    assert_eq!(classify(10, 85.0), StatusTier::Optimal);
    assert_eq!(classify(10, 84.99), StatusTier::Warning);
    assert_eq!(classify(10, 70.0), StatusTier::Warning);
    assert_eq!(classify(10, 69.99), StatusTier::Critical);
}

#[test]
fn seven_present_three_late_is_warning() {
    let counts = AttendanceCounts {
        planned: 10,
        present: 7,
        late: 3,
        ..AttendanceCounts::default()
    };

    assert_eq!(effective_attendance(&counts), 8.0);
    assert_eq!(attendance_percentage(&counts), 80.0);
    assert_eq!(TierPolicy::EffectiveAttendance.classify(&counts), StatusTier::Warning);
}

#[test]
fn more_presence_never_lowers_percentage() {
    let planned = 12;
    for late in 0..=4 {
        for justified in 0..=4 {
            let mut previous = -1.0;
            for present in 0..=(planned - late - justified) {
                let counts = AttendanceCounts {
                    planned,
                    present,
                    late,
                    justified,
                    absent: planned - present - late - justified,
                };
                let percentage = attendance_percentage(&counts);
                assert!(percentage >= previous, "dropped at present={present}");
                previous = percentage;
            }
        }
    }
}

#[test]
fn deadline_window_edges() {
    assert_eq!(
        within_deadline(timestamp("2025-01-01T08:00:00"), timestamp("2025-01-03T08:00:00")),
        DeadlineStatus::Within
    );
    assert_eq!(
        within_deadline(timestamp("2025-01-01T08:00:00"), timestamp("2025-01-03T08:01:00")),
        DeadlineStatus::Late
    );
    assert_eq!(
        within_deadline(None, timestamp("2025-01-03T08:00:00")).as_bool(),
        None
    );
}

#[test]
fn batch_resolution_table() {
    use JustificationStatus::*;
    assert_eq!(resolve_batch(&[Approved, Approved]), Ok(BatchStatusTier::Approved));
    assert_eq!(resolve_batch(&[Approved, Rejected]), Ok(BatchStatusTier::Reviewed));
    assert_eq!(resolve_batch(&[Pending, Approved]), Ok(BatchStatusTier::Pending));
    assert!(matches!(resolve_batch(&[]), Err(EngineError::InvalidBatch { .. })));
}

#[test]
fn batch_resolution_ignores_child_order() {
    use JustificationStatus::*;
    let statuses = [Approved, Rejected, Approved, Rejected];
    let mut reversed = statuses;
    reversed.reverse();
    assert_eq!(resolve_batch(&statuses), resolve_batch(&reversed));
}

#[test]
fn repeated_summaries_are_identical() {
    let records = mixed_term();
    let first = summarize_courses(&records, TierPolicy::default());
    let second = summarize_courses(&records, TierPolicy::default());

    assert_eq!(first, second);
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.percentage.to_bits(), b.percentage.to_bits());
    }
}

#[test]
fn shuffled_records_give_the_same_summary() {
    let records = mixed_term();
    let mut reversed = records.clone();
    reversed.reverse();
    let mut interleaved: Vec<AttendanceRecord> = records.iter().step_by(2).cloned().collect();
    interleaved.extend(records.iter().skip(1).step_by(2).cloned());

    let expected = summarize_courses(&records, TierPolicy::default());
    assert_eq!(summarize_courses(&reversed, TierPolicy::default()), expected);
    assert_eq!(summarize_courses(&interleaved, TierPolicy::default()), expected);
}

#[test]
fn counts_always_account_for_planned_sessions() {
    let records = mixed_term();
    for summary in summarize_courses(&records, TierPolicy::default()) {
        assert!(summary.counts.is_consistent());
        assert!(summary.percentage >= 0.0 && summary.percentage <= 100.0);
    }
    assert_eq!(count_records(&records).planned, records.len() as u32);
}

#[test]
fn pipeline_raises_alerts_for_weak_courses() {
    let records = mixed_term();
    let summaries = summarize_courses(&records, TierPolicy::default());
    let alerts = generate_alerts(Uuid::nil(), &summaries);

    // INF-101: 4 present, 2 late, 1 justified of 8 -> 62.5%, critical.
    let inf = summarize_course(
        "INF-101",
        records.iter().filter(|r| r.course_id == "INF-101"),
        TierPolicy::default(),
    );
    assert_eq!(inf.tier, StatusTier::Critical);
    assert_eq!(inf.display_percentage(), 62.5);
    assert_eq!(alerts.critical.len(), 2);
    assert!(alerts.warning.is_empty());
}

#[test]
fn absence_share_pipeline_keeps_its_own_figures() {
    use AttendanceStatus::*;
    let mut records = Vec::new();
    for day in 1..=10 {
        records.push(session("INF-101", day, Late));
        records.push(session("MAT-200", day, if day <= 7 { Absent } else { Late }));
    }

    let summaries = summarize_courses(&records, TierPolicy::AbsenceShare);
    assert_eq!(summaries[0].course_id, "INF-101");
    assert_eq!(summaries[0].tier, StatusTier::Optimal);
    assert_eq!(summaries[0].display_tier_metric(), 0.0);
    assert_eq!(summaries[1].tier, StatusTier::Critical);
    assert_eq!(summaries[1].display_tier_metric(), 70.0);

    let alerts = generate_alerts(Uuid::nil(), &summaries);
    assert_eq!(alerts.critical.len(), 1);
    assert!(alerts.warning.is_empty());
    assert_eq!(alerts.critical[0].course_id, "MAT-200");
    assert_eq!(alerts.critical[0].absence_percentage, 70.0);
}

#[test]
fn concurrent_invocations_agree() {
    let records = mixed_term();
    let expected = summarize_courses(&records, TierPolicy::default());

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| summarize_courses(&records, TierPolicy::default())))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
