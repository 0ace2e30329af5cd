use uuid::Uuid;

use crate::models::{CourseAlert, CourseAttendanceSummary, StatusTier, StudentAlerts};

/// Splits classified summaries into critical and warning alerts, keeping input order.
pub fn generate_alerts(student_id: Uuid, summaries: &[CourseAttendanceSummary]) -> StudentAlerts {
    let mut alerts = StudentAlerts {
        student_id,
        critical: Vec::new(),
        warning: Vec::new(),
    };

    for summary in summaries {
        match summary.tier {
            StatusTier::Critical => alerts.critical.push(course_alert(summary)),
            StatusTier::Warning => alerts.warning.push(course_alert(summary)),
            StatusTier::Optimal | StatusTier::NoData => {}
        }
    }

    alerts
}

fn course_alert(summary: &CourseAttendanceSummary) -> CourseAlert {
    CourseAlert {
        course_id: summary.course_id.clone(),
        policy: summary.policy,
        tier: summary.tier,
        planned: summary.counts.planned,
        absent: summary.counts.absent,
        percentage: summary.display_percentage(),
        absence_percentage: summary.absence_percentage(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::summarize_counts;
    use crate::classify::TierPolicy;
    use crate::models::AttendanceCounts;

    fn summary(course_id: &str, percentage: f64, tier: StatusTier) -> CourseAttendanceSummary {
        CourseAttendanceSummary {
            course_id: course_id.to_string(),
            counts: AttendanceCounts {
                planned: 10,
                present: 6,
                absent: 4,
                late: 0,
                justified: 0,
            },
            effective: 6.0,
            percentage,
            policy: TierPolicy::EffectiveAttendance,
            tier_metric: percentage,
            tier,
        }
    }

    #[test]
    fn partitions_by_tier() {
        let summaries = vec![
            summary("INF-101", 60.0, StatusTier::Critical),
            summary("MAT-200", 75.0, StatusTier::Warning),
            summary("FIS-110", 95.0, StatusTier::Optimal),
            summary("QUI-120", 0.0, StatusTier::NoData),
        ];

        let alerts = generate_alerts(Uuid::nil(), &summaries);
        assert_eq!(alerts.critical.len(), 1);
        assert_eq!(alerts.warning.len(), 1);
        assert_eq!(alerts.total(), 2);
        assert_eq!(alerts.critical[0].course_id, "INF-101");
        assert_eq!(alerts.critical[0].absence_percentage, 40.0);
        assert_eq!(alerts.warning[0].course_id, "MAT-200");
    }

    #[test]
    fn keeps_input_order_within_bucket() {
        let summaries = vec![
            summary("ZOO-300", 65.0, StatusTier::Critical),
            summary("ALG-100", 10.0, StatusTier::Critical),
        ];

        let alerts = generate_alerts(Uuid::nil(), &summaries);
        let ids: Vec<&str> = alerts.critical.iter().map(|a| a.course_id.as_str()).collect();
        assert_eq!(ids, vec!["ZOO-300", "ALG-100"]);
    }

    #[test]
    fn absence_share_alerts_report_the_share_that_drove_the_tier() {
        let counts = AttendanceCounts {
            planned: 10,
            absent: 7,
            late: 3,
            ..AttendanceCounts::default()
        };
        let summaries = vec![summarize_counts("MAT-200", counts, TierPolicy::AbsenceShare)];

        let alerts = generate_alerts(Uuid::nil(), &summaries);
        assert_eq!(alerts.critical.len(), 1);
        assert_eq!(alerts.critical[0].policy, TierPolicy::AbsenceShare);
        assert_eq!(alerts.critical[0].absence_percentage, 70.0);
    }

    #[test]
    fn optimal_courses_raise_nothing() {
        let alerts = generate_alerts(
            Uuid::nil(),
            &[summary("INF-101", 100.0, StatusTier::Optimal)],
        );
        assert!(alerts.is_empty());
    }
}
