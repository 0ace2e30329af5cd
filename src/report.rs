use std::fmt::Write;

use chrono::NaiveDate;

use crate::classify::TierPolicy;
use crate::models::{
    BatchResolution, CourseAlert, CourseAttendanceSummary, SprintSummary, StudentAlerts,
};

pub struct ReportInput<'a> {
    pub student_label: &'a str,
    pub policy_name: &'a str,
    pub cutoff: NaiveDate,
    pub courses: &'a [CourseAttendanceSummary],
    pub alerts: &'a StudentAlerts,
    pub sprints: &'a [SprintSummary],
    pub batches: &'a [BatchResolution],
}

/// Leads with the figure that decided the tier.
pub fn format_summary_line(summary: &CourseAttendanceSummary) -> String {
    format!(
        "{}: {:.2}% {} ({:.2} effective of {} sessions; {} present, {} late, {} justified, {} absent) [{}]",
        summary.course_id,
        summary.display_tier_metric(),
        summary.policy.metric_label(),
        summary.effective,
        summary.counts.planned,
        summary.counts.present,
        summary.counts.late,
        summary.counts.justified,
        summary.counts.absent,
        summary.tier
    )
}

pub fn format_alert_line(alert: &CourseAlert) -> String {
    match alert.policy {
        TierPolicy::EffectiveAttendance => format!(
            "{}: {} of {} sessions missed, {:.2}% absence ({:.2}% effective attendance)",
            alert.course_id, alert.absent, alert.planned, alert.absence_percentage, alert.percentage
        ),
        TierPolicy::AbsenceShare => format!(
            "{}: {} of {} sessions missed, {:.2}% absence share",
            alert.course_id, alert.absent, alert.planned, alert.absence_percentage
        ),
    }
}

pub fn format_batch_line(batch: &BatchResolution) -> String {
    format!(
        "{}: {} across {} absences, submission {}",
        batch.batch_id, batch.aggregate_status, batch.child_count, batch.within_deadline
    )
}

pub fn build_report(input: &ReportInput<'_>) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Attendance Report");
    let _ = writeln!(
        output,
        "Generated for {} (classes since {}, {} policy)",
        input.student_label, input.cutoff, input.policy_name
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Courses");

    if input.courses.is_empty() {
        let _ = writeln!(output, "No attendance recorded for this window.");
    } else {
        let _ = writeln!(output, "| Course | Planned | Effective | Tier metric | Status |");
        let _ = writeln!(output, "|---|---|---|---|---|");
        for summary in input.courses {
            let _ = writeln!(
                output,
                "| {} | {} | {:.2} | {:.2}% {} | {} |",
                summary.course_id,
                summary.counts.planned,
                summary.effective,
                summary.display_tier_metric(),
                summary.policy.metric_label(),
                summary.tier
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Alerts");

    if input.alerts.is_empty() {
        let _ = writeln!(output, "No courses below the optimal tier.");
    } else {
        for alert in input.alerts.critical.iter() {
            let _ = writeln!(output, "- CRITICAL {}", format_alert_line(alert));
        }
        for alert in input.alerts.warning.iter() {
            let _ = writeln!(output, "- WARNING {}", format_alert_line(alert));
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Sprint History");

    if input.sprints.is_empty() {
        let _ = writeln!(output, "No sprints defined for this window.");
    } else {
        for sprint in input.sprints {
            let _ = writeln!(
                output,
                "### {} ({} to {})",
                sprint.sprint.name, sprint.sprint.start, sprint.sprint.end
            );
            if sprint.courses.is_empty() {
                let _ = writeln!(output, "No sessions in this sprint.");
            }
            for summary in sprint.courses.iter() {
                let _ = writeln!(output, "- {}", format_summary_line(summary));
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Justification Requests");

    if input.batches.is_empty() {
        let _ = writeln!(output, "No justification requests submitted.");
    } else {
        for batch in input.batches {
            let _ = writeln!(output, "- {}", format_batch_line(batch));
        }
    }

    output
}
