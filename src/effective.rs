use crate::models::AttendanceCounts;

/// A late arrival or a justified absence counts as one third of a presence.
pub const PARTIAL_DIVISOR: f64 = 3.0;

/// `present + late/3 + justified/3`. Absences contribute nothing.
pub fn effective_attendance(counts: &AttendanceCounts) -> f64 {
    counts.present as f64
        + counts.late as f64 / PARTIAL_DIVISOR
        + counts.justified as f64 / PARTIAL_DIVISOR
}

/// Unrounded percentage of planned sessions effectively attended.
pub fn attendance_percentage(counts: &AttendanceCounts) -> f64 {
    if counts.planned == 0 {
        return 0.0;
    }

    effective_attendance(counts) / counts.planned as f64 * 100.0
}

/// Share of planned sessions that were plain absences, unrounded.
pub fn absence_share(counts: &AttendanceCounts) -> f64 {
    if counts.planned == 0 {
        return 0.0;
    }

    counts.absent as f64 / counts.planned as f64 * 100.0
}

pub fn round_percentage(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
