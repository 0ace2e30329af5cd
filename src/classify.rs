//! Status tier tables.
//!
//! Two tables exist in the portal and they are kept apart on purpose:
//! [`TierPolicy::EffectiveAttendance`] is the canonical one used for course and
//! sprint history, [`TierPolicy::AbsenceShare`] is the dashboard's raw-absence
//! banding. Callers choose one by name.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::effective;
use crate::models::{AttendanceCounts, StatusTier};

pub const OPTIMAL_THRESHOLD: f64 = 85.0;
pub const WARNING_THRESHOLD: f64 = 70.0;

pub const ABSENCE_WARNING_THRESHOLD: f64 = 10.0;
pub const ABSENCE_CRITICAL_THRESHOLD: f64 = 30.0;

/// Canonical classifier. Lower bounds are inclusive.
pub fn classify(planned: u32, percentage: f64) -> StatusTier {
    if planned == 0 || !percentage.is_finite() {
        return StatusTier::NoData;
    }

    if percentage >= OPTIMAL_THRESHOLD {
        StatusTier::Optimal
    } else if percentage >= WARNING_THRESHOLD {
        StatusTier::Warning
    } else {
        StatusTier::Critical
    }
}

/// Dashboard banding over the share of plain absences:
/// `< 10` optimal, `10..30` warning, `>= 30` critical.
pub fn classify_absence_share(planned: u32, absence_percentage: f64) -> StatusTier {
    if planned == 0 || !absence_percentage.is_finite() {
        return StatusTier::NoData;
    }

    if absence_percentage < ABSENCE_WARNING_THRESHOLD {
        StatusTier::Optimal
    } else if absence_percentage < ABSENCE_CRITICAL_THRESHOLD {
        StatusTier::Warning
    } else {
        StatusTier::Critical
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TierPolicy {
    #[default]
    EffectiveAttendance,
    AbsenceShare,
}

impl TierPolicy {
    /// The unrounded figure this policy compares against its thresholds.
    pub fn metric(&self, counts: &AttendanceCounts) -> f64 {
        match self {
            TierPolicy::EffectiveAttendance => effective::attendance_percentage(counts),
            TierPolicy::AbsenceShare => effective::absence_share(counts),
        }
    }

    pub fn classify(&self, counts: &AttendanceCounts) -> StatusTier {
        let metric = self.metric(counts);
        match self {
            TierPolicy::EffectiveAttendance => classify(counts.planned, metric),
            TierPolicy::AbsenceShare => classify_absence_share(counts.planned, metric),
        }
    }

    pub fn metric_label(&self) -> &'static str {
        match self {
            TierPolicy::EffectiveAttendance => "effective",
            TierPolicy::AbsenceShare => "absent",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TierPolicy::EffectiveAttendance => "effective",
            TierPolicy::AbsenceShare => "absence-share",
        }
    }
}

impl FromStr for TierPolicy {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "effective" | "effective-attendance" => Ok(TierPolicy::EffectiveAttendance),
            "absence-share" | "absence" => Ok(TierPolicy::AbsenceShare),
            other => anyhow::bail!("unknown tier policy {other:?} (expected effective or absence-share)"),
        }
    }
}
