use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::classify::TierPolicy;
use crate::effective::round_percentage;
use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    Justified,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Justified => "justified",
        }
    }
}

impl FromStr for AttendanceStatus {
    type Err = EngineError;

    /// Accepts the long names as well as the single-letter portal codes
    /// (`P`, `T`/`L`, `A`, `J`).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "present" | "p" => Ok(AttendanceStatus::Present),
            "late" | "l" | "t" => Ok(AttendanceStatus::Late),
            "absent" | "a" => Ok(AttendanceStatus::Absent),
            "justified" | "j" => Ok(AttendanceStatus::Justified),
            _ => Err(EngineError::UnknownStatusCode(value.to_string())),
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One student's attendance at one class session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub student_id: Uuid,
    pub course_id: String,
    pub class_date: NaiveDate,
    pub class_time: NaiveTime,
    pub status: AttendanceStatus,
}

impl AttendanceRecord {
    pub fn class_start(&self) -> NaiveDateTime {
        self.class_date.and_time(self.class_time)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceCounts {
    pub planned: u32,
    pub present: u32,
    pub absent: u32,
    pub late: u32,
    pub justified: u32,
}

impl AttendanceCounts {
    pub fn record(&mut self, status: AttendanceStatus) {
        self.planned += 1;
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Late => self.late += 1,
            AttendanceStatus::Absent => self.absent += 1,
            AttendanceStatus::Justified => self.justified += 1,
        }
    }

    pub fn is_consistent(&self) -> bool {
        self.present + self.absent + self.late + self.justified == self.planned
    }
}

/// Ordered from best to worst; `NoData` sorts last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusTier {
    Optimal,
    Warning,
    Critical,
    NoData,
}

impl StatusTier {
    pub fn label(&self) -> &'static str {
        match self {
            StatusTier::Optimal => "OPTIMAL",
            StatusTier::Warning => "WARNING",
            StatusTier::Critical => "CRITICAL",
            StatusTier::NoData => "NO_DATA",
        }
    }
}

impl fmt::Display for StatusTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseAttendanceSummary {
    pub course_id: String,
    pub counts: AttendanceCounts,
    pub effective: f64,
    /// Full precision; use [`CourseAttendanceSummary::display_percentage`] for output.
    pub percentage: f64,
    /// Policy that assigned `tier`.
    pub policy: TierPolicy,
    /// Full-precision figure `policy` classified; effective attendance or absence share.
    pub tier_metric: f64,
    pub tier: StatusTier,
}

impl CourseAttendanceSummary {
    pub fn display_percentage(&self) -> f64 {
        round_percentage(self.percentage)
    }

    pub fn display_tier_metric(&self) -> f64 {
        round_percentage(self.tier_metric)
    }

    /// Absence figure consistent with the tier: the inverse of effective
    /// attendance, or the raw absence share when that drove the tier.
    pub fn absence_percentage(&self) -> f64 {
        match self.policy {
            TierPolicy::EffectiveAttendance => round_percentage(100.0 - self.percentage),
            TierPolicy::AbsenceShare => round_percentage(self.tier_metric),
        }
    }
}

/// Inclusive date window, e.g. a two-week sprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprint {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintSummary {
    pub sprint: Sprint,
    pub courses: Vec<CourseAttendanceSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseAlert {
    pub course_id: String,
    pub policy: TierPolicy,
    pub tier: StatusTier,
    pub planned: u32,
    pub absent: u32,
    pub percentage: f64,
    pub absence_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentAlerts {
    pub student_id: Uuid,
    pub critical: Vec<CourseAlert>,
    pub warning: Vec<CourseAlert>,
}

impl StudentAlerts {
    pub fn is_empty(&self) -> bool {
        self.critical.is_empty() && self.warning.is_empty()
    }

    pub fn total(&self) -> usize {
        self.critical.len() + self.warning.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JustificationStatus {
    Pending,
    Approved,
    Rejected,
}

impl JustificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JustificationStatus::Pending => "pending",
            JustificationStatus::Approved => "approved",
            JustificationStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for JustificationStatus {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(JustificationStatus::Pending),
            "approved" => Ok(JustificationStatus::Approved),
            "rejected" => Ok(JustificationStatus::Rejected),
            _ => Err(EngineError::UnknownStatusCode(value.to_string())),
        }
    }
}

impl fmt::Display for JustificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decision on one absence inside a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JustificationRequest {
    pub id: Uuid,
    pub attendance_id: Uuid,
    pub status: JustificationStatus,
    pub class_date: Option<NaiveDateTime>,
    pub submission_date: Option<NaiveDateTime>,
    pub review_comments: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatusTier {
    Pending,
    Approved,
    Rejected,
    Reviewed,
}

impl BatchStatusTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatusTier::Pending => "pending",
            BatchStatusTier::Approved => "approved",
            BatchStatusTier::Rejected => "rejected",
            BatchStatusTier::Reviewed => "reviewed",
        }
    }
}

impl fmt::Display for BatchStatusTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeadlineStatus {
    Within,
    Late,
    Indeterminate,
}

impl DeadlineStatus {
    /// `None` when compliance cannot be determined.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DeadlineStatus::Within => Some(true),
            DeadlineStatus::Late => Some(false),
            DeadlineStatus::Indeterminate => None,
        }
    }
}

impl fmt::Display for DeadlineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DeadlineStatus::Within => "within deadline",
            DeadlineStatus::Late => "late",
            DeadlineStatus::Indeterminate => "indeterminate",
        };
        f.write_str(label)
    }
}

/// Derived view of a batch. Never stored by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResolution {
    pub batch_id: Uuid,
    pub student_id: Uuid,
    pub aggregate_status: BatchStatusTier,
    pub within_deadline: DeadlineStatus,
    pub child_count: usize,
}
