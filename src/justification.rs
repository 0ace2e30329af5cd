use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::error::EngineError;
use crate::models::{
    BatchResolution, BatchStatusTier, DeadlineStatus, JustificationRequest, JustificationStatus,
};

pub const COMPLIANCE_WINDOW_HOURS: i64 = 48;

/// Exactly 48h after the class is still compliant; one second more is not.
pub fn within_deadline(
    class_date: Option<NaiveDateTime>,
    submission_date: Option<NaiveDateTime>,
) -> DeadlineStatus {
    let (Some(class_date), Some(submission_date)) = (class_date, submission_date) else {
        return DeadlineStatus::Indeterminate;
    };

    if submission_date - class_date <= Duration::hours(COMPLIANCE_WINDOW_HOURS) {
        DeadlineStatus::Within
    } else {
        DeadlineStatus::Late
    }
}

/// A late child makes the batch late; otherwise any unknown makes it indeterminate.
pub fn batch_deadline<I>(children: I) -> DeadlineStatus
where
    I: IntoIterator<Item = DeadlineStatus>,
{
    let mut status = DeadlineStatus::Within;

    for child in children {
        match child {
            DeadlineStatus::Late => return DeadlineStatus::Late,
            DeadlineStatus::Indeterminate => status = DeadlineStatus::Indeterminate,
            DeadlineStatus::Within => {}
        }
    }

    status
}

/// Derives the aggregate status from the child decisions. Order does not matter.
pub fn resolve_batch(statuses: &[JustificationStatus]) -> Result<BatchStatusTier, EngineError> {
    if statuses.is_empty() {
        return Err(EngineError::InvalidBatch { batch_id: None });
    }

    let (mut pending, mut approved, mut rejected) = (0usize, 0usize, 0usize);
    for status in statuses {
        match status {
            JustificationStatus::Pending => pending += 1,
            JustificationStatus::Approved => approved += 1,
            JustificationStatus::Rejected => rejected += 1,
        }
    }

    let total = statuses.len();
    let aggregate = if pending == total {
        BatchStatusTier::Pending
    } else if approved == total {
        BatchStatusTier::Approved
    } else if rejected == total {
        BatchStatusTier::Rejected
    } else if pending == 0 {
        BatchStatusTier::Reviewed
    } else {
        BatchStatusTier::Pending
    };

    Ok(aggregate)
}

/// Grouped justification covering several absences with one supporting document.
///
/// The aggregate status is not stored; [`JustificationBatch::resolve`] derives it
/// from the current children every time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JustificationBatch {
    pub id: Uuid,
    pub student_id: Uuid,
    children: Vec<JustificationRequest>,
}

impl JustificationBatch {
    pub fn new(
        id: Uuid,
        student_id: Uuid,
        children: Vec<JustificationRequest>,
    ) -> Result<Self, EngineError> {
        if children.is_empty() {
            return Err(EngineError::InvalidBatch { batch_id: Some(id) });
        }

        Ok(Self {
            id,
            student_id,
            children,
        })
    }

    pub fn children(&self) -> &[JustificationRequest] {
        &self.children
    }

    pub fn statuses(&self) -> Vec<JustificationStatus> {
        self.children.iter().map(|child| child.status).collect()
    }

    pub fn add_child(&mut self, child: JustificationRequest) {
        self.children.push(child);
    }

    pub fn approve(
        &mut self,
        attendance_id: Uuid,
        comments: Option<String>,
    ) -> Result<BatchStatusTier, EngineError> {
        self.decide(attendance_id, JustificationStatus::Approved, comments)
    }

    pub fn reject(
        &mut self,
        attendance_id: Uuid,
        comments: Option<String>,
    ) -> Result<BatchStatusTier, EngineError> {
        self.decide(attendance_id, JustificationStatus::Rejected, comments)
    }

    /// Withdraws a still-pending child. The last child cannot be withdrawn.
    pub fn cancel(&mut self, attendance_id: Uuid) -> Result<BatchStatusTier, EngineError> {
        let index = self.position(attendance_id)?;
        let child = &self.children[index];

        if child.status != JustificationStatus::Pending {
            return Err(EngineError::NotPending {
                attendance_id,
                status: child.status,
            });
        }
        if self.children.len() == 1 {
            return Err(EngineError::InvalidBatch {
                batch_id: Some(self.id),
            });
        }

        self.children.remove(index);
        self.aggregate_status()
    }

    pub fn aggregate_status(&self) -> Result<BatchStatusTier, EngineError> {
        resolve_batch(&self.statuses()).map_err(|_| EngineError::InvalidBatch {
            batch_id: Some(self.id),
        })
    }

    pub fn deadline_status(&self) -> DeadlineStatus {
        batch_deadline(
            self.children
                .iter()
                .map(|child| within_deadline(child.class_date, child.submission_date)),
        )
    }

    pub fn resolve(&self) -> Result<BatchResolution, EngineError> {
        let resolution = BatchResolution {
            batch_id: self.id,
            student_id: self.student_id,
            aggregate_status: self.aggregate_status()?,
            within_deadline: self.deadline_status(),
            child_count: self.children.len(),
        };

        debug!(
            batch_id = %resolution.batch_id,
            status = %resolution.aggregate_status,
            deadline = %resolution.within_deadline,
            "resolved justification batch"
        );
        Ok(resolution)
    }

    fn decide(
        &mut self,
        attendance_id: Uuid,
        decision: JustificationStatus,
        comments: Option<String>,
    ) -> Result<BatchStatusTier, EngineError> {
        let index = self.position(attendance_id)?;
        let child = &mut self.children[index];
        child.status = decision;
        if comments.is_some() {
            child.review_comments = comments;
        }

        self.aggregate_status()
    }

    fn position(&self, attendance_id: Uuid) -> Result<usize, EngineError> {
        self.children
            .iter()
            .position(|child| child.attendance_id == attendance_id)
            .ok_or(EngineError::UnknownAttendance {
                batch_id: self.id,
                attendance_id,
            })
    }
}
