use thiserror::Error;
use uuid::Uuid;

use crate::models::JustificationStatus;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("justification batch has no attendance details (batch {batch_id:?})")]
    InvalidBatch { batch_id: Option<Uuid> },
    #[error("attendance {attendance_id} is not part of batch {batch_id}")]
    UnknownAttendance { batch_id: Uuid, attendance_id: Uuid },
    #[error("justification for attendance {attendance_id} is already {status}")]
    NotPending {
        attendance_id: Uuid,
        status: JustificationStatus,
    },
    #[error("unknown status code: {0:?}")]
    UnknownStatusCode(String),
}
