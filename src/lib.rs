//! Attendance status and justification resolution engine.
//!
//! The engine modules (`aggregate`, `effective`, `classify`, `alerts`,
//! `justification`) are pure functions over borrowed input. `db` and `report`
//! move data in and out of them for the command line tool.

pub mod aggregate;
pub mod alerts;
pub mod classify;
pub mod config;
pub mod db;
pub mod effective;
pub mod error;
pub mod justification;
pub mod models;
pub mod report;

pub use classify::TierPolicy;
pub use error::EngineError;
pub use justification::JustificationBatch;
