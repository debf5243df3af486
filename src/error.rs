use crate::schema::AnalysisStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReconciliationError {
    #[error("Invalid period {year}-{month:02}: month must be between 1 and 12")]
    InvalidPeriod { year: i32, month: u32 },

    #[error("Invalid period range: {start} is after {end}")]
    InvalidRange { start: String, end: String },

    #[error("Period {year}-{month:02} is {status:?} and cannot be regenerated; reopen it first")]
    PeriodLocked {
        year: i32,
        month: u32,
        status: AnalysisStatus,
    },

    #[error("No analysis found for period {year}-{month:02}")]
    PeriodNotFound { year: i32, month: u32 },

    #[error("Invalid status transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: AnalysisStatus,
        to: AnalysisStatus,
    },

    #[error("Invalid category map: {0}")]
    InvalidCategoryMap(String),

    #[error("Cannot value mortality: {0}")]
    EmptyLot(String),

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ReconciliationError>;
