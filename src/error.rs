use thiserror::Error;

#[derive(Error, Debug)]
pub enum ForecastError {
    #[error("Invalid month key: {0}")]
    InvalidMonthKey(String),

    #[error("Invalid period: {0}")]
    InvalidPeriod(String),

    #[error("Invalid fiscal year end month {0}: must be between 1 and 12")]
    InvalidFiscalYearEndMonth(u32),

    #[error("Invalid iteration cap {0}: at least one sweep is required")]
    InvalidIterationCap(usize),

    #[error("Invalid trend threshold {0}: must be a finite, non-negative percentage")]
    InvalidThreshold(f64),

    #[error("No line with id '{0}'")]
    UnknownLine(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ForecastError>;
