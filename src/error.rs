use thiserror::Error;

/// Rejected caller input. Messages name the offending flag so CLI and HTTP
/// callers see which value to fix.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InputError {
    #[error("{flag} must be a finite number")]
    NonFinite { flag: &'static str },

    #[error("{flag} must be > -100")]
    RateTooLow { flag: &'static str },

    #[error("{flag} must be >= 0")]
    Negative { flag: &'static str },

    #[error("{flag} must be between 0 and {max}")]
    OutOfRange { flag: &'static str, max: f64 },

    #[error("{flag} must be between {min} and {max}")]
    OutsideBounds {
        flag: &'static str,
        min: f64,
        max: f64,
    },

    #[error("{flag} must be > 0")]
    NotPositive { flag: &'static str },

    #[error("--retirement-age must be > --current-age")]
    RetirementNotAfterCurrentAge,

    #[error("Invalid API JSON payload: {0}")]
    Payload(String),

    #[error("Failed to write JSON output: {0}")]
    Output(String),
}

pub type InputResult<T> = Result<T, InputError>;
