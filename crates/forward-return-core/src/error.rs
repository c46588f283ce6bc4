use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForwardReturnError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Convergence failure: {function} {cause} after {iterations} iterations (npv: {last_npv})")]
    ConvergenceFailure {
        function: String,
        cause: String,
        iterations: u32,
        last_npv: Decimal,
    },

    #[error("Rate out of bounds: {function} stepped to {rate} after {iterations} iterations")]
    RateOutOfBounds {
        function: String,
        rate: Decimal,
        iterations: u32,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Date error: {0}")]
    DateError(String),
}
