pub mod error;
pub mod fiscal_calendar;
pub mod forward_return;
pub mod time_value;
pub mod types;

#[cfg(feature = "screening")]
pub mod screening;

pub use error::ForwardReturnError;
pub use types::*;

/// Standard result type for all forward-return operations
pub type ForwardReturnResult<T> = Result<T, ForwardReturnError>;
