pub mod error;
pub mod time_value;
pub mod types;
pub mod valuation;

pub use error::BioBucksError;
pub use types::*;

/// Standard result type for all biobucks operations
pub type BioBucksResult<T> = Result<T, BioBucksError>;
