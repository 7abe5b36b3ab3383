use thiserror::Error;

#[derive(Debug, Error)]
pub enum BioBucksError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unresolved development stage: '{label}' does not match any known stage")]
    UnresolvedStage { label: String },

    #[error("Financial impossibility: {0}")]
    FinancialImpossibility(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl BioBucksError {
    /// Arithmetic that left the 96-bit decimal range.
    pub(crate) fn overflow(context: impl std::fmt::Display) -> Self {
        BioBucksError::FinancialImpossibility(format!("{context} exceeds the decimal range"))
    }

    pub(crate) fn negative(field: &str) -> Self {
        BioBucksError::InvalidInput {
            field: field.into(),
            reason: "must not be negative".into(),
        }
    }
}

impl From<serde_json::Error> for BioBucksError {
    fn from(e: serde_json::Error) -> Self {
        BioBucksError::SerializationError(e.to_string())
    }
}
