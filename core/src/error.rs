use thiserror::Error;

/// Engine error taxonomy.
///
/// Ordinary missing financial data is NOT an error — it is `None` and
/// flows through every downstream formula. Only structurally invalid
/// input (wrong shape, wrong key set) or storage trouble surfaces here.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown driver key '{key}' in {context}")]
    UnknownDriver { key: String, context: String },

    #[error("Unknown {field} '{value}' in {context}")]
    UnknownField {
        field: &'static str,
        value: String,
        context: String,
    },

    #[error("Period '{period}' is missing driver '{key}' (missing data must be null, not omitted)")]
    MissingDriver { period: String, key: String },

    #[error("Driver series is empty")]
    EmptySeries,

    #[error("Series length mismatch: reference has {reference} periods, comparison has {comparison}")]
    LengthMismatch {
        reference: usize,
        comparison: usize,
    },

    #[error("Run '{run_id}' already stored with different content")]
    RunConflict { run_id: String },

    #[error("Run '{run_id}' not found")]
    RunNotFound { run_id: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
