use thiserror::Error;

/// Crate-wide error type.
///
/// Schema-resolution failures (`VariableNotFound`, `NotGeoreferenced`) are
/// non-retryable: the extraction aborts before any cell is visited. Per-cell
/// data problems are never surfaced here — they are absorbed by the scan and
/// only counted for diagnostics.
#[derive(Error, Debug)]
pub enum EnvgridError {
    #[error("Variable '{0}' not found in dataset '{1}'")]
    VariableNotFound(String, String),

    #[error("Variable '{0}' is not georeferenced in dataset '{1}'")]
    NotGeoreferenced(String, String),

    #[error("Failed to read variable '{0}': {1}")]
    Read(String, String),

    #[error("Can't parse time units '{0}' for dataset '{1}'")]
    InvalidTimeUnits(String, String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Extraction cancelled")]
    Cancelled,

    #[error("Background load task failed: {0}")]
    TaskFailed(String),
}

impl PartialEq for EnvgridError {
    fn eq(&self, other: &Self) -> bool {
        use EnvgridError::*;
        match (self, other) {
            (VariableNotFound(a, b), VariableNotFound(c, d)) => a == c && b == d,
            (NotGeoreferenced(a, b), NotGeoreferenced(c, d)) => a == c && b == d,
            (Read(a, b), Read(c, d)) => a == c && b == d,
            (InvalidTimeUnits(a, b), InvalidTimeUnits(c, d)) => a == c && b == d,
            // Not comparable beyond the variant itself
            (IoError(_), IoError(_)) => true,
            (Cancelled, Cancelled) => true,
            (TaskFailed(a), TaskFailed(b)) => a == b,
            _ => false,
        }
    }
}
