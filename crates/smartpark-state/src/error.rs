//! Error types for the SmartPark state store.
//!
//! A missing floor, slot or record is not an error at this layer: lookups
//! return `Ok(None)` and the service decides what absence means.

use thiserror::Error;

/// Result type alias for state store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Failures of the redb backend or of the JSON value encoding.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open parking database: {0}")]
    Open(String),

    #[error("redb transaction failed: {0}")]
    Transaction(String),

    #[error("failed to open table: {0}")]
    Table(String),

    #[error("failed to read from store: {0}")]
    Read(String),

    #[error("failed to write to store: {0}")]
    Write(String),

    #[error("failed to encode value: {0}")]
    Serialize(String),

    /// A stored value no longer matches its type, e.g. after a schema change.
    #[error("failed to decode stored value: {0}")]
    Deserialize(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_step() {
        let err = StateError::Deserialize("missing field `slotNumber`".to_string());
        assert_eq!(
            err.to_string(),
            "failed to decode stored value: missing field `slotNumber`"
        );
    }
}
