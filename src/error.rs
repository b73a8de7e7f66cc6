use thiserror::Error;

use crate::services::StoreError;

/// Errors that abort a matching invocation
///
/// There is no partial-success mode: any of these rolls back the unit of
/// work that was open when it was raised.
#[derive(Debug, Error)]
pub enum MatchingError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cannot decode {entity} {id}: field `{field}` has invalid value {value:?}")]
    Decode {
        entity: &'static str,
        id: String,
        field: &'static str,
        value: String,
    },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Solver error: {0}")]
    Solver(String),
}

impl MatchingError {
    pub fn decode(
        entity: &'static str,
        id: &str,
        field: &'static str,
        value: impl Into<String>,
    ) -> Self {
        MatchingError::Decode {
            entity,
            id: id.to_string(),
            field,
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MatchingError>;
