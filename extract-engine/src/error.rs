//! FILENAME: extract-engine/src/error.rs

use cube::CubeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    /// A string or index field lookup matched nothing. Always raised;
    /// predicate lookups miss recoverably instead (`Dataset::field_matching`).
    #[error("field not found: {0}")]
    FieldNotFound(String),

    #[error("unknown reducer: {0}")]
    UnknownReducer(String),

    #[error("invalid extraction config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Cube(#[from] CubeError),
}
