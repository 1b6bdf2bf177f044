// ============================================================================
// spark-properties - Model Errors
// Recoverable failures of the checked VecModel operations
// ============================================================================

use thiserror::Error;

/// Returned by the checked [`VecModel`](super::VecModel) operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelError {
    #[error("row index {index} out of range for model with {len} rows")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("insertion index {index} out of range for model with {len} rows")]
    InsertOutOfRange { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, ModelError>;
