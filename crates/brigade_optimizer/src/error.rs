use thiserror::Error;

use crate::store::StoreError;

/// Failures the facade surfaces to its caller. Everything else degrades
/// inside the run (see the validation manifest and `RunStatus`).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The deadline was crossed after cluster solving had finished; there
    /// is no partial result worth returning at that point.
    #[error("deadline exceeded during stitching")]
    DeadlineExceeded,

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Invariant violation; a bug, not an input problem.
    #[error("internal: {0}")]
    Internal(String),
}
