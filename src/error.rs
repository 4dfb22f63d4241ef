use thiserror::Error;

use crate::config::SpMethod;

/// Fatal error kinds surfaced to the caller.
///
/// Recoverable search events (an infeasible child node, the wall-clock budget
/// running out, the node cap) are handled inside the driver and never appear
/// here.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or out-of-range input; the instance cannot be solved.
    #[error("bad instance: {0}")]
    BadInstance(String),

    /// The LP/MIP backend returned a status the solver cannot interpret.
    #[error("solver backend failure: {0}")]
    Backend(String),

    /// A pricing backend that ignores arc constraints was asked to price at a
    /// node that carries them.
    #[error("pricing backend {method:?} cannot honor arc branching constraints (node {node})")]
    InvalidBackend {
        /// The offending backend.
        method: SpMethod,
        /// The node whose constraint set the backend would have ignored.
        node: usize,
    },
}

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;
