//! Error types for the workflow engine.
//!
//! Callers branch on these variants: validation-class errors are user-facing
//! and never accompany a state change; integrity-class errors indicate data
//! corruption and halt the operation instead of guessing a recovery.

use thiserror::Error;

use crate::models::stage::Stage;

/// Result type alias for workflow operations.
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Main error type for all workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Order was created with no true product-type flag.
    #[error("invalid flag set: at least one of PRINT/PRESS/CUTTING/DTF/SEWING must be set")]
    InvalidFlagSet,

    /// The order's current stage is not in its applicable sequence.
    /// Indicates corrupted data or flags changed after creation; fatal.
    #[error("order {order_id}: stage {stage} is not applicable for this order's flags")]
    IllegalState { order_id: String, stage: Stage },

    /// Attempt to advance an order already in the terminal stage.
    #[error("order {order_id} has already completed production")]
    TerminalState { order_id: String },

    /// A backward transition other than the explicit return-to-design.
    #[error("transition {from} -> {to} is not allowed")]
    DisallowedTransition { from: Stage, to: Stage },

    /// Input or barcode-specification validation failed. State unchanged.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Unknown barcode, request, or order id.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Attempt to re-decide an already approved or rejected ink request.
    #[error("ink request {request_id} has already been decided")]
    AlreadyDecided { request_id: String },

    /// Attempt to consume a stock item that was already consumed.
    #[error("stock item {barcode_id} has already been consumed")]
    AlreadyConsumed { barcode_id: String },

    /// Concurrent write race on order state or a stock item.
    /// Caller should reload and retry once.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Transient backend failure (storage unavailable, I/O error).
    #[error("backend failure: {0}")]
    Backend(String),
}

impl WorkflowError {
    /// Stable error code for programmatic handling at the API layer.
    pub fn code(&self) -> &'static str {
        match self {
            WorkflowError::InvalidFlagSet => "INVALID_FLAG_SET",
            WorkflowError::IllegalState { .. } => "ILLEGAL_STATE",
            WorkflowError::TerminalState { .. } => "TERMINAL_STATE",
            WorkflowError::DisallowedTransition { .. } => "DISALLOWED_TRANSITION",
            WorkflowError::Validation(_) => "VALIDATION",
            WorkflowError::NotFound { .. } => "NOT_FOUND",
            WorkflowError::AlreadyDecided { .. } => "ALREADY_DECIDED",
            WorkflowError::AlreadyConsumed { .. } => "ALREADY_CONSUMED",
            WorkflowError::Conflict(_) => "CONFLICT",
            WorkflowError::Backend(_) => "BACKEND",
        }
    }

    /// Whether the retry policy may re-attempt the failed call.
    ///
    /// Only transient backend failures qualify. Validation failures and
    /// conflicts are definitive answers from the domain, not outages.
    pub fn is_transient(&self) -> bool {
        matches!(self, WorkflowError::Backend(_))
    }
}
