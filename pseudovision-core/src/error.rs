use thiserror::Error;

/// Errors surfaced by the playout build engine.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The playout references no schedule, or the schedule has zero
    /// slots. Non-fatal: the build returns without mutating anything.
    #[error("playout has no schedule or the schedule has no slots")]
    NoSchedule,

    /// A referenced collection or item could not be loaded. The offending
    /// slot produces no events; the cursor still advances.
    #[error("failed to resolve collection or item: {0}")]
    ResolutionFailure(String),

    /// Data integrity error: a slot names a fill mode the dispatcher
    /// doesn't recognize. Logged; slot skipped without cursor advance.
    #[error("unknown fill mode on slot {slot_id}: {mode}")]
    UnknownFillMode { slot_id: String, mode: String },

    /// Database error during reap/insert/update. The whole build aborts.
    #[error("transaction failed: {0}")]
    TransactionFailure(#[from] sqlx::Error),

    /// An internal invariant (e.g. `finish_at > start_at`) was violated.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error(transparent)]
    Model(#[from] pseudovision_model::ModelError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
