// libs/reconciler-cell/src/models.rs
use appointment_cell::models::Appointment;

/// What a booking submission came back as, from the operator's point of view.
#[derive(Debug, Clone)]
pub enum BookingOutcome {
    /// The atomic reservation committed; the record is ours.
    Booked(Appointment),
    /// Another caller won the slot. Routine under concurrency; the slot has
    /// already been dropped from the local view and a refresh kicked off.
    SlotTaken,
    /// A precondition failed. Actionable message, never retried automatically.
    Rejected(String),
    /// The submission timed out; the outcome on the server is unknown and
    /// must be re-verified before any resubmission.
    Unknown,
    /// Unrecoverable failure; the attempt is abandoned.
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Request timed out")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected response: {0}")]
    Unexpected(String),
}
