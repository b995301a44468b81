//! Protocol error types.
//!
//! Refusals are expected outcomes of a single boarding attempt and are
//! handled locally by the actor that saw them. Protocol errors are terminal:
//! an invariant violation stops further mutation of the shared station, and
//! a cancellation is the final word for an actor interrupted by shutdown.

/// Expected, recoverable refusal of one boarding attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BoardingRefusal {
    /// The present train has no free seats left.
    #[error("no free seats on the present train")]
    NoCapacity,

    /// No passenger of the current cycle still needs a seat.
    #[error("no remaining demand this cycle")]
    NoDemand,
}

/// Terminal protocol failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// A station invariant was broken. This is a programming error, not a
    /// recoverable condition; the offending cycle must stop mutating state.
    #[error("station invariant violated: {0}")]
    InvariantViolation(&'static str),

    /// Shutdown was requested while the actor was blocked.
    #[error("cancelled by shutdown")]
    Cancelled,
}
