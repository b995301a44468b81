//! Passenger lifecycle: wait for a train, board it or defer to the next.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::domain::ProtocolError;
use crate::protocol::Station;

/// Identity of one passenger, assigned in spawn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct PassengerId(pub u32);

impl fmt::Display for PassengerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "passenger#{}", self.0)
    }
}

/// Terminal state of one passenger actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassengerOutcome {
    /// Seated on some train, this cycle or a later one.
    Boarded,
    /// Shutdown arrived before a seat did.
    Cancelled,
}

/// Drive one passenger to a terminal state.
///
/// Cancellation is an expected outcome, not a failure; only an invariant
/// violation propagates as an error.
pub async fn run_passenger(
    station: Arc<Station>,
    id: PassengerId,
) -> Result<PassengerOutcome, ProtocolError> {
    match station.board().await {
        Ok(()) => {
            debug!(%id, "seated");
            Ok(PassengerOutcome::Boarded)
        }
        Err(ProtocolError::Cancelled) => {
            debug!(%id, "cancelled while waiting");
            Ok(PassengerOutcome::Cancelled)
        }
        Err(err) => Err(err),
    }
}
