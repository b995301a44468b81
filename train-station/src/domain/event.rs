//! Observable station events.
//!
//! Every externally visible step of a run is reported as a `StationEvent`.
//! Events are emitted in the order the corresponding state transitions
//! happened, so a consumer can replay a run and check the protocol's
//! guarantees against the stream (no overlapping trains, departures only
//! once boarding completed, no passenger dropped).

use super::station::DepartureRecord;

/// One externally visible step of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum StationEvent {
    /// A new cycle's demand was staged: fresh passengers plus any waiting
    /// from the previous cycle.
    CycleStaged {
        cycle: u64,
        demand: u32,
        capacity: u32,
    },

    /// A train arrived and opened its doors.
    TrainArrived { cycle: u64, capacity: u32 },

    /// One passenger took a seat.
    PassengerBoarded {
        remaining_seats: u32,
        remaining_demand: u32,
    },

    /// The train left; the record settles the cycle's accounting.
    TrainDeparted(DepartureRecord),

    /// Every passenger reached a terminal state; the run is over.
    AllPassengersProcessed { boarded: u32, cancelled: u32 },
}
