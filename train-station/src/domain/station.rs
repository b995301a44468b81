//! Station state and the boarding-cycle state machine.
//!
//! `StationState` is the single shared record that trains and passengers
//! coordinate through. It is a plain state machine with no locking of its
//! own: every operation must be called while holding the station monitor's
//! guard (see `crate::protocol`). The operations enforce the station
//! invariants, so code that holds a `StationState` can trust its counts.
//!
//! The invariants, at every quiescent point:
//!
//! - all counts are non-negative (guaranteed by `u32` plus checked
//!   arithmetic);
//! - boarding completes, and the train may depart, exactly when the seats or
//!   the demand run out;
//! - every passenger is counted in exactly one of: still boarding this
//!   cycle, already seated, or waiting for the next train;
//! - at most one train occupies the station at a time.

use super::error::{BoardingRefusal, ProtocolError};

/// Phase of the current boarding cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    /// No train occupies the station.
    Empty,
    /// A train is present and accepting passengers.
    Boarding,
    /// Boarding is finished; the train may leave.
    Departing,
}

/// Why a train left the station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum DepartureReason {
    /// Every seat was taken.
    Full,
    /// Demand ran out before the seats did.
    NoDemand,
}

/// Settled accounting for one completed cycle, produced at the departure
/// instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DepartureRecord {
    /// Ordinal of the cycle this record closes.
    pub cycle: u64,
    /// Why the train left.
    pub reason: DepartureReason,
    /// Passengers seated during the cycle.
    pub boarded: u32,
    /// Seats the train left with unfilled.
    pub unused_seats: u32,
    /// Passengers deferred to the next train.
    pub requeued: u32,
}

/// Shared station state.
///
/// # Examples
///
/// ```
/// use train_station::domain::StationState;
///
/// let mut station = StationState::new();
/// station.reset_for_next_cycle(2, 4).unwrap();
/// station.admit_train(4).unwrap();
///
/// assert!(station.try_board_one().is_ok());
/// assert!(station.try_board_one().is_ok());
///
/// // Demand is exhausted, so boarding is complete.
/// assert!(station.boarding_complete());
/// ```
#[derive(Debug)]
pub struct StationState {
    /// Free seats on the present train; 0 whenever no train is present.
    available_seats: u32,
    /// Current cycle's passengers not yet seated.
    passengers_remaining: u32,
    /// Passengers deferred to a future train.
    waiting_passengers: u32,
    phase: CyclePhase,
    /// Monotonically increasing cycle ordinal, bumped when a cycle is staged.
    cycle: u64,
    /// Capacity announced for the staged cycle.
    announced_capacity: u32,
    boarded_this_cycle: u32,
    departure_reason: Option<DepartureReason>,
}

impl StationState {
    /// Create an idle station with no demand and no train.
    pub fn new() -> Self {
        Self {
            available_seats: 0,
            passengers_remaining: 0,
            waiting_passengers: 0,
            phase: CyclePhase::Empty,
            cycle: 0,
            announced_capacity: 0,
            boarded_this_cycle: 0,
            departure_reason: None,
        }
    }

    /// Free seats on the present train.
    pub fn available_seats(&self) -> u32 {
        self.available_seats
    }

    /// Current cycle's passengers not yet seated.
    pub fn passengers_remaining(&self) -> u32 {
        self.passengers_remaining
    }

    /// Passengers deferred to a future train.
    pub fn waiting_passengers(&self) -> u32 {
        self.waiting_passengers
    }

    /// Current phase of the boarding cycle.
    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    /// Ordinal of the currently staged cycle (0 before the first cycle).
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Capacity announced when the current cycle was staged.
    pub fn announced_capacity(&self) -> u32 {
        self.announced_capacity
    }

    /// Whether a train currently occupies the station.
    pub fn train_present(&self) -> bool {
        self.phase != CyclePhase::Empty
    }

    /// Whether the current train has finished boarding and may depart.
    pub fn boarding_done(&self) -> bool {
        self.phase == CyclePhase::Departing
    }

    /// Whether boarding for this cycle can go no further: the seats or the
    /// demand ran out.
    pub fn boarding_complete(&self) -> bool {
        self.available_seats == 0 || self.passengers_remaining == 0
    }

    /// Stage the next cycle's demand while the station is empty.
    ///
    /// Folds the passengers left waiting by the previous cycle into the
    /// freshly supplied count, clears the waiting queue and bumps the cycle
    /// ordinal. Returns the staged demand.
    ///
    /// # Errors
    ///
    /// Fails if a train is present, or if the combined demand overflows.
    pub fn reset_for_next_cycle(
        &mut self,
        passengers: u32,
        seats: u32,
    ) -> Result<u32, ProtocolError> {
        if self.train_present() {
            return Err(ProtocolError::InvariantViolation(
                "cannot stage a cycle while a train is present",
            ));
        }

        let demand = self
            .waiting_passengers
            .checked_add(passengers)
            .ok_or(ProtocolError::InvariantViolation("passenger count overflow"))?;

        self.passengers_remaining = demand;
        self.waiting_passengers = 0;
        self.announced_capacity = seats;
        self.boarded_this_cycle = 0;
        self.departure_reason = None;
        self.cycle += 1;

        Ok(demand)
    }

    /// Admit an arriving train, opening `capacity` seats.
    ///
    /// # Errors
    ///
    /// Fails if a train is already present: two trains must never occupy the
    /// station at once.
    pub fn admit_train(&mut self, capacity: u32) -> Result<(), ProtocolError> {
        if self.train_present() {
            return Err(ProtocolError::InvariantViolation("train already present"));
        }

        self.available_seats = capacity;
        self.phase = CyclePhase::Boarding;
        Ok(())
    }

    /// Seat one passenger, consuming one seat and one unit of demand.
    ///
    /// Succeeds only if both counters were positive beforehand; otherwise it
    /// refuses without mutating anything, telling the caller whether the
    /// seats or the demand ran out first.
    pub fn try_board_one(&mut self) -> Result<(), BoardingRefusal> {
        if self.available_seats == 0 {
            return Err(BoardingRefusal::NoCapacity);
        }
        if self.passengers_remaining == 0 {
            return Err(BoardingRefusal::NoDemand);
        }

        self.available_seats -= 1;
        self.passengers_remaining -= 1;
        self.boarded_this_cycle += 1;
        Ok(())
    }

    /// Finish boarding: transition `Boarding -> Departing`.
    ///
    /// Legal only once boarding is complete. Returns the departure reason:
    /// `Full` exactly when the seats ran out, `NoDemand` otherwise.
    pub fn mark_boarding_done(&mut self) -> Result<DepartureReason, ProtocolError> {
        if self.phase != CyclePhase::Boarding {
            return Err(ProtocolError::InvariantViolation(
                "boarding can only finish while a train is boarding",
            ));
        }
        if !self.boarding_complete() {
            return Err(ProtocolError::InvariantViolation(
                "boarding finished with seats and demand both remaining",
            ));
        }

        let reason = if self.available_seats == 0 {
            DepartureReason::Full
        } else {
            DepartureReason::NoDemand
        };
        self.phase = CyclePhase::Departing;
        self.departure_reason = Some(reason);
        Ok(reason)
    }

    /// Move `count` passengers from the current cycle's demand to the
    /// waiting queue.
    ///
    /// # Errors
    ///
    /// Fails if `count` exceeds the remaining demand: that would lose or
    /// double-count a passenger.
    pub fn requeue_waiting(&mut self, count: u32) -> Result<(), ProtocolError> {
        self.passengers_remaining = self.passengers_remaining.checked_sub(count).ok_or(
            ProtocolError::InvariantViolation("requeued more passengers than remained"),
        )?;
        self.waiting_passengers += count;
        Ok(())
    }

    /// Finalize departure: transition `Departing -> Empty` and settle counts.
    ///
    /// Any still-unseated remainder is swept into the waiting queue, so the
    /// accounting for the cycle is settled atomically at the departure
    /// instant. Returns the cycle's record.
    pub fn depart(&mut self) -> Result<DepartureRecord, ProtocolError> {
        if self.phase != CyclePhase::Departing {
            return Err(ProtocolError::InvariantViolation(
                "departure before boarding finished",
            ));
        }
        let reason = self.departure_reason.take().ok_or(
            ProtocolError::InvariantViolation("departing train has no recorded reason"),
        )?;

        let leftover = self.passengers_remaining;
        if leftover > 0 {
            self.requeue_waiting(leftover)?;
        }

        let record = DepartureRecord {
            cycle: self.cycle,
            reason,
            boarded: self.boarded_this_cycle,
            unused_seats: self.available_seats,
            requeued: self.waiting_passengers,
        };

        self.available_seats = 0;
        self.phase = CyclePhase::Empty;
        Ok(record)
    }
}

impl Default for StationState {
    fn default() -> Self {
        Self::new()
    }
}
