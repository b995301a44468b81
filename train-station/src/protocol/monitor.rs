//! The station monitor: one guard, condition signals, re-checked predicates.
//!
//! `Station` wraps the shared `StationState` in classic monitor discipline.
//! The guard is a `std::sync::Mutex` held only for the few instructions of a
//! state transition and never across an await. Condition signaling uses
//! `tokio::sync::watch` epoch channels: a waiter subscribes *before*
//! inspecting the state, so a signal published between the check and the
//! await is never lost, and every predicate is re-checked in a loop on wake.
//!
//! Three conditions are signaled:
//!
//! - `train_arrived`: broadcast on arrival; every waiting passenger must
//!   re-check, since only some will get a seat;
//! - `passenger_seated`: bumped on each boarding; the train re-checks
//!   whether its cycle is complete;
//! - `train_departed`: bumped on departure; a queued arrival re-checks that
//!   the platform is free, so two trains never occupy the station at once.
//!
//! A shutdown flag is a fourth `watch`; every blocked wait also selects on it
//! and resolves to `Cancelled`, so a run can never deadlock on demand and
//! capacity that will never match.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::domain::{
    BoardingRefusal, DepartureReason, DepartureRecord, ProtocolError, StationEvent, StationState,
};

/// Publish the next epoch on a condition channel.
fn signal(tx: &watch::Sender<u64>) {
    tx.send_modify(|epoch| *epoch += 1);
}

/// Block until the condition channel publishes a new epoch, unless shutdown
/// fires first.
async fn wait_signal(
    cond: &mut watch::Receiver<u64>,
    stop: &mut watch::Receiver<bool>,
) -> Result<(), ProtocolError> {
    tokio::select! {
        changed = cond.changed() => {
            changed.map_err(|_| ProtocolError::InvariantViolation("condition channel closed"))?;
            Ok(())
        }
        stopped = stop.wait_for(|requested| *requested) => {
            stopped.map_err(|_| ProtocolError::InvariantViolation("shutdown channel closed"))?;
            Err(ProtocolError::Cancelled)
        }
    }
}

/// The shared station, jointly owned by all actors.
///
/// All actors hold an `Arc<Station>` handle; the state itself lives behind
/// the monitor guard and is mutated only through the methods here. Observable
/// events are emitted, in state-transition order, on the channel returned by
/// [`Station::new`].
pub struct Station {
    state: Mutex<StationState>,
    train_arrived: watch::Sender<u64>,
    passenger_seated: watch::Sender<u64>,
    train_departed: watch::Sender<u64>,
    stop: watch::Sender<bool>,
    events: mpsc::UnboundedSender<StationEvent>,
}

impl Station {
    /// Create an idle station and the receiving end of its event stream.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<StationEvent>) {
        let (events, event_rx) = mpsc::unbounded_channel();
        let (train_arrived, _) = watch::channel(0);
        let (passenger_seated, _) = watch::channel(0);
        let (train_departed, _) = watch::channel(0);
        let (stop, _) = watch::channel(false);

        let station = Arc::new(Self {
            state: Mutex::new(StationState::new()),
            train_arrived,
            passenger_seated,
            train_departed,
            stop,
            events,
        });
        (station, event_rx)
    }

    fn lock(&self) -> Result<MutexGuard<'_, StationState>, ProtocolError> {
        // A poisoned guard means an actor panicked mid-transition; the state
        // can no longer be trusted.
        self.state
            .lock()
            .map_err(|_| ProtocolError::InvariantViolation("station guard poisoned"))
    }

    fn emit(&self, event: StationEvent) {
        // The receiver may already be gone once the run is being torn down.
        let _ = self.events.send(event);
    }

    /// Stage the next cycle's demand: fresh passengers folded together with
    /// everyone left waiting by the previous cycle. Returns the staged
    /// demand.
    pub fn stage_cycle(&self, passengers: u32, seats: u32) -> Result<u32, ProtocolError> {
        let mut st = self.lock()?;
        let demand = st.reset_for_next_cycle(passengers, seats)?;
        let cycle = st.cycle();
        debug!(cycle, demand, capacity = seats, "cycle staged");
        self.emit(StationEvent::CycleStaged {
            cycle,
            demand,
            capacity: seats,
        });
        Ok(demand)
    }

    /// Admit a train with `capacity` seats, waiting until the previous train
    /// has left the platform. Broadcasts the arrival to every waiting
    /// passenger. Returns the cycle the train serves.
    pub async fn admit_train(&self, capacity: u32) -> Result<u64, ProtocolError> {
        let mut departures = self.train_departed.subscribe();
        let mut stop = self.stop.subscribe();

        loop {
            {
                let mut st = self.lock()?;
                if !st.train_present() {
                    st.admit_train(capacity)?;
                    let cycle = st.cycle();
                    info!(cycle, capacity, "train arrived, doors open");
                    self.emit(StationEvent::TrainArrived { cycle, capacity });
                    signal(&self.train_arrived);
                    return Ok(cycle);
                }
            }
            wait_signal(&mut departures, &mut stop).await?;
        }
    }

    /// Block until boarding for the present train can go no further, then
    /// finish the cycle. Returns why the train may leave.
    ///
    /// A train admitted to zero demand observes completion on its first
    /// check and returns without ever waiting.
    pub async fn await_boarding_complete(&self) -> Result<DepartureReason, ProtocolError> {
        let mut seatings = self.passenger_seated.subscribe();
        let mut stop = self.stop.subscribe();

        loop {
            {
                let mut st = self.lock()?;
                if st.boarding_complete() {
                    let reason = st.mark_boarding_done()?;
                    debug!(cycle = st.cycle(), ?reason, "boarding complete");
                    return Ok(reason);
                }
            }
            wait_signal(&mut seatings, &mut stop).await?;
        }
    }

    /// Finalize the departure: settle the cycle's accounting, report it and
    /// free the platform for the next arrival.
    pub fn depart(&self) -> Result<DepartureRecord, ProtocolError> {
        let mut st = self.lock()?;
        let record = st.depart()?;
        info!(
            cycle = record.cycle,
            reason = ?record.reason,
            boarded = record.boarded,
            unused_seats = record.unused_seats,
            requeued = record.requeued,
            "train departed"
        );
        self.emit(StationEvent::TrainDeparted(record));
        signal(&self.train_departed);
        Ok(record)
    }

    /// One passenger's whole interaction with the station: wait for a train
    /// it has not yet tried, attempt to take a seat, defer to the next cycle
    /// when refused. Resolves once seated, or with `Cancelled` on shutdown.
    pub async fn board(&self) -> Result<(), ProtocolError> {
        let mut arrivals = self.train_arrived.subscribe();
        let mut stop = self.stop.subscribe();
        let mut refused_cycle: Option<u64> = None;

        loop {
            let seated = {
                let mut st = self.lock()?;
                if st.train_present() && refused_cycle != Some(st.cycle()) {
                    match st.try_board_one() {
                        Ok(()) => {
                            let remaining_seats = st.available_seats();
                            let remaining_demand = st.passengers_remaining();
                            debug!(remaining_seats, remaining_demand, "passenger seated");
                            self.emit(StationEvent::PassengerBoarded {
                                remaining_seats,
                                remaining_demand,
                            });
                            signal(&self.passenger_seated);
                            true
                        }
                        Err(BoardingRefusal::NoCapacity) => {
                            // The train filled up before we got a seat: move
                            // ourselves to the waiting queue and sit out the
                            // rest of this cycle.
                            st.requeue_waiting(1)?;
                            refused_cycle = Some(st.cycle());
                            debug!(cycle = st.cycle(), "train full, passenger deferred");
                            false
                        }
                        Err(BoardingRefusal::NoDemand) => {
                            return Err(ProtocolError::InvariantViolation(
                                "unseated passenger found no demand counted",
                            ));
                        }
                    }
                } else {
                    false
                }
            };

            if seated {
                return Ok(());
            }
            wait_signal(&mut arrivals, &mut stop).await?;
        }
    }

    /// Request shutdown: every blocked actor wakes and resolves `Cancelled`.
    pub fn shutdown(&self) {
        info!("shutdown requested, waking blocked actors");
        self.stop.send_replace(true);
    }

    /// Report that every passenger reached a terminal state.
    pub fn report_all_processed(&self, boarded: u32, cancelled: u32) {
        info!(boarded, cancelled, "all passengers processed");
        self.emit(StationEvent::AllPassengersProcessed { boarded, cancelled });
    }
}
