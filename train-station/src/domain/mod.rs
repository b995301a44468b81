//! Domain types for the station boarding coordinator.
//!
//! This module contains the core model: the shared station state machine,
//! the departure records it produces, the observable event stream, and the
//! protocol's error taxonomy. All state transitions enforce their invariants
//! at the point of mutation, so code that receives these types can trust
//! their validity.

mod error;
mod event;
mod station;

pub use error::{BoardingRefusal, ProtocolError};
pub use event::StationEvent;
pub use station::{CyclePhase, DepartureReason, DepartureRecord, StationState};
