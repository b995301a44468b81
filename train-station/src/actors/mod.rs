//! Actor lifecycles.
//!
//! One task per transport unit and one per passenger; both coordinate only
//! through the shared [`Station`](crate::protocol::Station) handle.

mod passenger;
mod train;

pub use passenger::{PassengerId, PassengerOutcome, run_passenger};
pub use train::run_train;
