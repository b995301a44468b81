//! The boarding protocol engine.
//!
//! A single monitor mediates the handshake between trains and passengers:
//! exactly one train occupies the station at a time, passengers board only
//! while a train is present and has free seats, and the train departs only
//! once boarding for its cycle is complete.

mod monitor;

pub use monitor::Station;
