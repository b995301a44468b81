//! Top-level simulation: the driver loop and its input sources.

mod config;
mod driver;
mod source;

pub use config::{Scenario, ScenarioError};
pub use driver::{Driver, RunReport};
pub use source::{CycleInput, CycleSource, ScenarioSource};
