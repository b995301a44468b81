//! Scenario files.
//!
//! A scenario is the on-disk form of a scripted cycle source: JSON with one
//! `(passengers, seats)` pair per cycle.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::source::{CycleInput, ScenarioSource};

/// Error loading or saving a scenario file.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The file could not be read
    #[error("failed to read scenario file: {message}")]
    Read { message: String },

    /// The file was not valid scenario JSON
    #[error("failed to parse scenario file: {message}")]
    Parse { message: String },

    /// The file parsed but described no usable run
    #[error("invalid scenario: {0}")]
    Invalid(&'static str),

    /// The file could not be written
    #[error("failed to write scenario file: {message}")]
    Write { message: String },
}

/// A scripted run: the cycle inputs in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Inputs for the first cycle and each follow-up train.
    pub cycles: Vec<CycleInput>,
}

impl Scenario {
    /// Build a scenario from cycle inputs.
    ///
    /// # Errors
    ///
    /// Returns `Err` if `cycles` is empty: a run needs at least one train.
    pub fn new(cycles: Vec<CycleInput>) -> Result<Self, ScenarioError> {
        if cycles.is_empty() {
            return Err(ScenarioError::Invalid("a scenario needs at least one cycle"));
        }
        Ok(Self { cycles })
    }

    /// Load a scenario from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ScenarioError::Read {
            message: e.to_string(),
        })?;
        let scenario: Scenario = serde_json::from_str(&contents).map_err(|e| ScenarioError::Parse {
            message: e.to_string(),
        })?;
        if scenario.cycles.is_empty() {
            return Err(ScenarioError::Invalid("a scenario needs at least one cycle"));
        }
        Ok(scenario)
    }

    /// Save the scenario as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ScenarioError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| ScenarioError::Write {
            message: e.to_string(),
        })?;
        std::fs::write(path, json).map_err(|e| ScenarioError::Write {
            message: e.to_string(),
        })
    }

    /// Turn the scenario into a cycle source for the driver.
    pub fn into_source(self) -> ScenarioSource {
        ScenarioSource::new(self.cycles)
    }
}
