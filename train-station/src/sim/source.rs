//! Cycle inputs and their source.

use std::collections::VecDeque;

/// Demand and capacity for one boarding cycle, as supplied from outside.
///
/// Counts are totals for the cycle: passengers left waiting by the previous
/// cycle are added on top of `passengers` when the cycle is staged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CycleInput {
    /// Fresh passengers arriving for this cycle.
    pub passengers: u32,
    /// Seats on the train serving this cycle.
    pub seats: u32,
}

/// Supplies the initial and each follow-up cycle's counts.
///
/// This is the seam to the external collaborator: console input, a scenario
/// file or a test script all look the same to the driver.
pub trait CycleSource {
    /// The next `(passengers, seats)` pair, or `None` once the input is
    /// exhausted.
    fn next_cycle(&mut self) -> Option<CycleInput>;
}

/// A pre-scripted sequence of cycle inputs.
#[derive(Debug, Clone, Default)]
pub struct ScenarioSource {
    inputs: VecDeque<CycleInput>,
}

impl ScenarioSource {
    /// Build a source that yields `inputs` in order.
    pub fn new(inputs: impl IntoIterator<Item = CycleInput>) -> Self {
        Self {
            inputs: inputs.into_iter().collect(),
        }
    }

    /// Number of cycles not yet handed out.
    pub fn remaining(&self) -> usize {
        self.inputs.len()
    }
}

impl CycleSource for ScenarioSource {
    fn next_cycle(&mut self) -> Option<CycleInput> {
        self.inputs.pop_front()
    }
}
