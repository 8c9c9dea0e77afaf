use serde::Deserialize;

use crate::error::FlightError;

// ---------------------------------------------------------------------------
// Stage descriptors (what the autopilot assumes about the stack)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Solid,
    Liquid,
}

/// One entry of the ordered stage list.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct StageDescriptor {
    pub fuel: FuelType,
    /// Decouple once the stage's fuel fraction is at or below this value.
    #[serde(default)]
    pub decouple_below: f64,
}

impl StageDescriptor {
    pub fn solid() -> Self {
        Self { fuel: FuelType::Solid, decouple_below: 0.0 }
    }

    pub fn liquid() -> Self {
        Self { fuel: FuelType::Liquid, decouple_below: 0.0 }
    }

    pub fn is_spent(&self, fuel_fraction: f64) -> bool {
        fuel_fraction <= self.decouple_below + 1e-9
    }
}

/// Solid boosters first, then the liquid stage that finishes the climb.
pub fn default_stages() -> Vec<StageDescriptor> {
    vec![StageDescriptor::solid(), StageDescriptor::liquid()]
}

// ---------------------------------------------------------------------------
// Stage sequence: tracks ignition and decouples, each at most once
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StageSequence {
    stages: Vec<StageDescriptor>,
    ignited: bool,
    decoupled: usize, // number of stages already dropped
}

impl StageSequence {
    pub fn new(stages: Vec<StageDescriptor>) -> Self {
        Self { stages, ignited: false, decoupled: 0 }
    }

    /// Sequence for a vehicle already flying on `active` (earlier stages gone).
    pub fn in_flight(stages: Vec<StageDescriptor>, active: usize) -> Self {
        Self { stages, ignited: true, decoupled: active }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn descriptor(&self, stage: usize) -> Option<&StageDescriptor> {
        self.stages.get(stage)
    }

    pub fn is_last(&self, stage: usize) -> bool {
        stage + 1 >= self.stages.len()
    }

    pub fn decoupled_count(&self) -> usize {
        self.decoupled
    }

    /// First activation lights stage 0. Returns false if already ignited.
    pub fn ignite(&mut self) -> bool {
        if self.ignited {
            return false;
        }
        self.ignited = true;
        true
    }

    /// Request to drop `stage` and light the next one.
    ///
    /// Returns `Ok(true)` when the decouple should be commanded, `Ok(false)`
    /// when that stage was already dropped (telemetry lagging behind the
    /// command), and an error when there is nothing left to activate.
    pub fn decouple(&mut self, stage: usize) -> Result<bool, FlightError> {
        if stage < self.decoupled {
            return Ok(false);
        }
        if self.is_last(stage) {
            return Err(FlightError::StageSequenceExhausted { stage });
        }
        self.decoupled = stage + 1;
        Ok(true)
    }
}
