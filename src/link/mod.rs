//! Boundary to the remote flight simulation.
//!
//! Every call is a blocking round trip that may fail with a [`LinkError`].
//! Implementations exist for the in-process simulator (`crate::sim`); a
//! networked client only has to implement these two traits.

use nalgebra::Vector3;

use crate::error::LinkError;
use crate::orbital::CelestialBody;
use crate::vehicle::ControlCommand;

// ---------------------------------------------------------------------------
// Raw telemetry records
// ---------------------------------------------------------------------------

/// Surface-relative flight data, vectors in the local [E, N, U] frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightTelemetry {
    pub altitude: f64,
    pub velocity: Vector3<f64>, // orbital (non-rotating) velocity
    pub facing: Vector3<f64>,
}

/// Osculating orbit around the current body. Apsides are altitudes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitTelemetry {
    pub apoapsis: f64,
    pub periapsis: f64,
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub time_to_apoapsis: f64,
    pub time_to_periapsis: f64,
    pub period: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropulsionTelemetry {
    pub mass: f64,
    pub available_thrust: f64,
    pub specific_impulse: f64,
    pub stage: usize,
    pub fuel_amount: f64,
    pub fuel_capacity: f64,
}

// ---------------------------------------------------------------------------
// Remote handles
// ---------------------------------------------------------------------------

/// Handle to one controllable vehicle.
pub trait Vessel {
    /// Simulation universal time (s).
    fn ut(&mut self) -> Result<f64, LinkError>;

    fn flight(&mut self) -> Result<FlightTelemetry, LinkError>;

    fn orbit(&mut self) -> Result<OrbitTelemetry, LinkError>;

    fn propulsion(&mut self) -> Result<PropulsionTelemetry, LinkError>;

    /// Body whose sphere of influence the vehicle is in.
    fn body(&mut self) -> Result<CelestialBody, LinkError>;

    /// Apply throttle, attitude target, staging and autopilot state together.
    fn apply(&mut self, command: &ControlCommand) -> Result<(), LinkError>;

    /// Block until roughly `period` seconds of simulation time have passed.
    fn await_tick(&mut self, period: f64) -> Result<(), LinkError>;
}

/// Session with the simulation, shared read-only between flights.
pub trait Connection: Sync {
    /// Look up a body by name; `Ok(None)` when the simulation has no such body.
    fn body(&self, name: &str) -> Result<Option<CelestialBody>, LinkError>;
}
