//! In-process flight simulation standing in for the remote link.

pub mod connection;
pub mod integrator;
pub mod vehicle;
pub mod vessel;

pub use connection::SimConnection;
pub use integrator::rk4_step;
pub use vehicle::{presets, SimStage, SimStageBuilder, SimVehicle};
pub use vessel::SimulatedVessel;
