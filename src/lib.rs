#[macro_use]
mod logger;

pub mod config;
pub mod error;
pub mod flight;
pub mod link;
pub mod orbital;
pub mod sim;
pub mod telemetry;
pub mod vehicle;
mod gnc_mod;

// The gnc module: expose gnc_mod as `gnc` publicly
pub mod gnc {
    pub use crate::gnc_mod::*;
}

pub use config::FlightConfig;
pub use error::{ConfigError, FlightError, LinkError, Phase};
pub use flight::{
    launch_to_orbit, launch_to_orbit_with, transfer_to_body, transfer_to_body_with, AscentReport, CancelToken,
    TransferReport,
};
pub use link::{Connection, Vessel};
