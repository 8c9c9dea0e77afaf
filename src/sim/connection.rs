use crate::error::LinkError;
use crate::link::Connection;
use crate::orbital::body::presets as bodies;
use crate::orbital::{CelestialBody, KeplerianElements};

use super::vehicle::SimVehicle;
use super::vessel::SimulatedVessel;

const SCHEME: &str = "sim://";

// ---------------------------------------------------------------------------
// Simulated session
// ---------------------------------------------------------------------------

/// Session with the in-process simulator. Endpoints look like
/// `sim://kerbin`; the host part names the body vessels start from.
///
/// Holds only the body catalog, so one session can be shared by any number
/// of concurrent flights.
#[derive(Debug, Clone)]
pub struct SimConnection {
    endpoint: String,
    home: CelestialBody,
    catalog: Vec<CelestialBody>,
}

impl SimConnection {
    pub fn connect(endpoint: &str) -> Result<Self, LinkError> {
        let unreachable = || LinkError::Unreachable(endpoint.to_string());
        let host = endpoint.strip_prefix(SCHEME).ok_or_else(unreachable)?;
        let catalog = bodies::all();
        let home = catalog
            .iter()
            .find(|b| b.name.eq_ignore_ascii_case(host))
            .cloned()
            .ok_or_else(unreachable)?;
        info!("connected to {} ({} bodies)", endpoint, catalog.len());
        Ok(Self { endpoint: endpoint.to_string(), home, catalog })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn home(&self) -> &CelestialBody {
        &self.home
    }

    /// New vessel on the launch pad of the home body.
    pub fn launch_vessel(&self, vehicle: SimVehicle) -> SimulatedVessel {
        SimulatedVessel::on_pad(vehicle, self.home.clone())
    }

    /// New vessel on an equatorial circular orbit at `altitude` (m).
    pub fn vessel_in_orbit(&self, vehicle: SimVehicle, altitude: f64) -> SimulatedVessel {
        let orbit = KeplerianElements::circular(self.home.radius + altitude, 0.0);
        SimulatedVessel::in_orbit(vehicle, self.home.clone(), &orbit)
    }
}

impl Connection for SimConnection {
    fn body(&self, name: &str) -> Result<Option<CelestialBody>, LinkError> {
        Ok(self.catalog.iter().find(|b| b.name.eq_ignore_ascii_case(name)).cloned())
    }
}
