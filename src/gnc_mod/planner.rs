use crate::config::ManeuverConfig;
use crate::error::FlightError;
use crate::orbital::{burn_duration, hohmann_delta_v, CelestialBody};
use crate::vehicle::VehicleSnapshot;

// ---------------------------------------------------------------------------
// Maneuver node
// ---------------------------------------------------------------------------

/// Delta-v in the orbital frame at the node (m/s).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeVector {
    pub prograde: f64,
    pub normal: f64,
    pub radial: f64,
}

impl NodeVector {
    pub fn magnitude(&self) -> f64 {
        (self.prograde * self.prograde + self.normal * self.normal + self.radial * self.radial).sqrt()
    }
}

/// A planned burn. Executed once: the executor takes it by value.
#[derive(Debug, PartialEq)]
pub struct ManeuverNode {
    pub ut: f64,
    pub delta_v: NodeVector,
    pub burn_duration: f64,
}

impl ManeuverNode {
    /// Time the burn starts so that it is centered on the node.
    pub fn ignition_ut(&self) -> f64 {
        crate::orbital::ignition_time(self.ut, self.burn_duration)
    }
}

// ---------------------------------------------------------------------------
// Hohmann departure planning
// ---------------------------------------------------------------------------

/// Plan the departure burn of a Hohmann transfer from the current (circular)
/// orbit to the orbit of `target`.
///
/// Pure: the same snapshot always gives the same node. The node sits on the
/// next periapsis passage far enough ahead to align and start the burn.
pub fn plan_transfer(
    snapshot: &VehicleSnapshot,
    target: &CelestialBody,
    config: &ManeuverConfig,
) -> Result<ManeuverNode, FlightError> {
    let body = &snapshot.body;
    if !target.orbits(body) {
        return Err(FlightError::TargetNotInOrbitOf {
            target: target.name.clone(),
            body: body.name.clone(),
        });
    }
    let r2 = target.orbit_radius.ok_or_else(|| {
        FlightError::non_physical(format!("{} has no orbit radius", target.name))
    })?;
    if snapshot.eccentricity > config.max_eccentricity {
        return Err(FlightError::OrbitNotCircular {
            eccentricity: snapshot.eccentricity,
            limit: config.max_eccentricity,
        });
    }

    let transfer = hohmann_delta_v(body.mu, snapshot.semi_major_axis, r2)?;
    let dv = transfer.departure;
    let duration = burn_duration(
        dv.abs(),
        snapshot.available_thrust,
        snapshot.mass,
        snapshot.exhaust_velocity()?,
    )?;

    let mut wait = snapshot.time_to_periapsis;
    if wait < config.min_lead_time + duration / 2.0 {
        wait += snapshot.period;
    }

    Ok(ManeuverNode {
        ut: snapshot.ut + wait,
        delta_v: NodeVector { prograde: dv, normal: 0.0, radial: 0.0 },
        burn_duration: duration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbital::body::presets;
    use crate::vehicle::snapshot::tests::pad_snapshot;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn parking_orbit() -> VehicleSnapshot {
        let mut s = pad_snapshot();
        let r = 700_000.0;
        let v = (s.body.mu / r).sqrt();
        s.ut = 1_000.0;
        s.altitude = r - s.body.radius;
        s.apoapsis = s.altitude;
        s.periapsis = s.altitude;
        s.semi_major_axis = r;
        s.eccentricity = 0.001;
        s.velocity = Vector3::new(v, 0.0, 0.0);
        s.speed = v;
        s.period = 1_958.0;
        s.time_to_periapsis = 600.0;
        s.time_to_apoapsis = 600.0 + 979.0;
        s.mass = 5_000.0;
        s.available_thrust = 100_000.0;
        s.specific_impulse = 345.0;
        s
    }

    #[test]
    fn plans_mun_departure_at_periapsis() {
        let s = parking_orbit();
        let node = plan_transfer(&s, &presets::mun(), &ManeuverConfig::default()).unwrap();
        let expected = hohmann_delta_v(s.body.mu, 700_000.0, 12_000_000.0).unwrap().departure;
        assert_relative_eq!(node.delta_v.prograde, expected, max_relative = 1e-12);
        assert_eq!(node.delta_v.normal, 0.0);
        assert_eq!(node.delta_v.radial, 0.0);
        assert_eq!(node.ut, 1_600.0);
        assert!(node.burn_duration > 30.0 && node.burn_duration < 45.0, "got {}", node.burn_duration);
        assert!(node.ignition_ut() < node.ut);
    }

    #[test]
    fn planning_is_idempotent() {
        let s = parking_orbit();
        let cfg = ManeuverConfig::default();
        let a = plan_transfer(&s, &presets::mun(), &cfg).unwrap();
        let b = plan_transfer(&s, &presets::mun(), &cfg).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn imminent_periapsis_waits_an_orbit() {
        let mut s = parking_orbit();
        s.time_to_periapsis = 5.0;
        let node = plan_transfer(&s, &presets::mun(), &ManeuverConfig::default()).unwrap();
        assert_eq!(node.ut, s.ut + 5.0 + s.period);
    }

    #[test]
    fn rejects_eccentric_orbit() {
        let mut s = parking_orbit();
        s.eccentricity = 0.2;
        let err = plan_transfer(&s, &presets::mun(), &ManeuverConfig::default()).unwrap_err();
        assert!(matches!(err, FlightError::OrbitNotCircular { .. }));
    }

    #[test]
    fn rejects_target_around_another_body() {
        let s = parking_orbit();
        let err = plan_transfer(&s, &presets::duna(), &ManeuverConfig::default()).unwrap_err();
        assert_eq!(
            err,
            FlightError::TargetNotInOrbitOf { target: "Duna".into(), body: "Kerbin".into() }
        );
    }

    #[test]
    fn zero_thrust_is_non_physical() {
        let mut s = parking_orbit();
        s.available_thrust = 0.0;
        let err = plan_transfer(&s, &presets::mun(), &ManeuverConfig::default()).unwrap_err();
        assert!(matches!(err, FlightError::NonPhysicalInput(_)));
    }
}
