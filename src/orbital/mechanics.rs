use crate::error::FlightError;

/// Standard gravity used to convert specific impulse to exhaust velocity (m/s^2).
pub const G0: f64 = 9.80665;

// ---------------------------------------------------------------------------
// Input validation
// ---------------------------------------------------------------------------

fn require_positive(name: &str, value: f64) -> Result<f64, FlightError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(FlightError::non_physical(format!("{name} must be positive and finite, got {value}")))
    }
}

fn require_finite(name: &str, value: f64) -> Result<f64, FlightError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FlightError::non_physical(format!("{name} must be finite, got {value}")))
    }
}

// ---------------------------------------------------------------------------
// Orbital speeds
// ---------------------------------------------------------------------------

/// Vis-viva: v = sqrt(mu * (2/r - 1/a)).
///
/// `semi_major_axis` is negative for hyperbolic trajectories.
pub fn vis_viva_speed(mu: f64, r: f64, semi_major_axis: f64) -> Result<f64, FlightError> {
    let mu = require_positive("gravitational parameter", mu)?;
    let r = require_positive("radius", r)?;
    let a = require_finite("semi-major axis", semi_major_axis)?;
    if a == 0.0 {
        return Err(FlightError::non_physical("semi-major axis must be non-zero"));
    }
    let v2 = mu * (2.0 / r - 1.0 / a);
    if v2 < 0.0 {
        return Err(FlightError::non_physical(format!(
            "radius {r:.0} m lies outside an orbit with semi-major axis {a:.0} m"
        )));
    }
    Ok(v2.sqrt())
}

/// Speed of a circular orbit `altitude` metres above the body's surface.
pub fn circular_speed(mu: f64, body_radius: f64, altitude: f64) -> Result<f64, FlightError> {
    let body_radius = require_positive("body radius", body_radius)?;
    let altitude = require_finite("altitude", altitude)?;
    let r = body_radius + altitude;
    vis_viva_speed(mu, r, r)
}

// ---------------------------------------------------------------------------
// Propulsion
// ---------------------------------------------------------------------------

/// Effective exhaust velocity from specific impulse (s).
pub fn exhaust_velocity(isp: f64) -> Result<f64, FlightError> {
    Ok(require_positive("specific impulse", isp)? * G0)
}

/// Time to deliver `delta_v` at full thrust while mass falls as propellant burns.
///
/// From dv = ve * ln(m0/m1) and mdot = F/ve:
///   t = (m0 - m1) / mdot = m0 * ve / F * (1 - exp(-dv/ve))
/// `exp_m1` keeps short burns (m1 ~ m0) accurate.
pub fn burn_duration(
    delta_v: f64,
    available_thrust: f64,
    vehicle_mass: f64,
    exhaust_velocity: f64,
) -> Result<f64, FlightError> {
    let dv = require_finite("delta-v", delta_v)?;
    if dv < 0.0 {
        return Err(FlightError::non_physical(format!("delta-v magnitude must be >= 0, got {dv}")));
    }
    let thrust = require_positive("available thrust", available_thrust)?;
    let m0 = require_positive("vehicle mass", vehicle_mass)?;
    let ve = require_positive("exhaust velocity", exhaust_velocity)?;

    let burned_fraction = -(-dv / ve).exp_m1();
    Ok(m0 * ve / thrust * burned_fraction)
}

/// Delta-v delivered when mass drops from `m0` to `m1` (Tsiolkovsky).
pub fn rocket_delta_v(exhaust_velocity: f64, m0: f64, m1: f64) -> Result<f64, FlightError> {
    let ve = require_positive("exhaust velocity", exhaust_velocity)?;
    let m0 = require_positive("initial mass", m0)?;
    let m1 = require_positive("final mass", m1)?;
    if m1 > m0 {
        return Err(FlightError::non_physical(format!("final mass {m1} exceeds initial mass {m0}")));
    }
    // ln(m0/m1) = ln_1p((m0 - m1)/m1), exact near m0 == m1
    Ok(ve * ((m0 - m1) / m1).ln_1p())
}

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Seconds from `ut` until the node (negative once it has passed).
pub fn time_to_node(ut: f64, node_ut: f64) -> f64 {
    node_ut - ut
}

/// Ignition time that centers a burn of `burn_duration` seconds on the node.
pub fn ignition_time(node_ut: f64, burn_duration: f64) -> f64 {
    node_ut - burn_duration / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MU_KERBIN: f64 = 3.531_6e12;
    const R_KERBIN: f64 = 600_000.0;

    #[test]
    fn circular_matches_vis_viva_special_case() {
        for alt in [70_000.0, 80_000.0, 250_000.0, 2_863_334.0] {
            let r = R_KERBIN + alt;
            let vc = circular_speed(MU_KERBIN, R_KERBIN, alt).unwrap();
            let vv = vis_viva_speed(MU_KERBIN, r, r).unwrap();
            assert_relative_eq!(vc, vv, max_relative = 1e-12);
            assert_relative_eq!(vc, (MU_KERBIN / r).sqrt(), max_relative = 1e-12);
        }
    }

    #[test]
    fn kerbin_low_orbit_speed() {
        let v = circular_speed(MU_KERBIN, R_KERBIN, 80_000.0).unwrap();
        assert!(v > 2270.0 && v < 2290.0, "80 km orbit should be ~2279 m/s, got {:.1}", v);
    }

    #[test]
    fn vis_viva_rejects_degenerate_orbits() {
        assert!(matches!(vis_viva_speed(MU_KERBIN, 700_000.0, 0.0), Err(FlightError::NonPhysicalInput(_))));
        assert!(matches!(vis_viva_speed(-1.0, 700_000.0, 700_000.0), Err(FlightError::NonPhysicalInput(_))));
        assert!(matches!(vis_viva_speed(MU_KERBIN, 0.0, 700_000.0), Err(FlightError::NonPhysicalInput(_))));
        // r beyond apoapsis of the ellipse
        assert!(matches!(vis_viva_speed(MU_KERBIN, 2_000_000.0, 700_000.0), Err(FlightError::NonPhysicalInput(_))));
    }

    #[test]
    fn vis_viva_accepts_hyperbolic() {
        let v = vis_viva_speed(MU_KERBIN, 700_000.0, -1_000_000.0).unwrap();
        let v_esc = (2.0 * MU_KERBIN / 700_000.0).sqrt();
        assert!(v > v_esc);
    }

    #[test]
    fn burn_duration_zero_thrust_is_rejected() {
        let err = burn_duration(100.0, 0.0, 5_000.0, 3_000.0).unwrap_err();
        assert!(matches!(err, FlightError::NonPhysicalInput(_)));
    }

    #[test]
    fn burn_duration_rejects_bad_mass_and_nan() {
        assert!(burn_duration(100.0, 60_000.0, -5.0, 3_000.0).is_err());
        assert!(burn_duration(100.0, 60_000.0, 0.0, 3_000.0).is_err());
        assert!(burn_duration(f64::NAN, 60_000.0, 5_000.0, 3_000.0).is_err());
        assert!(burn_duration(100.0, f64::INFINITY, 5_000.0, 3_000.0).is_err());
        assert!(burn_duration(-1.0, 60_000.0, 5_000.0, 3_000.0).is_err());
    }

    #[test]
    fn burn_duration_monotonic_in_dv_and_thrust() {
        let (m, ve) = (5_000.0, 3_400.0);
        let mut prev = 0.0;
        for dv in [1.0, 10.0, 100.0, 500.0, 1_000.0, 3_000.0] {
            let t = burn_duration(dv, 60_000.0, m, ve).unwrap();
            assert!(t > prev, "duration should grow with dv");
            prev = t;
        }
        let mut prev = f64::INFINITY;
        for f in [1_000.0, 10_000.0, 60_000.0, 250_000.0] {
            let t = burn_duration(800.0, f, m, ve).unwrap();
            assert!(t < prev, "duration should shrink with thrust");
            prev = t;
        }
    }

    #[test]
    fn burn_duration_small_mass_ratio_matches_impulsive_limit() {
        // dv << ve: t -> m * dv / F
        let t = burn_duration(1e-6, 60_000.0, 5_000.0, 3_400.0).unwrap();
        assert_relative_eq!(t, 5_000.0 * 1e-6 / 60_000.0, max_relative = 1e-6);
        assert_eq!(burn_duration(0.0, 60_000.0, 5_000.0, 3_400.0).unwrap(), 0.0);
    }

    #[test]
    fn burn_duration_consistent_with_rocket_equation() {
        let (dv, f, m0, ve) = (841.0, 60_000.0, 5_000.0, 3_383.0);
        let t = burn_duration(dv, f, m0, ve).unwrap();
        let m1 = m0 - f / ve * t;
        assert_relative_eq!(rocket_delta_v(ve, m0, m1).unwrap(), dv, max_relative = 1e-9);
    }

    #[test]
    fn exhaust_velocity_from_isp() {
        assert_relative_eq!(exhaust_velocity(345.0).unwrap(), 345.0 * G0);
        assert!(exhaust_velocity(0.0).is_err());
    }

    #[test]
    fn ignition_centers_burn() {
        assert_eq!(ignition_time(1_000.0, 60.0), 970.0);
        assert_eq!(time_to_node(900.0, 1_000.0), 100.0);
        assert!(time_to_node(1_100.0, 1_000.0) < 0.0);
    }
}
