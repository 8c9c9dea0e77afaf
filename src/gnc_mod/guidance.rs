use crate::config::PitchProfile;
use crate::error::FlightError;
use crate::orbital::{circular_speed, vis_viva_speed};

// ---------------------------------------------------------------------------
// Guidance laws: pure functions of the current state
// ---------------------------------------------------------------------------

/// Pitch program for the gravity turn (deg above the horizon).
/// - below `turn_start`: vertical (90 deg)
/// - between: falls to 0 following `profile`
/// - above `turn_end`: horizontal
pub fn pitch_program(altitude: f64, turn_start: f64, turn_end: f64, profile: PitchProfile) -> f64 {
    if altitude <= turn_start {
        return 90.0;
    }
    if altitude >= turn_end || turn_end <= turn_start {
        return 0.0;
    }
    let frac = (altitude - turn_start) / (turn_end - turn_start);
    let shaped = match profile {
        PitchProfile::Linear => frac,
        PitchProfile::Power { exponent } => frac.powf(exponent),
    };
    (90.0 * (1.0 - shaped)).clamp(0.0, 90.0)
}

/// Full throttle until the apoapsis is within `band` of the target, then
/// proportional to the remaining distance (never below `min`).
pub fn apoapsis_throttle(apoapsis: f64, target: f64, band: f64, min: f64) -> f64 {
    ((target - apoapsis) / band).clamp(min, 1.0)
}

/// Throttle that leaves about `tail_time` seconds of full-thrust burn for the
/// remaining delta-v, so cutoff lands close to the goal. A zero `tail_time`
/// keeps full throttle down to cutoff.
pub fn tail_throttle(remaining_dv: f64, max_accel: f64, tail_time: f64, min: f64) -> f64 {
    if max_accel <= 0.0 || tail_time <= 0.0 {
        return 1.0;
    }
    (remaining_dv / (max_accel * tail_time)).clamp(min, 1.0)
}

/// No thrust while the vehicle is pointing too far from where it should.
pub fn gate_on_alignment(throttle: f64, error_deg: f64, max_error_deg: f64) -> f64 {
    if error_deg > max_error_deg {
        0.0
    } else {
        throttle
    }
}

// ---------------------------------------------------------------------------
// Burn sizing
// ---------------------------------------------------------------------------

/// Prograde delta-v that circularizes an orbit of semi-major axis `sma` at
/// apoapsis altitude `apoapsis`.
pub fn circularization_delta_v(mu: f64, body_radius: f64, apoapsis: f64, sma: f64) -> Result<f64, FlightError> {
    let r = body_radius + apoapsis;
    Ok(circular_speed(mu, body_radius, apoapsis)? - vis_viva_speed(mu, r, sma)?)
}

/// Horizontal speed needed at radius `r` for the opposite apsis to sit at
/// `opposite_radius`.
pub fn apsis_speed(mu: f64, r: f64, opposite_radius: f64) -> Result<f64, FlightError> {
    vis_viva_speed(mu, r, (r + opposite_radius) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const MU: f64 = 3.531_6e12;
    const R: f64 = 600_000.0;
    const POWER: PitchProfile = PitchProfile::Power { exponent: 0.6 };

    #[test]
    fn vertical_below_turn_start() {
        assert_eq!(pitch_program(0.0, 1_000.0, 80_000.0, POWER), 90.0);
        assert_eq!(pitch_program(1_000.0, 1_000.0, 80_000.0, POWER), 90.0);
    }

    #[test]
    fn horizontal_above_turn_end() {
        assert_eq!(pitch_program(80_000.0, 1_000.0, 80_000.0, POWER), 0.0);
        assert_eq!(pitch_program(95_000.0, 1_000.0, 80_000.0, PitchProfile::Linear), 0.0);
    }

    #[test]
    fn linear_midpoint_is_45() {
        let p = pitch_program(40_500.0, 1_000.0, 80_000.0, PitchProfile::Linear);
        assert_abs_diff_eq!(p, 45.0, epsilon = 1e-9);
    }

    #[test]
    fn pitch_never_increases_with_altitude() {
        let mut prev = 90.0;
        for step in 0..=200 {
            let alt = step as f64 * 500.0;
            let p = pitch_program(alt, 1_000.0, 80_000.0, POWER);
            assert!(p <= prev + 1e-12, "pitch rose at {} m: {} > {}", alt, p, prev);
            prev = p;
        }
    }

    #[test]
    fn throttle_eases_near_target() {
        assert_eq!(apoapsis_throttle(10_000.0, 80_000.0, 5_000.0, 0.05), 1.0);
        assert_abs_diff_eq!(apoapsis_throttle(77_500.0, 80_000.0, 5_000.0, 0.05), 0.5);
        assert_eq!(apoapsis_throttle(79_999.9, 80_000.0, 5_000.0, 0.05), 0.05);
        assert_eq!(apoapsis_throttle(81_000.0, 80_000.0, 5_000.0, 0.05), 0.05);
    }

    #[test]
    fn tail_throttle_scales_down() {
        assert_eq!(tail_throttle(500.0, 20.0, 2.0, 0.02), 1.0);
        assert_abs_diff_eq!(tail_throttle(10.0, 20.0, 2.0, 0.02), 0.25);
        assert_eq!(tail_throttle(0.01, 20.0, 2.0, 0.02), 0.02);
        assert_eq!(tail_throttle(10.0, 0.0, 2.0, 0.02), 1.0);
        assert_eq!(tail_throttle(0.5, 20.0, 0.0, 0.02), 1.0);
    }

    #[test]
    fn alignment_gate() {
        assert_eq!(gate_on_alignment(0.8, 45.0, 30.0), 0.0);
        assert_eq!(gate_on_alignment(0.8, 5.0, 30.0), 0.8);
    }

    #[test]
    fn circularization_dv_closes_the_orbit() {
        // Suborbital arc with apoapsis at 80 km, periapsis deep inside the body
        let (ap, pe) = (R + 80_000.0, 100_000.0);
        let sma = (ap + pe) / 2.0;
        let dv = circularization_delta_v(MU, R, 80_000.0, sma).unwrap();
        let v_ap = vis_viva_speed(MU, ap, sma).unwrap();
        assert_abs_diff_eq!(v_ap + dv, (MU / ap).sqrt(), epsilon = 1e-9);
        assert!(dv > 1_000.0);
    }

    #[test]
    fn apsis_speed_for_circular_is_circular_speed() {
        let r = R + 80_000.0;
        assert_abs_diff_eq!(apsis_speed(MU, r, r).unwrap(), (MU / r).sqrt(), epsilon = 1e-9);
        assert!(apsis_speed(MU, r, r + 10_000.0).unwrap() > (MU / r).sqrt());
    }
}
