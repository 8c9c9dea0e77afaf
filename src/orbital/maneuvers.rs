use std::f64::consts::PI;

use super::mechanics::vis_viva_speed;
use crate::error::FlightError;

/// Result of a Hohmann transfer calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HohmannTransfer {
    pub departure: f64,     // m/s, first burn (signed: negative = retrograde)
    pub arrival: f64,       // m/s, second burn (circularize at r2)
    pub total: f64,         // m/s, |departure| + |arrival|
    pub transfer_time: f64, // s, half the transfer orbit period
    pub r1: f64,            // m, initial orbit radius
    pub r2: f64,            // m, final orbit radius
}

/// Two-burn transfer between circular orbits of radii `r1` and `r2` (not altitudes).
///
/// Only the departure burn is flown by the executor; `arrival` is reported so
/// callers can budget the capture burn themselves.
pub fn hohmann_delta_v(mu: f64, r1: f64, r2: f64) -> Result<HohmannTransfer, FlightError> {
    let a_transfer = (r1 + r2) / 2.0;

    let v_circ1 = vis_viva_speed(mu, r1, r1)?;
    let v_circ2 = vis_viva_speed(mu, r2, r2)?;

    let v_transfer_1 = vis_viva_speed(mu, r1, a_transfer)?;
    let v_transfer_2 = vis_viva_speed(mu, r2, a_transfer)?;

    let departure = v_transfer_1 - v_circ1;
    let arrival = v_circ2 - v_transfer_2;

    let transfer_time = PI * (a_transfer.powi(3) / mu).sqrt();

    Ok(HohmannTransfer {
        departure,
        arrival,
        total: departure.abs() + arrival.abs(),
        transfer_time,
        r1,
        r2,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const MU_KERBIN: f64 = 3.531_6e12;

    #[test]
    fn departure_matches_closed_form() {
        let (r1, r2) = (700_000.0, 12_000_000.0);
        let h = hohmann_delta_v(MU_KERBIN, r1, r2).unwrap();
        let expected = (MU_KERBIN / r1).sqrt() * ((2.0 * r2 / (r1 + r2)).sqrt() - 1.0);
        assert_relative_eq!(h.departure, expected, max_relative = 1e-12);
        // Known Kerbin LKO -> Mun ejection is ~840 m/s
        assert!(h.departure > 830.0 && h.departure < 850.0, "got {:.1}", h.departure);
    }

    #[test]
    fn arrival_matches_closed_form() {
        let (r1, r2) = (700_000.0, 12_000_000.0);
        let h = hohmann_delta_v(MU_KERBIN, r1, r2).unwrap();
        let expected = (MU_KERBIN / r2).sqrt() * (1.0 - (2.0 * r1 / (r1 + r2)).sqrt());
        assert_relative_eq!(h.arrival, expected, max_relative = 1e-12);
        assert_relative_eq!(h.total, h.departure + h.arrival, max_relative = 1e-12);
    }

    #[test]
    fn zero_dv_for_same_orbit() {
        let r = 680_000.0;
        let h = hohmann_delta_v(MU_KERBIN, r, r).unwrap();
        assert!(h.total < 1e-9);
    }

    #[test]
    fn lowering_orbit_is_retrograde() {
        let h = hohmann_delta_v(MU_KERBIN, 12_000_000.0, 700_000.0).unwrap();
        assert!(h.departure < 0.0);
        assert!(h.arrival < 0.0);
    }

    #[test]
    fn transfer_time_is_half_period() {
        let (r1, r2) = (700_000.0, 12_000_000.0);
        let h = hohmann_delta_v(MU_KERBIN, r1, r2).unwrap();
        let a = (r1 + r2) / 2.0;
        let period = 2.0 * PI * (a.powi(3) / MU_KERBIN).sqrt();
        assert_relative_eq!(h.transfer_time, period / 2.0, max_relative = 1e-12);
    }

    #[test]
    fn rejects_non_physical_radii() {
        assert!(hohmann_delta_v(MU_KERBIN, -700_000.0, 12_000_000.0).is_err());
        assert!(hohmann_delta_v(0.0, 700_000.0, 12_000_000.0).is_err());
    }
}
