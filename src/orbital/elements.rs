use std::f64::consts::{PI, TAU};

use nalgebra::Vector3;

/// Classical Keplerian orbital elements.
#[derive(Debug, Clone, Copy)]
pub struct KeplerianElements {
    pub sma: f64,       // semi-major axis, m (negative when hyperbolic)
    pub ecc: f64,       // eccentricity (0 = circular)
    pub inc: f64,       // inclination, rad
    pub raan: f64,      // right ascension of ascending node, rad
    pub argp: f64,      // argument of periapsis, rad
    pub true_anom: f64, // true anomaly, rad
}

impl KeplerianElements {
    /// Convert elements to an inertial state vector (position, velocity).
    pub fn to_state_vector(&self, mu: f64) -> (Vector3<f64>, Vector3<f64>) {
        let p = self.sma * (1.0 - self.ecc * self.ecc); // semi-latus rectum
        let r_pqw = p / (1.0 + self.ecc * self.true_anom.cos());

        // Position and velocity in the perifocal frame (PQW)
        let r_pqw_vec = Vector3::new(
            r_pqw * self.true_anom.cos(),
            r_pqw * self.true_anom.sin(),
            0.0,
        );
        let sqrt_mu_p = (mu / p).sqrt();
        let v_pqw_vec = Vector3::new(
            -sqrt_mu_p * self.true_anom.sin(),
            sqrt_mu_p * (self.ecc + self.true_anom.cos()),
            0.0,
        );

        // Rotation matrix from PQW to inertial
        let (sin_raan, cos_raan) = self.raan.sin_cos();
        let (sin_argp, cos_argp) = self.argp.sin_cos();
        let (sin_inc, cos_inc) = self.inc.sin_cos();

        let rot = |v: &Vector3<f64>| -> Vector3<f64> {
            Vector3::new(
                (cos_raan * cos_argp - sin_raan * sin_argp * cos_inc) * v.x
                    + (-cos_raan * sin_argp - sin_raan * cos_argp * cos_inc) * v.y,
                (sin_raan * cos_argp + cos_raan * sin_argp * cos_inc) * v.x
                    + (-sin_raan * sin_argp + cos_raan * cos_argp * cos_inc) * v.y,
                (sin_argp * sin_inc) * v.x + (cos_argp * sin_inc) * v.y,
            )
        };

        (rot(&r_pqw_vec), rot(&v_pqw_vec))
    }

    /// Convert an inertial state vector to elements.
    pub fn from_state_vector(pos: &Vector3<f64>, vel: &Vector3<f64>, mu: f64) -> Self {
        let r = pos.norm();
        let v = vel.norm();

        // Angular momentum
        let h = pos.cross(vel);
        let h_mag = h.norm();

        // Node vector
        let n = Vector3::new(-h.y, h.x, 0.0);
        let n_mag = n.norm();

        // Eccentricity vector
        let e_vec = ((v * v - mu / r) * pos - pos.dot(vel) * vel) / mu;
        let ecc = e_vec.norm();

        // Semi-major axis (from specific energy, signed)
        let energy = 0.5 * v * v - mu / r;
        let sma = if energy.abs() > 1e-12 {
            -mu / (2.0 * energy)
        } else {
            f64::INFINITY
        };

        let inc = if h_mag > 1e-10 {
            (h.z / h_mag).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };

        let raan = if n_mag > 1e-10 {
            let r = (n.x / n_mag).clamp(-1.0, 1.0).acos();
            if n.y < 0.0 { TAU - r } else { r }
        } else {
            0.0
        };

        let argp = if n_mag > 1e-10 && ecc > 1e-10 {
            let cos_argp = (n.dot(&e_vec) / (n_mag * ecc)).clamp(-1.0, 1.0);
            let w = cos_argp.acos();
            if e_vec.z < 0.0 { TAU - w } else { w }
        } else {
            0.0
        };

        let true_anom = if ecc > 1e-10 {
            let cos_nu = (e_vec.dot(pos) / (ecc * r)).clamp(-1.0, 1.0);
            let nu = cos_nu.acos();
            if pos.dot(vel) < 0.0 { TAU - nu } else { nu }
        } else {
            0.0
        };

        KeplerianElements { sma, ecc, inc, raan, argp, true_anom }
    }

    /// Bound orbit (negative specific energy). A purely radial climb is
    /// bound with eccentricity 1, so energy decides rather than `ecc < 1`.
    pub fn is_closed(&self) -> bool {
        self.sma > 0.0 && self.sma.is_finite()
    }

    pub fn periapsis_radius(&self) -> f64 {
        if self.is_closed() {
            self.sma * (1.0 - self.bound_ecc())
        } else {
            self.sma * (1.0 - self.ecc)
        }
    }

    /// Infinite for open trajectories.
    pub fn apoapsis_radius(&self) -> f64 {
        if self.is_closed() {
            self.sma * (1.0 + self.bound_ecc())
        } else {
            f64::INFINITY
        }
    }

    /// Orbital period (s); infinite for open trajectories.
    pub fn period(&self, mu: f64) -> f64 {
        if self.is_closed() {
            TAU * (self.sma.powi(3) / mu).sqrt()
        } else {
            f64::INFINITY
        }
    }

    /// Mean anomaly in [0, 2pi) for closed orbits, signed hyperbolic mean anomaly otherwise.
    pub fn mean_anomaly(&self) -> f64 {
        let nu = self.true_anom;
        if self.is_closed() {
            let e = self.bound_ecc();
            let half = ((1.0 - e) / (1.0 + e)).sqrt() * (nu / 2.0).tan();
            let ecc_anom = 2.0 * half.atan();
            (ecc_anom - e * ecc_anom.sin()).rem_euclid(TAU)
        } else {
            let half = ((self.ecc - 1.0) / (self.ecc + 1.0)).sqrt() * (nu / 2.0).tan();
            let hyp_anom = 2.0 * half.atanh();
            self.ecc * hyp_anom.sinh() - hyp_anom
        }
    }

    /// Seconds until the next periapsis passage (0 for an open trajectory already past it).
    pub fn time_to_periapsis(&self, mu: f64) -> f64 {
        if self.is_closed() {
            let n = (mu / self.sma.powi(3)).sqrt();
            (TAU - self.mean_anomaly()).rem_euclid(TAU) / n
        } else {
            let n = (mu / (-self.sma).powi(3)).sqrt();
            (-self.mean_anomaly() / n).max(0.0)
        }
    }

    /// Seconds until the next apoapsis passage; infinite for open trajectories.
    pub fn time_to_apoapsis(&self, mu: f64) -> f64 {
        if self.is_closed() {
            let n = (mu / self.sma.powi(3)).sqrt();
            (PI - self.mean_anomaly()).rem_euclid(TAU) / n
        } else {
            f64::INFINITY
        }
    }

    // rounding can push a radial orbit's eccentricity just past 1
    fn bound_ecc(&self) -> f64 {
        self.ecc.min(1.0)
    }

    /// Circular orbit of radius `r` in the equatorial plane.
    pub fn circular(r: f64, inc: f64) -> Self {
        KeplerianElements {
            sma: r,
            ecc: 0.0,
            inc,
            raan: 0.0,
            argp: 0.0,
            true_anom: 0.0,
        }
    }
}
