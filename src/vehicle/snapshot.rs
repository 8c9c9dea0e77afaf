use nalgebra::Vector3;

use crate::error::FlightError;
use crate::orbital::{exhaust_velocity, CelestialBody};

// ---------------------------------------------------------------------------
// Vehicle snapshot
// ---------------------------------------------------------------------------

/// Vehicle and orbit state sampled at one instant.
///
/// Vectors are expressed in the local horizon frame at the vehicle:
/// x = east, y = north, z = up. Altitudes are above the body's mean radius.
#[derive(Debug, Clone)]
pub struct VehicleSnapshot {
    pub ut: f64,                    // s, simulation time
    pub altitude: f64,              // m
    pub speed: f64,                 // m/s, orbital
    pub vertical_speed: f64,        // m/s, positive = climbing
    pub velocity: Vector3<f64>,     // m/s, orbital velocity [E, N, U]
    pub facing: Vector3<f64>,       // unit vector the vehicle points along [E, N, U]
    pub apoapsis: f64,              // m, altitude (infinite when open)
    pub periapsis: f64,             // m, altitude
    pub semi_major_axis: f64,       // m
    pub eccentricity: f64,
    pub time_to_apoapsis: f64,      // s
    pub time_to_periapsis: f64,     // s
    pub period: f64,                // s (infinite when open)
    pub stage: usize,               // active stage index
    pub fuel_amount: f64,           // kg left in the active stage
    pub fuel_capacity: f64,         // kg the active stage started with
    pub available_thrust: f64,      // N at full throttle
    pub specific_impulse: f64,      // s
    pub mass: f64,                  // kg
    pub body: CelestialBody,
}

impl VehicleSnapshot {
    /// Fraction of the active stage's propellant remaining, in [0, 1].
    pub fn fuel_fraction(&self) -> f64 {
        if self.fuel_capacity > 0.0 {
            (self.fuel_amount / self.fuel_capacity).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Distance from the body's center (m).
    pub fn radius(&self) -> f64 {
        self.body.radius + self.altitude
    }

    pub fn horizontal_speed(&self) -> f64 {
        self.velocity.xy().norm()
    }

    /// Angle of the velocity above the local horizon (deg).
    pub fn flight_path_angle(&self) -> f64 {
        self.vertical_speed.atan2(self.horizontal_speed()).to_degrees()
    }

    /// Compass heading of the horizontal velocity (deg, east = 90).
    /// Falls back to `default` while the vehicle is nearly at rest.
    pub fn prograde_heading(&self, default: f64) -> f64 {
        if self.horizontal_speed() < 1.0 {
            default
        } else {
            compass(self.velocity.x.atan2(self.velocity.y).to_degrees())
        }
    }

    /// Thrust acceleration at full throttle (m/s^2).
    pub fn max_acceleration(&self) -> f64 {
        if self.mass > 0.0 {
            self.available_thrust / self.mass
        } else {
            0.0
        }
    }

    pub fn exhaust_velocity(&self) -> Result<f64, FlightError> {
        exhaust_velocity(self.specific_impulse)
    }

    /// Unit vectors (prograde, orbit normal, radial-out) in the local frame.
    pub fn orbital_frame(&self) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
        let up = Vector3::z();
        let prograde = if self.speed > 1e-6 {
            self.velocity / self.speed
        } else {
            Vector3::y()
        };
        // r x v, with r along local up
        let normal = up.cross(&prograde);
        let normal = if normal.norm() > 1e-9 { normal.normalize() } else { Vector3::x() };
        let radial = prograde.cross(&normal);
        (prograde, normal, radial)
    }
}

// ---------------------------------------------------------------------------
// Direction helpers
// ---------------------------------------------------------------------------

/// Wrap a heading into [0, 360).
pub fn compass(heading: f64) -> f64 {
    heading.rem_euclid(360.0)
}

/// Unit vector for a (pitch above horizon, compass heading) pair, both in degrees.
pub fn direction_from(pitch: f64, heading: f64) -> Vector3<f64> {
    let (p, h) = (pitch.to_radians(), heading.to_radians());
    Vector3::new(p.cos() * h.sin(), p.cos() * h.cos(), p.sin())
}

/// Inverse of [`direction_from`]: (pitch, heading) in degrees.
pub fn pitch_heading_of(dir: &Vector3<f64>) -> (f64, f64) {
    let n = dir.norm();
    if n < 1e-12 {
        return (0.0, 0.0);
    }
    let d = dir / n;
    let pitch = d.z.clamp(-1.0, 1.0).asin().to_degrees();
    let heading = if d.xy().norm() < 1e-12 { 0.0 } else { compass(d.x.atan2(d.y).to_degrees()) };
    (pitch, heading)
}

/// Angle between two directions (deg).
pub fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    let (na, nb) = (a.norm(), b.norm());
    if na < 1e-12 || nb < 1e-12 {
        return 180.0;
    }
    (a.dot(b) / (na * nb)).clamp(-1.0, 1.0).acos().to_degrees()
}
