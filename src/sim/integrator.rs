use nalgebra::Vector3;

// ---------------------------------------------------------------------------
// Point-mass state in the body-centered inertial frame
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct PointMass {
    pub time: f64,
    pub pos: Vector3<f64>, // m, body-centered, z = rotation axis
    pub vel: Vector3<f64>, // m/s, inertial
    pub mass: f64,         // kg
}

#[derive(Debug, Clone, Copy)]
pub struct Deriv {
    pub dpos: Vector3<f64>,
    pub dvel: Vector3<f64>,
    pub dmass: f64,
}

/// Forces held constant over one step.
#[derive(Debug, Clone, Copy)]
pub struct Propulsion {
    pub thrust: Vector3<f64>, // N, inertial
    pub mass_flow: f64,       // kg/s, >= 0
}

impl Propulsion {
    pub fn off() -> Self {
        Self { thrust: Vector3::zeros(), mass_flow: 0.0 }
    }
}

impl PointMass {
    pub fn apply(&self, d: &Deriv, dt: f64) -> PointMass {
        PointMass {
            time: self.time + dt,
            pos: self.pos + d.dpos * dt,
            vel: self.vel + d.dvel * dt,
            mass: (self.mass + d.dmass * dt).max(0.0),
        }
    }
}

/// Inverse-square gravity plus thrust.
pub fn derivatives(state: &PointMass, mu: f64, prop: &Propulsion) -> Deriv {
    let r = state.pos.norm();
    let gravity = if r > 1.0 { -mu / (r * r * r) * state.pos } else { Vector3::zeros() };
    let thrust_accel = if state.mass > 0.0 { prop.thrust / state.mass } else { Vector3::zeros() };
    Deriv {
        dpos: state.vel,
        dvel: gravity + thrust_accel,
        dmass: -prop.mass_flow,
    }
}

// ---------------------------------------------------------------------------
// RK4 with constant propulsion over the step
// ---------------------------------------------------------------------------

pub fn rk4_step(state: &PointMass, mu: f64, prop: &Propulsion, dt: f64) -> PointMass {
    let k1 = derivatives(state, mu, prop);
    let k2 = derivatives(&state.apply(&k1, dt * 0.5), mu, prop);
    let k3 = derivatives(&state.apply(&k2, dt * 0.5), mu, prop);
    let k4 = derivatives(&state.apply(&k3, dt), mu, prop);

    PointMass {
        time: state.time + dt,
        pos: state.pos + (k1.dpos + 2.0 * k2.dpos + 2.0 * k3.dpos + k4.dpos) * (dt / 6.0),
        vel: state.vel + (k1.dvel + 2.0 * k2.dvel + 2.0 * k3.dvel + k4.dvel) * (dt / 6.0),
        mass: (state.mass + (k1.dmass + 2.0 * k2.dmass + 2.0 * k3.dmass + k4.dmass) * (dt / 6.0))
            .max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MU: f64 = 3.531_6e12;

    #[test]
    fn circular_orbit_keeps_radius_and_energy() {
        let r = 700_000.0;
        let v = (MU / r).sqrt();
        let mut s = PointMass {
            time: 0.0,
            pos: Vector3::new(r, 0.0, 0.0),
            vel: Vector3::new(0.0, v, 0.0),
            mass: 1_000.0,
        };
        let energy = |s: &PointMass| 0.5 * s.vel.norm_squared() - MU / s.pos.norm();
        let e0 = energy(&s);
        // One full orbit at 0.1 s
        for _ in 0..19_580 {
            s = rk4_step(&s, MU, &Propulsion::off(), 0.1);
        }
        assert!((s.pos.norm() - r).abs() < 1.0, "radius drifted to {:.2}", s.pos.norm());
        assert!(((energy(&s) - e0) / e0).abs() < 1e-9);
    }

    #[test]
    fn thrust_burns_mass_at_constant_rate() {
        let s = PointMass {
            time: 0.0,
            pos: Vector3::new(700_000.0, 0.0, 0.0),
            vel: Vector3::zeros(),
            mass: 1_000.0,
        };
        let prop = Propulsion { thrust: Vector3::new(0.0, 10_000.0, 0.0), mass_flow: 3.0 };
        let next = rk4_step(&s, MU, &prop, 2.0);
        assert!((next.mass - 994.0).abs() < 1e-9);
        assert!(next.vel.y > 0.0);
        assert!((next.time - 2.0).abs() < 1e-12);
    }
}
