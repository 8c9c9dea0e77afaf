use serde::Deserialize;

// ---------------------------------------------------------------------------
// Celestial bodies
// ---------------------------------------------------------------------------

/// Gravitating body as reported by the remote simulation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CelestialBody {
    pub name: String,
    pub mu: f64,                    // m^3/s^2
    pub radius: f64,                // m, mean equatorial radius
    pub parent: Option<String>,     // body this one orbits, None for the star
    pub orbit_radius: Option<f64>,  // m, semi-major axis around the parent
}

impl CelestialBody {
    /// Surface gravity (m/s^2).
    pub fn surface_gravity(&self) -> f64 {
        self.mu / (self.radius * self.radius)
    }

    /// Local gravity at a given altitude above the mean radius (m/s^2).
    pub fn gravity_at(&self, altitude: f64) -> f64 {
        let r = self.radius + altitude;
        self.mu / (r * r)
    }

    pub fn orbits(&self, other: &CelestialBody) -> bool {
        self.parent.as_deref() == Some(other.name.as_str())
    }
}

// ---------------------------------------------------------------------------
// Stock Kerbol system
// ---------------------------------------------------------------------------

pub mod presets {
    use super::CelestialBody;

    pub fn kerbol() -> CelestialBody {
        CelestialBody {
            name: "Sun".into(),
            mu: 1.172_332_8e18,
            radius: 261_600_000.0,
            parent: None,
            orbit_radius: None,
        }
    }

    pub fn kerbin() -> CelestialBody {
        CelestialBody {
            name: "Kerbin".into(),
            mu: 3.531_6e12,
            radius: 600_000.0,
            parent: Some("Sun".into()),
            orbit_radius: Some(13_599_840_256.0),
        }
    }

    pub fn mun() -> CelestialBody {
        CelestialBody {
            name: "Mun".into(),
            mu: 6.513_839_8e10,
            radius: 200_000.0,
            parent: Some("Kerbin".into()),
            orbit_radius: Some(12_000_000.0),
        }
    }

    pub fn minmus() -> CelestialBody {
        CelestialBody {
            name: "Minmus".into(),
            mu: 1.765_8e9,
            radius: 60_000.0,
            parent: Some("Kerbin".into()),
            orbit_radius: Some(47_000_000.0),
        }
    }

    pub fn duna() -> CelestialBody {
        CelestialBody {
            name: "Duna".into(),
            mu: 3.013_632_1e11,
            radius: 320_000.0,
            parent: Some("Sun".into()),
            orbit_radius: Some(20_726_155_264.0),
        }
    }

    pub fn all() -> Vec<CelestialBody> {
        vec![kerbol(), kerbin(), mun(), minmus(), duna()]
    }
}

#[cfg(test)]
mod tests {
    use super::presets::*;

    #[test]
    fn kerbin_surface_gravity() {
        let g = kerbin().surface_gravity();
        assert!((g - 9.81).abs() < 0.01, "Kerbin g should be ~9.81, got {}", g);
    }

    #[test]
    fn mun_orbits_kerbin() {
        assert!(mun().orbits(&kerbin()));
        assert!(!mun().orbits(&kerbol()));
        assert!(kerbin().orbits(&kerbol()));
    }

    #[test]
    fn gravity_falls_off_with_altitude() {
        let k = kerbin();
        assert!(k.gravity_at(80_000.0) < k.surface_gravity());
    }
}
